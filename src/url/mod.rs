//! URL handling module for Page-Lens
//!
//! This module provides request URL validation and resolution of the
//! hrefs found in fetched documents.

mod resolve;
mod validate;

// Re-export main functions
pub use resolve::{resolve_link, resolve_resource};
pub use validate::validate_url;
