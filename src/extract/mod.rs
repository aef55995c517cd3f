//! HTML extraction
//!
//! This module turns a response body into content-level signals:
//! - Title, description, keywords and the meta tag map
//! - Visible text, truncated for storage, with its true length
//! - Links (absolute, deduplicated) and embedded resources
//! - Structural counts and framework fingerprints
//!
//! Extraction never fails: a malformed or empty document yields default
//! values. The result is a pure function of the body and the base URL.

mod meta;
mod resources;
mod structure;
mod text;

pub use meta::{extract_meta, MetaInfo};
pub use resources::{
    extract_forms, extract_images, extract_links, extract_scripts, extract_stylesheets, FormInfo,
    ImageInfo,
};
pub use structure::{count_elements, FrameworkFlags, StructureCounts};
pub use text::{
    collapse_whitespace, extract_title, truncate_content, visible_text, ELLIPSIS, NO_TITLE,
};

use crate::config::ExtractConfig;
use scraper::Html;
use serde::Serialize;
use std::collections::BTreeMap;
use url::Url;

/// Word and character counts of the untruncated page text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub word_count: usize,
    pub character_count: usize,
}

/// Content-level signals extracted from one HTML document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub title: String,
    pub description: String,
    pub keywords: String,
    /// Visible text, cut to the configured content limit
    pub content: String,
    /// Character count of the visible text before truncation
    pub content_length: usize,
    pub text_stats: TextStats,
    pub links: Vec<String>,
    pub meta_tags: BTreeMap<String, String>,
    pub images: Vec<ImageInfo>,
    pub forms: Vec<FormInfo>,
    pub scripts: Vec<String>,
    pub stylesheets: Vec<String>,
    pub structure: StructureCounts,
    pub frameworks: FrameworkFlags,
}

/// Parses `body` and extracts every signal, resolving references against `base_url`
///
/// `base_url` must be the final URL of the response (after redirects).
///
/// # Example
///
/// ```
/// use page_lens::config::ExtractConfig;
/// use page_lens::extract::extract_page;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let result = extract_page(html, &base_url, &ExtractConfig::default());
/// assert_eq!(result.title, "Test");
/// assert_eq!(result.links, vec!["https://example.com/page"]);
/// ```
pub fn extract_page(body: &str, base_url: &Url, limits: &ExtractConfig) -> ExtractionResult {
    let document = Html::parse_document(body);

    let title = extract_title(&document);
    let meta = extract_meta(&document);

    let text = visible_text(&document);
    let character_count = text.chars().count();
    let word_count = text.split_whitespace().count();
    let content = truncate_content(&text, limits.content_limit);

    let links = extract_links(&document, base_url, limits.link_limit);
    let (images, image_total) = extract_images(&document, base_url, limits.image_limit);
    let forms = extract_forms(&document);
    let (scripts, script_total) = extract_scripts(&document, base_url, limits.script_limit);
    let (stylesheets, stylesheet_total) =
        extract_stylesheets(&document, base_url, limits.stylesheet_limit);

    let structure = StructureCounts {
        images: image_total,
        forms: forms.len(),
        scripts: script_total,
        stylesheets: stylesheet_total,
        ..count_elements(&document)
    };

    let frameworks = FrameworkFlags::detect(&document.html());

    tracing::debug!(
        "Extracted {} words, {} links, {} images from {}",
        word_count,
        links.len(),
        image_total,
        base_url
    );

    ExtractionResult {
        title,
        description: meta.description,
        keywords: meta.keywords,
        content,
        content_length: character_count,
        text_stats: TextStats {
            word_count,
            character_count,
        },
        links,
        meta_tags: meta.tags,
        images,
        forms,
        scripts,
        stylesheets,
        structure,
        frameworks,
    }
}
