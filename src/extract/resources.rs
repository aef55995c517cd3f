//! Link and embedded-resource extraction
//!
//! Links are filtered to absolute http(s) URLs and deduplicated; resources
//! (images, scripts, stylesheets) are resolved but keep whatever scheme they
//! declare. Every list is returned together with its pre-cap count.

use crate::url::{resolve_link, resolve_resource};
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use url::Url;

/// An `<img>` reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub src: String,
    pub alt: String,
}

/// A `<form>` declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormInfo {
    pub action: String,
    /// Lowercased; `get` when not declared
    pub method: String,
}

/// Extracts anchor links, resolved, deduplicated in first-seen order, capped
pub fn extract_links(document: &Html, base_url: &Url, limit: usize) -> Vec<String> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if let Some(absolute_url) = resolve_link(href, base_url) {
                if seen.insert(absolute_url.clone()) {
                    links.push(absolute_url);
                    if links.len() == limit {
                        break;
                    }
                }
            }
        }
    }

    links
}

/// Extracts `<img src>` references
///
/// Returns the capped list and the number of images found.
pub fn extract_images(document: &Html, base_url: &Url, limit: usize) -> (Vec<ImageInfo>, usize) {
    let mut images = Vec::new();
    let mut total = 0;

    if let Ok(img_selector) = Selector::parse("img[src]") {
        for element in document.select(&img_selector) {
            let Some(src) = element.value().attr("src") else {
                continue;
            };
            total += 1;
            if images.len() < limit {
                images.push(ImageInfo {
                    src: resolve_resource(src, base_url),
                    alt: element.value().attr("alt").unwrap_or_default().to_string(),
                });
            }
        }
    }

    (images, total)
}

/// Extracts every form with its action and method
pub fn extract_forms(document: &Html) -> Vec<FormInfo> {
    let Ok(form_selector) = Selector::parse("form") else {
        return Vec::new();
    };

    document
        .select(&form_selector)
        .map(|element| FormInfo {
            action: element.value().attr("action").unwrap_or_default().to_string(),
            method: element
                .value()
                .attr("method")
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "get".to_string()),
        })
        .collect()
}

/// Extracts resolved `<script src>` references
///
/// Returns the capped list and the number of external scripts found.
pub fn extract_scripts(document: &Html, base_url: &Url, limit: usize) -> (Vec<String>, usize) {
    let Ok(script_selector) = Selector::parse("script[src]") else {
        return (Vec::new(), 0);
    };

    collect_capped(
        document
            .select(&script_selector)
            .filter_map(|element| element.value().attr("src"))
            .map(|src| resolve_resource(src, base_url)),
        limit,
    )
}

/// Extracts resolved `<link rel="stylesheet">` hrefs
///
/// `rel` is a token list, so `rel="preload stylesheet"` also counts.
pub fn extract_stylesheets(document: &Html, base_url: &Url, limit: usize) -> (Vec<String>, usize) {
    let Ok(link_selector) = Selector::parse("link[rel][href]") else {
        return (Vec::new(), 0);
    };

    collect_capped(
        document
            .select(&link_selector)
            .filter(|element| {
                element
                    .value()
                    .attr("rel")
                    .map(|rel| {
                        rel.split_whitespace()
                            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
                    })
                    .unwrap_or(false)
            })
            .filter_map(|element| element.value().attr("href"))
            .map(|href| resolve_resource(href, base_url)),
        limit,
    )
}

fn collect_capped(items: impl Iterator<Item = String>, limit: usize) -> (Vec<String>, usize) {
    let mut kept = Vec::new();
    let mut total = 0;
    for item in items {
        total += 1;
        if kept.len() < limit {
            kept.push(item);
        }
    }
    (kept, total)
}
