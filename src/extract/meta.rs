//! `<meta>` tag extraction

use scraper::{Html, Selector};
use std::collections::BTreeMap;

/// Meta information of a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaInfo {
    /// `<meta name="description">`, empty when absent
    pub description: String,
    /// `<meta name="keywords">`, empty when absent
    pub keywords: String,
    /// name-or-property -> content for every meta tag that has both
    pub tags: BTreeMap<String, String>,
}

/// Collects description, keywords and the full meta tag map in one pass
///
/// For description and keywords the first matching tag wins; in the tag map
/// a later duplicate overwrites an earlier one.
pub fn extract_meta(document: &Html) -> MetaInfo {
    let mut info = MetaInfo::default();
    let mut description = None;
    let mut keywords = None;

    let Ok(meta_selector) = Selector::parse("meta") else {
        return info;
    };

    for element in document.select(&meta_selector) {
        let attrs = element.value();
        let Some(content) = attrs.attr("content") else {
            continue;
        };

        if let Some(name) = attrs.attr("name") {
            if name.eq_ignore_ascii_case("description") && description.is_none() {
                description = Some(content.trim().to_string());
            } else if name.eq_ignore_ascii_case("keywords") && keywords.is_none() {
                keywords = Some(content.trim().to_string());
            }
        }

        if let Some(key) = attrs.attr("name").or_else(|| attrs.attr("property")) {
            info.tags.insert(key.to_string(), content.to_string());
        }
    }

    info.description = description.unwrap_or_default();
    info.keywords = keywords.unwrap_or_default();
    info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_and_keywords() {
        let doc = Html::parse_document(
            r#"<head>
                <meta name="description" content=" A test page ">
                <meta name="Keywords" content="rust, scraping">
            </head>"#,
        );
        let meta = extract_meta(&doc);

        assert_eq!(meta.description, "A test page");
        assert_eq!(meta.keywords, "rust, scraping");
    }

    #[test]
    fn test_absent_meta_is_empty() {
        let meta = extract_meta(&Html::parse_document("<p>nothing</p>"));
        assert_eq!(meta, MetaInfo::default());
    }

    #[test]
    fn test_tag_map() {
        let doc = Html::parse_document(
            r#"<head>
                <meta charset="utf-8">
                <meta property="og:title" content="OG Title">
                <meta name="viewport" content="width=device-width">
                <meta name="robots">
                <meta name="author" content="First">
                <meta name="author" content="Second">
            </head>"#,
        );
        let meta = extract_meta(&doc);

        assert_eq!(meta.tags.len(), 3);
        assert_eq!(meta.tags["og:title"], "OG Title");
        assert_eq!(meta.tags["viewport"], "width=device-width");
        assert_eq!(meta.tags["author"], "Second");
        assert!(!meta.tags.contains_key("robots"));
    }
}
