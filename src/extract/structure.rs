//! Structural element counts and framework fingerprinting

use scraper::{Html, Selector};
use serde::Serialize;

/// Element counts of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructureCounts {
    pub h1: usize,
    pub h2: usize,
    pub h3: usize,
    pub h4: usize,
    pub h5: usize,
    pub h6: usize,
    pub paragraphs: usize,
    pub unordered_lists: usize,
    pub ordered_lists: usize,
    pub tables: usize,
    pub divs: usize,
    pub spans: usize,
    pub images: usize,
    pub forms: usize,
    pub scripts: usize,
    pub stylesheets: usize,
}

fn count(document: &Html, css: &str) -> usize {
    Selector::parse(css)
        .map(|selector| document.select(&selector).count())
        .unwrap_or(0)
}

/// Counts headings, text blocks and layout elements
///
/// The resource fields (images, forms, scripts, stylesheets) are left at
/// zero for the caller to fill from the extracted lists.
pub fn count_elements(document: &Html) -> StructureCounts {
    StructureCounts {
        h1: count(document, "h1"),
        h2: count(document, "h2"),
        h3: count(document, "h3"),
        h4: count(document, "h4"),
        h5: count(document, "h5"),
        h6: count(document, "h6"),
        paragraphs: count(document, "p"),
        unordered_lists: count(document, "ul"),
        ordered_lists: count(document, "ol"),
        tables: count(document, "table"),
        divs: count(document, "div"),
        spans: count(document, "span"),
        ..StructureCounts::default()
    }
}

/// Which well-known frameworks leave traces in the markup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameworkFlags {
    pub jquery: bool,
    pub react: bool,
    pub vue: bool,
    pub angular: bool,
    pub bootstrap: bool,
    pub wordpress: bool,
    pub drupal: bool,
    pub joomla: bool,
    pub shopify: bool,
    pub woocommerce: bool,
}

impl FrameworkFlags {
    /// Case-insensitive substring detection over raw markup
    ///
    /// This is a heuristic: "vue" also matches "revue".
    pub fn detect(markup: &str) -> Self {
        let markup = markup.to_lowercase();
        let has = |needle: &str| markup.contains(needle);

        Self {
            jquery: has("jquery"),
            react: has("react") || has("jsx"),
            vue: has("vue"),
            angular: has("angular"),
            bootstrap: has("bootstrap"),
            wordpress: has("wordpress") || has("wp-"),
            drupal: has("drupal"),
            joomla: has("joomla"),
            shopify: has("shopify"),
            woocommerce: has("woocommerce"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_elements() {
        let doc = Html::parse_document(
            r#"<body>
                <h1>a</h1><h2>b</h2><h2>c</h2><h6>d</h6>
                <p>1</p><p>2</p><p>3</p>
                <ul><li>x</li></ul><ol><li>y</li></ol>
                <table><tr><td>z</td></tr></table>
                <div><div><span>s</span></div></div>
            </body>"#,
        );
        let counts = count_elements(&doc);

        assert_eq!(counts.h1, 1);
        assert_eq!(counts.h2, 2);
        assert_eq!(counts.h3, 0);
        assert_eq!(counts.h6, 1);
        assert_eq!(counts.paragraphs, 3);
        assert_eq!(counts.unordered_lists, 1);
        assert_eq!(counts.ordered_lists, 1);
        assert_eq!(counts.tables, 1);
        assert_eq!(counts.divs, 2);
        assert_eq!(counts.spans, 1);
        assert_eq!(counts.images, 0);
    }

    #[test]
    fn test_detect_frameworks() {
        let flags = FrameworkFlags::detect(
            r#"<script src="/js/jQuery.min.js"></script>
               <link href="/wp-content/themes/x/style.css">
               <div class="Bootstrap-grid"></div>"#,
        );

        assert!(flags.jquery);
        assert!(flags.wordpress);
        assert!(flags.bootstrap);
        assert!(!flags.react);
        assert!(!flags.shopify);
    }

    #[test]
    fn test_react_via_jsx_marker() {
        assert!(FrameworkFlags::detect("<script type=\"text/jsx\"></script>").react);
    }

    #[test]
    fn test_plain_markup_detects_nothing() {
        let flags = FrameworkFlags::detect("<html><body><p>Hello</p></body></html>");
        assert_eq!(flags, FrameworkFlags::default());
    }
}
