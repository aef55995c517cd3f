//! Visible text extraction

use scraper::{Html, Node, Selector};

/// Elements whose text never counts as page content
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "nav", "footer", "header"];

/// Marker appended to truncated content
pub const ELLIPSIS: &str = "...";

/// Sentinel title used when a document has no `<title>`
pub const NO_TITLE: &str = "No title found";

/// Extracts the page title from the HTML document
pub fn extract_title(document: &Html) -> String {
    let Ok(title_selector) = Selector::parse("title") else {
        return NO_TITLE.to_string();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_else(|| NO_TITLE.to_string())
}

/// Collects the document text outside skipped elements, whitespace collapsed
///
/// Text nodes are concatenated as they appear, so inline markup such as
/// `he<b>ll</b>o` yields `hello`.
pub fn visible_text(document: &Html) -> String {
    let mut raw = String::new();
    let mut stack = vec![*document.root_element()];

    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(element) if SKIPPED_ELEMENTS.contains(&element.name()) => {}
            _ => stack.extend(node.children().rev()),
        }
    }

    collapse_whitespace(&raw)
}

/// Collapses every whitespace run into one space and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keeps the first `limit` characters, appending [`ELLIPSIS`] when anything was cut
pub fn truncate_content(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ELLIPSIS),
        None => text.to_string(),
    }
}
