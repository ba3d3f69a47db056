//! Visible text flattening

use scraper::{Html, Node, Selector};

const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Flattens the document's visible text into trimmed lines
///
/// Every non-blank text node becomes one line, so a label and its value in
/// sibling elements end up on consecutive lines.
pub fn visible_text(document: &Html) -> String {
    let mut lines = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|el| HIDDEN_ELEMENTS.contains(&el.name()))
                .unwrap_or(false)
        });
        if hidden {
            continue;
        }

        let line = text.trim();
        if !line.is_empty() {
            lines.push(line);
        }
    }

    lines.join("\n")
}

/// Text of the first `<h1>`, empty when the page has none
pub fn page_title(document: &Html) -> String {
    let Ok(selector) = Selector::parse("h1") else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .map(|h1| {
            h1.text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}
