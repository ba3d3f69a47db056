//! Item link harvesting from index pages
//!
//! This module turns an index page into the list of item page URLs it
//! points at:
//! - `<a href="...">` resolved against the index page URL
//! - Only http(s) targets whose lowercased path matches the item pattern
//! - Fragments dropped, result sorted and de-duplicated

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::OnceLock;
use url::Url;

fn anchor_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("a[href]").expect("static selector"))
}

/// Collects item page URLs from an index page
///
/// # Arguments
///
/// * `document` - The parsed index page
/// * `base_url` - The URL the index page was served from
/// * `item_pattern` - Matched against the lowercased URL path
///
/// # Returns
///
/// Absolute URLs, sorted and without duplicates
///
/// # Example
///
/// ```
/// use listing_harvester::crawler::harvest_item_links;
/// use regex::Regex;
/// use scraper::Html;
/// use url::Url;
///
/// let html = Html::parse_document(r#"<a href="/auti/golf-oglas-1">Golf</a><a href="/o-nama">About</a>"#);
/// let base = Url::parse("https://www.example.hr/auti?page=1").unwrap();
/// let links = harvest_item_links(&html, &base, &Regex::new("/auti/").unwrap());
/// assert_eq!(links, vec!["https://www.example.hr/auti/golf-oglas-1".to_string()]);
/// ```
pub fn harvest_item_links(document: &Html, base_url: &Url, item_pattern: &Regex) -> Vec<String> {
    let mut links = BTreeSet::new();

    for element in document.select(anchor_selector()) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        if let Some(url) = resolve_link(href, base_url) {
            if item_pattern.is_match(&url.path().to_lowercase()) {
                links.insert(url.to_string());
            }
        }
    }

    links.into_iter().collect()
}

/// Resolves a link href to an absolute http(s) URL without fragment
///
/// Returns None for empty and fragment-only hrefs, `javascript:`,
/// `mailto:`, `tel:` and `data:` links, and anything that does not parse.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);

    Some(absolute_url)
}
