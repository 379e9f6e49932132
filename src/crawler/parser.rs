//! Link discovery on processed pages

use crate::document::Document;
use crate::url::{resolve_href, visit_key, DocsUrl};
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Extracts the in-scope links of a processed page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` whose resolved URL lies under the base URL, whether the
///   href was relative or absolute on the same origin
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - Fragment-only, `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Links to other origins or outside the base path
///
/// Fragments are stripped and duplicates dropped, keeping document order.
///
/// # Arguments
///
/// * `document` - The page after filtering
/// * `current` - URL the page was fetched from, for resolving relative links
/// * `base` - Root of the documentation set
pub fn extract_internal_urls(document: &Document, current: &Url, base: &DocsUrl) -> Vec<Url> {
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for element in document.select(&anchors) {
        if element.value().attr("download").is_some() {
            continue;
        }
        let Some(url) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_href(href, current))
        else {
            continue;
        };
        if base.contains(&url) && seen.insert(visit_key(&url)) {
            links.push(url);
        }
    }
    links
}
