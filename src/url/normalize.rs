use url::Url;

/// Schemes and prefixes that never point at another documentation page
const IGNORED_PREFIXES: &[&str] = &["#", "javascript:", "mailto:", "tel:", "data:"];

/// Computes the visited-set key for a URL
///
/// The fragment is dropped and the whole URL is lowercased, so two links that
/// differ only in case or anchor collapse to one fetch.
///
/// # Examples
///
/// ```
/// use docbundle::url::visit_key;
/// use url::Url;
///
/// let a = Url::parse("https://example.com/Docs/Page.html#intro").unwrap();
/// let b = Url::parse("https://example.com/docs/page.html").unwrap();
/// assert_eq!(visit_key(&a), visit_key(&b));
/// ```
pub fn visit_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.as_str().to_lowercase()
}

/// Removes the fragment from a URL
pub fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

/// Resolves an `href` attribute against the page it was found on
///
/// Returns `None` for empty values, fragment-only links, `data:` URIs,
/// `javascript:`, `mailto:` and `tel:` links, unparseable targets, and any
/// target that resolves to a scheme other than http(s). The resolved URL has
/// its fragment removed.
pub fn resolve_href(href: &str, current: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if IGNORED_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix)) {
        return None;
    }

    let resolved = current.join(href).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    Some(strip_fragment(resolved))
}
