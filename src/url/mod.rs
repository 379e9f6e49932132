//! URL handling module for docbundle
//!
//! This module provides the scoped documentation URL type used everywhere a
//! page's position relative to the documentation root matters, plus visit-key
//! normalization and the link admission rules applied before enqueueing.

mod matcher;
mod normalize;

use crate::{UrlError, UrlResult};
use std::fmt;
use url::Url;

// Re-export main functions
pub use matcher::PathRules;
pub use normalize::{resolve_href, strip_fragment, visit_key};

/// An absolute http(s) URL that anchors a documentation site
///
/// `DocsUrl` is used both for the base URL of a site (the scope every crawled
/// page must fall under) and for the per-page current URL handed to filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocsUrl(Url);

impl DocsUrl {
    /// Parses an absolute http or https URL
    ///
    /// # Examples
    ///
    /// ```
    /// use docbundle::url::DocsUrl;
    ///
    /// let base = DocsUrl::parse("https://docs.example.com/lib/1.0/").unwrap();
    /// assert_eq!(base.origin(), "https://docs.example.com");
    /// ```
    pub fn parse(input: &str) -> UrlResult<Self> {
        let url = Url::parse(input).map_err(|e| UrlError::Parse(format!("{}: {}", input, e)))?;
        Self::from_url(url)
    }

    /// Wraps an already parsed URL, checking scheme and host
    pub fn from_url(url: Url) -> UrlResult<Self> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                url.scheme()
            )));
        }

        if url.host_str().is_none() {
            return Err(UrlError::MissingHost(url.to_string()));
        }

        Ok(Self(url))
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn into_url(self) -> Url {
        self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    /// Returns `scheme://host[:port]`, omitting default ports
    pub fn origin(&self) -> String {
        self.0.origin().ascii_serialization()
    }

    /// Computes the path of `dest` relative to this URL
    ///
    /// Both URLs must share an origin. Trailing slashes are ignored on both
    /// sides, so the base URL itself yields `""`. A destination nested below
    /// the base yields its remaining path with a leading `/`, in the
    /// destination's original casing. Anything else yields `None`.
    ///
    /// # Arguments
    ///
    /// * `dest` - The URL to express relative to this one
    /// * `ignore_case` - Compare the path prefix ASCII case-insensitively
    ///
    /// # Examples
    ///
    /// ```
    /// use docbundle::url::DocsUrl;
    /// use url::Url;
    ///
    /// let base = DocsUrl::parse("https://example.com/docs/").unwrap();
    /// let page = Url::parse("https://example.com/Docs/guide/intro.html").unwrap();
    /// assert_eq!(base.subpath(&page, true).as_deref(), Some("/guide/intro.html"));
    /// assert_eq!(base.subpath(&page, false), None);
    /// ```
    pub fn subpath(&self, dest: &Url, ignore_case: bool) -> Option<String> {
        if self.0.origin() != dest.origin() {
            return None;
        }

        let base = self.0.path().trim_end_matches('/');
        let target = dest.path().trim_end_matches('/');

        let prefix_matches = |a: &str, b: &str| {
            if ignore_case {
                a.eq_ignore_ascii_case(b)
            } else {
                a == b
            }
        };

        if prefix_matches(target, base) {
            return Some(String::new());
        }

        if target.len() > base.len()
            && target.is_char_boundary(base.len())
            && prefix_matches(&target[..base.len()], base)
            && target[base.len()..].starts_with('/')
        {
            return Some(target[base.len()..].to_string());
        }

        None
    }

    /// Returns true if `dest` is this URL or nested below it
    pub fn contains(&self, dest: &Url) -> bool {
        self.subpath(dest, true).is_some()
    }

    /// Joins a relative path below this URL's directory
    ///
    /// Unlike [`Url::join`], the last path segment of the base is kept even
    /// without a trailing slash, and a leading `/` on `path` does not escape
    /// to the host root.
    pub fn joining(&self, path: &str) -> UrlResult<DocsUrl> {
        let mut base = self.0.clone();
        if !base.path().ends_with('/') {
            let directory = format!("{}/", base.path());
            base.set_path(&directory);
        }
        base.set_query(None);
        base.set_fragment(None);

        let joined = base
            .join(path.trim_start_matches('/'))
            .map_err(|e| UrlError::Parse(format!("{}: {}", path, e)))?;

        Ok(Self(joined))
    }
}

impl fmt::Display for DocsUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<DocsUrl> for Url {
    fn from(url: DocsUrl) -> Self {
        url.0
    }
}

impl TryFrom<Url> for DocsUrl {
    type Error = UrlError;

    fn try_from(url: Url) -> UrlResult<Self> {
        Self::from_url(url)
    }
}
