use crate::document::Document;
use crate::url::DocsUrl;
use crate::DocsError;
use std::collections::BTreeMap;
use std::fmt;

/// Read-only environment for processing one page
///
/// Built fresh by the crawl engine for every admitted response. Filters and
/// extractors log through `tracing`; the engine runs them inside a span that
/// carries the page URL.
#[derive(Debug, Clone)]
pub struct FilterContext {
    pub base_url: DocsUrl,
    pub current_url: DocsUrl,
    pub root_url: DocsUrl,
    pub root_path: Option<String>,
    pub links: BTreeMap<String, String>,
    pub initial_paths: Vec<String>,
    pub version: Option<String>,
    pub release: Option<String>,
}

impl FilterContext {
    /// Creates a context whose root URL is the base URL
    pub fn new(base_url: DocsUrl, current_url: DocsUrl) -> Self {
        Self {
            root_url: base_url.clone(),
            base_url,
            current_url,
            root_path: None,
            links: BTreeMap::new(),
            initial_paths: Vec::new(),
            version: None,
            release: None,
        }
    }

    pub fn with_root(mut self, root_url: DocsUrl, root_path: Option<String>) -> Self {
        self.root_url = root_url;
        self.root_path = root_path;
        self
    }

    pub fn with_initial_paths(mut self, paths: Vec<String>) -> Self {
        self.initial_paths = paths;
        self
    }

    pub fn with_links(mut self, links: BTreeMap<String, String>) -> Self {
        self.links = links;
        self
    }

    pub fn with_version(mut self, version: Option<String>, release: Option<String>) -> Self {
        self.version = version;
        self.release = release;
        self
    }

    /// Current URL's path relative to the base URL, `None` across origins
    pub fn subpath(&self) -> Option<String> {
        self.base_url.subpath(self.current_url.as_url(), true)
    }

    /// Store identifier for the current page
    ///
    /// # Examples
    ///
    /// ```
    /// use docbundle::document::FilterContext;
    /// use docbundle::url::DocsUrl;
    ///
    /// let base = DocsUrl::parse("https://example.com/docs/").unwrap();
    /// let page = DocsUrl::parse("https://example.com/docs/guide/intro.html").unwrap();
    /// assert_eq!(FilterContext::new(base, page).slug(), "guide/intro");
    /// ```
    pub fn slug(&self) -> String {
        let subpath = self.subpath().unwrap_or_default();
        let trimmed = subpath.strip_prefix('/').unwrap_or(&subpath);
        trimmed.strip_suffix(".html").unwrap_or(trimmed).to_string()
    }

    pub fn is_root_page(&self) -> bool {
        let subpath = self.subpath().unwrap_or_default();
        if subpath.is_empty() || subpath == "/" {
            return true;
        }
        self.root_path
            .as_deref()
            .is_some_and(|root| same_path(root, &subpath))
    }

    pub fn is_initial_page(&self) -> bool {
        if self.is_root_page() {
            return true;
        }
        let subpath = self.subpath().unwrap_or_default();
        self.initial_paths.iter().any(|p| same_path(p, &subpath))
    }
}

fn same_path(a: &str, b: &str) -> bool {
    a.trim_start_matches('/') == b.trim_start_matches('/')
}

/// One step of the page cleanup pipeline
///
/// A filter receives the document produced by the previous step and returns
/// the document for the next one. An error aborts processing of the current
/// page only.
pub trait Filter: Send + Sync {
    fn apply(&self, document: Document, context: &FilterContext) -> Result<Document, DocsError>;

    /// Name used in log output
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Filter for F
where
    F: Fn(Document, &FilterContext) -> Result<Document, DocsError> + Send + Sync,
{
    fn apply(&self, document: Document, context: &FilterContext) -> Result<Document, DocsError> {
        self(document, context)
    }
}

/// Ordered list of filters applied to every page
#[derive(Default)]
pub struct FilterStack {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter to the end of the pipeline
    pub fn push<F: Filter + 'static>(&mut self, filter: F) {
        self.filters.push(Box::new(filter));
    }

    pub fn with<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.push(filter);
        self
    }

    pub fn push_boxed(&mut self, filter: Box<dyn Filter>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Runs every filter in order, stopping at the first error
    pub fn apply(&self, document: Document, context: &FilterContext) -> Result<Document, DocsError> {
        let mut document = document;
        for filter in &self.filters {
            document = filter.apply(document, context).map_err(|e| {
                tracing::debug!("Filter {} failed: {}", filter.name(), e);
                e
            })?;
        }
        Ok(document)
    }
}

impl fmt::Debug for FilterStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.filters.iter().map(|filter| filter.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(page: &str) -> FilterContext {
        let base = DocsUrl::parse("https://example.com/docs/").unwrap();
        let current = base.joining(page).unwrap();
        FilterContext::new(base, current)
            .with_initial_paths(vec!["guide/start.html".to_string()])
    }

    fn doc(body: &str) -> Document {
        Document::parse(&format!("<html><body>{}</body></html>", body))
    }

    #[test]
    fn test_subpath_and_slug() {
        let ctx = context("api/Vec.html");
        assert_eq!(ctx.subpath().as_deref(), Some("/api/Vec.html"));
        assert_eq!(ctx.slug(), "api/Vec");
    }

    #[test]
    fn test_subpath_across_origins() {
        let base = DocsUrl::parse("https://example.com/docs/").unwrap();
        let other = DocsUrl::parse("https://other.com/docs/a.html").unwrap();
        let ctx = FilterContext::new(base, other);
        assert_eq!(ctx.subpath(), None);
        assert_eq!(ctx.slug(), "");
    }

    #[test]
    fn test_root_page_detection() {
        assert!(context("").is_root_page());
        assert!(!context("a.html").is_root_page());

        let base = DocsUrl::parse("https://example.com/docs/").unwrap();
        let root = base.joining("std/index.html").unwrap();
        let ctx = FilterContext::new(base, root.clone())
            .with_root(root, Some("std/index.html".to_string()));
        assert!(ctx.is_root_page());
    }

    #[test]
    fn test_initial_page_detection() {
        assert!(context("guide/start.html").is_initial_page());
        assert!(context("").is_initial_page());
        assert!(!context("guide/other.html").is_initial_page());
    }

    #[test]
    fn test_stack_applies_in_order() {
        let rename_then_remove = FilterStack::new()
            .with(|mut d: Document, _: &FilterContext| -> Result<Document, DocsError> {
                d.rename("h1", "h2")?;
                Ok(d)
            })
            .with(|mut d: Document, _: &FilterContext| -> Result<Document, DocsError> {
                d.remove("h2")?;
                Ok(d)
            });

        let remove_then_rename = FilterStack::new()
            .with(|mut d: Document, _: &FilterContext| -> Result<Document, DocsError> {
                d.remove("h2")?;
                Ok(d)
            })
            .with(|mut d: Document, _: &FilterContext| -> Result<Document, DocsError> {
                d.rename("h1", "h2")?;
                Ok(d)
            });

        let ctx = context("a.html");
        let first = rename_then_remove.apply(doc("<h1>T</h1>"), &ctx).unwrap();
        let second = remove_then_rename.apply(doc("<h1>T</h1>"), &ctx).unwrap();

        assert_eq!(first.count("h1, h2").unwrap(), 0);
        assert_eq!(second.count("h2").unwrap(), 1);
    }

    #[test]
    fn test_stack_stops_at_first_error() {
        let stack = FilterStack::new()
            .with(|_: Document, _: &FilterContext| -> Result<Document, DocsError> {
                Err(DocsError::Filter {
                    filter: "broken".to_string(),
                    message: "boom".to_string(),
                })
            })
            .with(|_: Document, _: &FilterContext| -> Result<Document, DocsError> {
                panic!("must not run after a failure")
            });

        let result = stack.apply(doc("<p>x</p>"), &context("a.html"));
        assert!(matches!(result, Err(DocsError::Filter { .. })));
    }

    #[test]
    fn test_empty_stack_returns_document() {
        let stack = FilterStack::new();
        assert!(stack.is_empty());
        let out = stack.apply(doc("<p>x</p>"), &context("a.html")).unwrap();
        assert_eq!(out.body_html(), "<p>x</p>");
    }
}
