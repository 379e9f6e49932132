//! Documentation site definitions
//!
//! A [`Site`] is everything the crawl engine needs to turn one documentation
//! set into pages and entries:
//! - Identity and metadata ([`DocMeta`])
//! - Scope: base URL, root page and initial paths
//! - Where pages come from ([`Source`])
//! - Crawl options, the filter pipeline, the entry extractor and response hooks
//!
//! Sites are normally produced by a [`Registry`] from configuration.

mod options;
mod registry;

pub use options::{
    ScraperOptions, UrlFixer, DEFAULT_MAX_CONCURRENCY, DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY,
    DEFAULT_TIMEOUT,
};
pub use registry::{site_from_config, ConfigRegistry, Registry};

use crate::document::{EntryExtractor, Filter, FilterContext, FilterStack, NoEntries, ResponseHooks, SiteHooks};
use crate::url::{DocsUrl, PathRules};
use crate::{UrlError, UrlResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Descriptive metadata of a documentation set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocMeta {
    pub name: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

impl DocMeta {
    pub fn new(name: impl Into<String>, slug: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            doc_type: doc_type.into(),
            version: None,
            release: None,
            links: BTreeMap::new(),
            attribution: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    pub fn with_link(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.links.insert(name.into(), url.into());
        self
    }

    pub fn with_attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = Some(attribution.into());
        self
    }

    /// Storage directory name: `slug~version`, or just the slug
    ///
    /// # Examples
    ///
    /// ```
    /// use docbundle::site::DocMeta;
    ///
    /// let meta = DocMeta::new("Serde", "serde", "rustdoc");
    /// assert_eq!(meta.path(), "serde");
    /// assert_eq!(meta.with_version("1.0").path(), "serde~1.0");
    /// ```
    pub fn path(&self) -> String {
        match self.version.as_deref() {
            Some(version) if !version.is_empty() => format!("{}~{}", self.slug, version),
            _ => self.slug.clone(),
        }
    }

    pub fn index_path(&self) -> String {
        format!("{}/index.json", self.path())
    }

    pub fn db_path(&self) -> String {
        format!("{}/db.json", self.path())
    }

    pub fn meta_path(&self) -> String {
        format!("{}/meta.json", self.path())
    }

    /// Location of one stored page, the root page being stored as `index`
    pub fn page_path(&self, store_path: &str) -> String {
        let store_path = store_path.trim_matches('/');
        let store_path = if store_path.is_empty() { "index" } else { store_path };
        format!("{}/{}.html", self.path(), store_path)
    }
}

/// Options for fetching over HTTP
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSource {
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    /// Send `Accept-Encoding: gzip` explicitly
    pub force_gzip: bool,
}

/// Where a site's pages are fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Remote(RemoteSource),
    /// A local mirror; URLs map onto files through their base-relative path
    Local { directory: PathBuf },
}

impl Default for Source {
    fn default() -> Self {
        Source::Remote(RemoteSource::default())
    }
}

/// A fully configured documentation site
pub struct Site {
    pub meta: DocMeta,
    /// Scope of the crawl; every processed page lies under it
    pub base_url: DocsUrl,
    pub root_url: DocsUrl,
    pub root_path: Option<String>,
    pub initial_paths: Vec<String>,
    pub options: ScraperOptions,
    pub source: Source,
    pub filters: FilterStack,
    pub extractor: Box<dyn EntryExtractor>,
    pub hooks: Box<dyn ResponseHooks>,
}

impl Site {
    /// Creates a remote site with no filters, no entries and default hooks
    pub fn new(meta: DocMeta, base_url: DocsUrl) -> Self {
        Self {
            meta,
            root_url: base_url.clone(),
            base_url,
            root_path: None,
            initial_paths: Vec::new(),
            options: ScraperOptions::default(),
            source: Source::default(),
            filters: FilterStack::new(),
            extractor: Box::new(NoEntries),
            hooks: Box::new(SiteHooks::default()),
        }
    }

    /// Sets the root page below the base URL
    pub fn with_root_path(mut self, root_path: &str) -> UrlResult<Self> {
        let trimmed = root_path.trim_start_matches('/');
        if trimmed.is_empty() {
            self.root_url = self.base_url.clone();
            self.root_path = None;
        } else {
            self.root_url = self.base_url.joining(trimmed)?;
            self.root_path = Some(trimmed.to_string());
        }
        Ok(self)
    }

    pub fn with_initial_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.initial_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_options(mut self, options: ScraperOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    pub fn with_filters(mut self, filters: FilterStack) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_filter<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_extractor<E: EntryExtractor + 'static>(mut self, extractor: E) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn with_hooks<H: ResponseHooks + 'static>(mut self, hooks: H) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// URL of a page given its base-relative path
    ///
    /// `""` and `"/"` map to the root URL.
    pub fn url_for(&self, path: &str) -> Result<DocsUrl, UrlError> {
        if path.is_empty() || path == "/" {
            Ok(self.root_url.clone())
        } else {
            self.base_url.joining(path)
        }
    }

    /// Crawl seeds: the root URL followed by each initial path
    pub fn initial_urls(&self) -> Vec<Url> {
        let mut urls = vec![self.root_url.as_url().clone()];
        for path in &self.initial_paths {
            match self.url_for(path) {
                Ok(url) => urls.push(url.into_url()),
                Err(e) => tracing::warn!("Ignoring initial path {}: {}", path, e),
            }
        }
        urls
    }

    /// Per-page environment for filters and extractors
    pub fn context_for(&self, current_url: DocsUrl) -> FilterContext {
        FilterContext::new(self.base_url.clone(), current_url)
            .with_root(self.root_url.clone(), self.root_path.clone())
            .with_initial_paths(self.initial_paths.clone())
            .with_links(self.meta.links.clone())
            .with_version(self.meta.version.clone(), self.meta.release.clone())
    }

    /// Link admission rules derived from the options
    pub fn path_rules(&self) -> PathRules {
        PathRules::new(&self.options, &self.initial_paths, self.root_path.as_deref())
    }
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("meta", &self.meta)
            .field("base_url", &self.base_url)
            .field("root_url", &self.root_url)
            .field("initial_paths", &self.initial_paths)
            .field("source", &self.source)
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}
