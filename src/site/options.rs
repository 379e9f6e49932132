use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Rewrites a discovered URL before it is enqueued
pub type UrlFixer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Default number of pages fetched and processed at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 20;

/// Default per-fetch deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default retry budget per fetch
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Default pause between retries
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Crawl options for one documentation site
///
/// Path-based options (`skip`, `only`, `redirections`, `skip_links`) are
/// matched case-insensitively against the page path relative to the site's
/// base URL, without a leading `/`. Patterns are matched against the same
/// path with its original casing.
#[derive(Clone)]
pub struct ScraperOptions {
    pub skip: Vec<String>,
    pub skip_patterns: Vec<Regex>,
    pub only: Vec<String>,
    pub only_patterns: Vec<Regex>,
    /// Links (relative paths or absolute URLs) that are never enqueued
    pub skip_links: Vec<String>,
    /// Run `fix_urls` over every discovered link before enqueueing
    pub fixed_internal_urls: bool,
    pub fix_urls: Option<UrlFixer>,
    pub redirections: BTreeMap<String, String>,
    /// Requests per rolling minute; `None` is unlimited
    pub rate_limit: Option<usize>,
    pub max_concurrency: usize,
    pub timeout: Duration,
    pub retry_count: u32,
    pub retry_delay: Duration,
}

impl Default for ScraperOptions {
    fn default() -> Self {
        Self {
            skip: Vec::new(),
            skip_patterns: Vec::new(),
            only: Vec::new(),
            only_patterns: Vec::new(),
            skip_links: Vec::new(),
            fixed_internal_urls: false,
            fix_urls: None,
            redirections: BTreeMap::new(),
            rate_limit: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl ScraperOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_skip_patterns(mut self, patterns: Vec<Regex>) -> Self {
        self.skip_patterns.extend(patterns);
        self
    }

    pub fn with_only<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_only_patterns(mut self, patterns: Vec<Regex>) -> Self {
        self.only_patterns.extend(patterns);
        self
    }

    pub fn with_skip_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_links.extend(links.into_iter().map(Into::into));
        self
    }

    /// Installs a URL rewrite hook and enables it for discovered links
    pub fn with_url_fixer<F>(mut self, fixer: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.fix_urls = Some(Arc::new(fixer));
        self.fixed_internal_urls = true;
        self
    }

    pub fn with_redirection(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.redirections.insert(from.into(), to.into());
        self
    }

    pub fn with_rate_limit(mut self, per_minute: usize) -> Self {
        self.rate_limit = Some(per_minute);
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_count(mut self, count: u32) -> Self {
        self.retry_count = count;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

impl fmt::Debug for ScraperOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScraperOptions")
            .field("skip", &self.skip)
            .field("skip_patterns", &self.skip_patterns)
            .field("only", &self.only)
            .field("only_patterns", &self.only_patterns)
            .field("skip_links", &self.skip_links)
            .field("fixed_internal_urls", &self.fixed_internal_urls)
            .field("fix_urls", &self.fix_urls.as_ref().map(|_| "<fn>"))
            .field("redirections", &self.redirections)
            .field("rate_limit", &self.rate_limit)
            .field("max_concurrency", &self.max_concurrency)
            .field("timeout", &self.timeout)
            .field("retry_count", &self.retry_count)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}
