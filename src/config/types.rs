use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for docbundle
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub output: OutputConfig,
    #[serde(rename = "doc", default)]
    pub docs: Vec<DocConfig>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory the bundles are written under
    pub directory: String,

    /// Write `docs.json` listing every bundle in the directory
    #[serde(default = "default_true")]
    pub manifest: bool,
}

/// One documentation set to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct DocConfig {
    /// Display name
    pub name: String,

    /// Storage slug, `[a-z0-9_.-]`
    pub slug: String,

    /// Documentation flavor label, e.g. `rustdoc`
    #[serde(rename = "type", default = "default_doc_type")]
    pub doc_type: String,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub release: Option<String>,

    /// Scope of the crawl
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Root page below the base URL
    #[serde(rename = "root-path", default)]
    pub root_path: Option<String>,

    /// Additional crawl seeds, relative to the base URL
    #[serde(rename = "initial-paths", default)]
    pub initial_paths: Vec<String>,

    #[serde(default)]
    pub attribution: Option<String>,

    #[serde(default)]
    pub links: BTreeMap<String, String>,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub options: OptionsConfig,

    /// Cleanup pipeline, applied in order
    #[serde(default)]
    pub filters: Vec<FilterConfig>,

    #[serde(default)]
    pub extractor: ExtractorConfig,

    #[serde(default)]
    pub hooks: HooksConfig,
}

impl DocConfig {
    /// `slug` or `slug@version`, for log output
    pub fn label(&self) -> String {
        match &self.version {
            Some(version) => format!("{}@{}", self.slug, version),
            None => self.slug.clone(),
        }
    }
}

/// Where pages are fetched from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    #[default]
    Remote,
    Local,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// Extra request headers (remote only)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Query parameters added to every request (remote only)
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    #[serde(rename = "force-gzip", default)]
    pub force_gzip: bool,

    /// Mirror directory (local only)
    #[serde(default)]
    pub directory: Option<String>,
}

/// Crawl options
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OptionsConfig {
    pub skip: Vec<String>,

    #[serde(rename = "skip-patterns")]
    pub skip_patterns: Vec<String>,

    pub only: Vec<String>,

    #[serde(rename = "only-patterns")]
    pub only_patterns: Vec<String>,

    #[serde(rename = "skip-links")]
    pub skip_links: Vec<String>,

    #[serde(rename = "fixed-internal-urls")]
    pub fixed_internal_urls: bool,

    pub redirections: BTreeMap<String, String>,

    /// Regex rewrites applied to discovered link URLs
    #[serde(rename = "url-rewrites")]
    pub url_rewrites: Vec<RewriteConfig>,

    /// Requests per rolling minute
    #[serde(rename = "rate-limit")]
    pub rate_limit: Option<usize>,

    #[serde(rename = "max-concurrency")]
    pub max_concurrency: usize,

    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    #[serde(rename = "retry-count")]
    pub retry_count: u32,

    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            skip: Vec::new(),
            skip_patterns: Vec::new(),
            only: Vec::new(),
            only_patterns: Vec::new(),
            skip_links: Vec::new(),
            fixed_internal_urls: false,
            redirections: BTreeMap::new(),
            url_rewrites: Vec::new(),
            rate_limit: None,
            max_concurrency: 20,
            timeout_secs: 30,
            retry_count: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl OptionsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// A regex substitution
#[derive(Debug, Clone, Deserialize)]
pub struct RewriteConfig {
    pub pattern: String,
    pub replace: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    KeepOnly,
    Remove,
    Unwrap,
    Rename,
}

/// One step of the cleanup pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    pub kind: FilterKind,
    pub selector: String,

    /// New tag name (rename only)
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractorKind {
    #[default]
    None,
    Heading,
}

/// Entry extraction strategy
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default)]
    pub kind: ExtractorKind,

    /// Type of the page entry (heading only)
    #[serde(rename = "entry-type", default)]
    pub entry_type: Option<String>,

    /// Selector of the page heading, `h1` when unset
    #[serde(default)]
    pub heading: Option<String>,

    /// Selector of section headings that become entries of their own
    #[serde(default)]
    pub sections: Option<String>,

    #[serde(rename = "section-type", default)]
    pub section_type: Option<String>,
}

/// Raw response handling
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HooksConfig {
    /// Regex rewrites applied to each body before parsing
    #[serde(default)]
    pub rewrites: Vec<RewriteConfig>,

    /// Replaces the built-in redirect/not-found markers when set
    #[serde(rename = "reject-markers", default)]
    pub reject_markers: Option<Vec<String>>,

    /// Report rejected pages as errors
    #[serde(default)]
    pub strict: bool,
}

fn default_true() -> bool {
    true
}

fn default_doc_type() -> String {
    "simple".to_string()
}
