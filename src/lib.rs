//! docbundle: offline documentation bundles from documentation sites
//!
//! This crate crawls a package's published documentation (or a local mirror),
//! cleans every fetched page through an ordered filter pipeline, extracts named
//! documentation entries, and produces a deterministic entry index plus the
//! page content for storage.

pub mod config;
pub mod crawler;
pub mod document;
pub mod index;
pub mod site;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for docbundle operations
#[derive(Debug, Error)]
pub enum DocsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Setup error: {0}")]
    Setup(String),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Invalid selector {selector}: {message}")]
    Selector { selector: String, message: String },

    #[error("Filter {filter} failed: {message}")]
    Filter { filter: String, message: String },

    #[error("Response rejected for {url}: {reason}")]
    Rejected { url: String, reason: String },

    #[error("{0}")]
    InvalidEntry(#[from] EntryError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("No pages were produced for {0}")]
    Empty(String),

    #[error("Crawl task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Entry construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("invalid entry: missing name")]
    MissingName,

    #[error("invalid entry: missing path")]
    MissingPath,

    #[error("invalid entry: missing type")]
    MissingType,
}

/// Result type alias for docbundle operations
pub type Result<T> = std::result::Result<T, DocsError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlOutput, CrawlStats, Page};
pub use document::{Document, Filter, FilterContext, FilterStack};
pub use index::{Entry, EntryIndex, EntryType, PageDatabase};
pub use site::{DocMeta, ScraperOptions, Site};
pub use url::DocsUrl;
