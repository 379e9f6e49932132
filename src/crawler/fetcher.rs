//! Page fetchers
//!
//! This module turns URLs into raw responses, including:
//! - Building HTTP clients with the crate's user agent
//! - Remote fetching with custom headers, query parameters and retries
//! - Optional per-minute rate limiting of remote fetches
//! - Serving a local mirror of a documentation site from disk
//! - Error classification (timeouts versus other transport failures)

use crate::crawler::RateLimiter;
use crate::site::{RemoteSource, ScraperOptions};
use crate::url::DocsUrl;
use crate::DocsError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// User agent sent with every remote request
pub const USER_AGENT: &str = concat!("docbundle/", env!("CARGO_PKG_VERSION"));

/// A fetched page before any processing
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final URL after redirects
    pub url: Url,
    pub status: u16,
    /// Header names are lowercased
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(url: Url, status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        Self {
            url,
            status,
            headers,
            body,
        }
    }

    /// An empty 404, used when a local file cannot be read
    pub fn not_found(url: Url) -> Self {
        Self::new(url, 404, Vec::new(), Vec::new())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Content-Type header, `text/plain` when absent
    pub fn content_type(&self) -> &str {
        self.header("content-type").unwrap_or("text/plain")
    }

    /// Content-Length header, falling back to the body size
    pub fn content_length(&self) -> usize {
        self.header("content-length")
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(self.body.len())
    }

    /// Only 200 counts as success; other 2xx statuses are not processed
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Status 0, or 4xx/5xx other than 403 and 404
    pub fn is_error(&self) -> bool {
        self.status == 0 || ((400..=599).contains(&self.status) && !matches!(self.status, 403 | 404))
    }

    pub fn is_html(&self) -> bool {
        self.content_type().to_ascii_lowercase().contains("html")
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Body decoded as UTF-8, with invalid sequences replaced
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }
}

/// Source of raw responses for the crawl engine
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches one URL
    ///
    /// # Returns
    ///
    /// * `Ok(RawResponse)` - Any HTTP response, including error statuses
    /// * `Err(DocsError)` - The request could not be completed
    async fn fetch(&self, url: &Url) -> Result<RawResponse, DocsError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages over HTTP
///
/// Transport failures and 5xx responses are retried up to the configured
/// retry count, sleeping the retry delay between attempts. Every attempt
/// passes through the rate limiter when one is configured.
pub struct RemoteFetcher {
    client: Client,
    headers: HeaderMap,
    params: Vec<(String, String)>,
    rate_limiter: Option<Arc<RateLimiter>>,
    retry_count: u32,
    retry_delay: Duration,
}

impl RemoteFetcher {
    pub fn new(source: &RemoteSource, options: &ScraperOptions) -> Result<Self, DocsError> {
        let client = build_http_client(options.timeout)
            .map_err(|e| DocsError::Setup(format!("Failed to build HTTP client: {}", e)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &source.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| DocsError::Setup(format!("Invalid header name '{}'", name)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| DocsError::Setup(format!("Invalid value for header '{}'", name)))?;
            headers.insert(header_name, header_value);
        }
        if source.force_gzip {
            headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        }

        Ok(Self {
            client,
            headers,
            params: source
                .params
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            rate_limiter: options.rate_limit.map(|limit| Arc::new(RateLimiter::new(limit))),
            retry_count: options.retry_count,
            retry_delay: options.retry_delay,
        })
    }

    async fn send(&self, url: &Url) -> Result<RawResponse, DocsError> {
        let mut request = self.client.get(url.clone()).headers(self.headers.clone());
        if !self.params.is_empty() {
            request = request.query(&self.params);
        }

        let response = request.send().await.map_err(|e| classify_error(url, e))?;
        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(url, e))?
            .to_vec();

        Ok(RawResponse::new(final_url, status, headers, body))
    }
}

#[async_trait]
impl Fetcher for RemoteFetcher {
    async fn fetch(&self, url: &Url) -> Result<RawResponse, DocsError> {
        let mut attempt = 0;
        loop {
            if let Some(limiter) = &self.rate_limiter {
                limiter.admit().await;
            }

            let result = self.send(url).await;
            let retryable = match &result {
                Ok(response) => response.status >= 500,
                Err(DocsError::Timeout { .. }) => true,
                Err(DocsError::Http { source, .. }) => !source.is_builder(),
                Err(_) => false,
            };
            if !retryable || attempt >= self.retry_count {
                return result;
            }

            attempt += 1;
            match &result {
                Ok(response) => tracing::warn!(
                    "HTTP {} from {}, retrying ({}/{})",
                    response.status,
                    url,
                    attempt,
                    self.retry_count
                ),
                Err(e) => tracing::warn!("{}, retrying ({}/{})", e, attempt, self.retry_count),
            }
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

fn classify_error(url: &Url, error: reqwest::Error) -> DocsError {
    if error.is_timeout() {
        DocsError::Timeout {
            url: url.to_string(),
        }
    } else {
        DocsError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Serves pages from a local copy of a documentation site
///
/// URLs are mapped onto the directory through their path relative to the
/// base URL. Directory paths resolve to their `index.html`. Unreadable files
/// come back as empty 404 responses so a missing page never aborts a crawl.
#[derive(Debug, Clone)]
pub struct LocalFetcher {
    base_url: DocsUrl,
    directory: PathBuf,
}

impl LocalFetcher {
    pub fn new(base_url: DocsUrl, directory: impl Into<PathBuf>) -> Result<Self, DocsError> {
        let directory = directory.into();
        if !directory.is_dir() {
            return Err(DocsError::Setup(format!(
                "Local source directory not found: {}",
                directory.display()
            )));
        }
        Ok(Self {
            base_url,
            directory,
        })
    }

    /// File backing a URL, `None` when the URL lies outside the base URL
    pub fn file_for(&self, url: &Url) -> Option<PathBuf> {
        let subpath = self.base_url.subpath(url, false)?;
        let relative = subpath.trim_start_matches('/');
        let mut path = self.directory.join(relative);
        if relative.is_empty() || url.path().ends_with('/') {
            path.push("index.html");
        }
        Some(path)
    }
}

#[async_trait]
impl Fetcher for LocalFetcher {
    async fn fetch(&self, url: &Url) -> Result<RawResponse, DocsError> {
        let Some(path) = self.file_for(url) else {
            tracing::warn!("{} is outside {}", url, self.base_url);
            return Ok(RawResponse::not_found(url.clone()));
        };

        match tokio::fs::read(&path).await {
            Ok(body) => {
                let headers = vec![("content-type".to_string(), content_type_for(&path).to_string())];
                Ok(RawResponse::new(url.clone(), 200, headers, body))
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                Ok(RawResponse::not_found(url.clone()))
            }
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        None | Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("txt") | Some("md") => "text/plain",
        Some(_) => "application/octet-stream",
    }
}
