use crate::crawler::RawResponse;
use crate::DocsError;
use regex::Regex;

/// Markup signatures of client-side redirect pages and soft 404 pages
pub const DEFAULT_REJECT_MARKERS: &[&str] = &[r#"http-equiv="refresh""#, "<title>not found</title>"];

/// Site-specific handling of a raw response before it is parsed
pub trait ResponseHooks: Send + Sync {
    /// Rewrites the raw response, e.g. to repair markup the parser would mangle
    fn preprocess_response(&self, response: RawResponse) -> RawResponse {
        response
    }

    /// Decides whether an otherwise admissible response is worth processing
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Process the page
    /// * `Ok(false)` - Skip it quietly
    /// * `Err(DocsError::Rejected)` - Skip it and report why
    fn screen_response(&self, _response: &RawResponse) -> Result<bool, DocsError> {
        Ok(true)
    }
}

/// A regex substitution applied to the raw body
#[derive(Debug, Clone)]
pub struct Rewrite {
    pattern: Regex,
    replacement: String,
}

impl Rewrite {
    /// `replacement` may reference capture groups as `$1` or `${name}`
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.to_string(),
        })
    }

    fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, self.replacement.as_str())
            .into_owned()
    }
}

/// Configurable hooks: body rewrites plus signature-based rejection
#[derive(Debug, Clone)]
pub struct SiteHooks {
    rewrites: Vec<Rewrite>,
    reject_markers: Vec<String>,
    reject_empty: bool,
    strict: bool,
}

impl Default for SiteHooks {
    fn default() -> Self {
        Self {
            rewrites: Vec::new(),
            reject_markers: DEFAULT_REJECT_MARKERS.iter().map(|m| m.to_string()).collect(),
            reject_empty: true,
            strict: false,
        }
    }
}

impl SiteHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rewrite(mut self, rewrite: Rewrite) -> Self {
        self.rewrites.push(rewrite);
        self
    }

    /// Replaces the default markers; matching ignores ASCII case
    pub fn with_reject_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reject_markers = markers
            .into_iter()
            .map(|m| m.into().to_ascii_lowercase())
            .collect();
        self
    }

    /// Report rejected pages as errors instead of skipping them quietly
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn rejection_reason(&self, response: &RawResponse) -> Option<String> {
        let body = response.text();
        if self.reject_empty && body.trim().is_empty() {
            return Some("empty body".to_string());
        }

        let lowered = body.to_ascii_lowercase();
        self.reject_markers
            .iter()
            .find(|marker| lowered.contains(marker.as_str()))
            .map(|marker| format!("matched marker {}", marker))
    }
}

impl ResponseHooks for SiteHooks {
    fn preprocess_response(&self, response: RawResponse) -> RawResponse {
        if self.rewrites.is_empty() {
            return response;
        }

        let mut text = response.text().into_owned();
        for rewrite in &self.rewrites {
            text = rewrite.apply(&text);
        }
        response.with_body(text.into_bytes())
    }

    fn screen_response(&self, response: &RawResponse) -> Result<bool, DocsError> {
        match self.rejection_reason(response) {
            None => Ok(true),
            Some(reason) if self.strict => Err(DocsError::Rejected {
                url: response.url.to_string(),
                reason,
            }),
            Some(reason) => {
                tracing::debug!("Skipping {}: {}", response.url, reason);
                Ok(false)
            }
        }
    }
}
