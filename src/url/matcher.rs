use crate::site::{ScraperOptions, UrlFixer};
use crate::url::DocsUrl;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use url::Url;

/// Admission rules for links discovered during a crawl
///
/// Rules are evaluated against a link's path relative to the site's base URL
/// with the leading `/` removed. The site root and configured initial paths
/// are always admitted.
pub struct PathRules {
    skip: HashSet<String>,
    skip_patterns: Vec<Regex>,
    only: HashSet<String>,
    only_patterns: Vec<Regex>,
    skip_links: HashSet<String>,
    redirections: HashMap<String, String>,
    fixer: Option<UrlFixer>,
    always_allowed: HashSet<String>,
}

impl PathRules {
    /// Builds the rules for one site
    ///
    /// # Arguments
    ///
    /// * `options` - The site's scraper options
    /// * `initial_paths` - Configured initial paths, always admitted
    /// * `root_path` - Optional root path, always admitted
    pub fn new(options: &ScraperOptions, initial_paths: &[String], root_path: Option<&str>) -> Self {
        let lower = |s: &String| s.trim_start_matches('/').to_lowercase();

        let mut always_allowed: HashSet<String> = initial_paths.iter().map(lower).collect();
        if let Some(root) = root_path {
            always_allowed.insert(root.trim_start_matches('/').to_lowercase());
        }

        Self {
            skip: options.skip.iter().map(lower).collect(),
            skip_patterns: options.skip_patterns.clone(),
            only: options.only.iter().map(lower).collect(),
            only_patterns: options.only_patterns.clone(),
            skip_links: options.skip_links.iter().map(lower).collect(),
            redirections: options
                .redirections
                .iter()
                .map(|(from, to)| (lower(from), to.clone()))
                .collect(),
            fixer: if options.fixed_internal_urls {
                options.fix_urls.clone()
            } else {
                None
            },
            always_allowed,
        }
    }

    /// Applies rewrites and filters to a discovered link
    ///
    /// The URL fixer runs first, then the redirection table. The rewritten
    /// URL must still fall under `base` and pass the skip/only rules.
    ///
    /// # Returns
    ///
    /// * `Some(Url)` - The (possibly rewritten) URL to enqueue
    /// * `None` - The link must not be followed
    pub fn admit(&self, url: Url, base: &DocsUrl) -> Option<Url> {
        let mut url = url;

        if let Some(fix) = &self.fixer {
            let fixed = fix(url.as_str());
            url = match Url::parse(&fixed) {
                Ok(fixed) => fixed,
                Err(e) => {
                    tracing::debug!("URL fixer produced invalid URL {}: {}", fixed, e);
                    return None;
                }
            };
        }

        let mut path = relative_path(base, &url)?;

        if let Some(target) = self.redirections.get(&path.to_lowercase()) {
            url = base.joining(target).ok()?.into_url();
            path = relative_path(base, &url)?;
        }

        let lowered_url = url.as_str().to_lowercase();
        if self.skip_links.contains(&lowered_url) || self.skip_links.contains(&path.to_lowercase()) {
            return None;
        }

        if self.is_allowed(&path) {
            Some(url)
        } else {
            None
        }
    }

    /// Checks a base-relative path against the skip and only rules
    pub fn is_allowed(&self, path: &str) -> bool {
        let key = path.trim_start_matches('/').to_lowercase();
        if key.is_empty() || self.always_allowed.contains(&key) {
            return true;
        }

        if self.skip.contains(&key) || self.skip_patterns.iter().any(|re| re.is_match(path)) {
            return false;
        }

        if self.only.is_empty() && self.only_patterns.is_empty() {
            return true;
        }

        self.only.contains(&key) || self.only_patterns.iter().any(|re| re.is_match(path))
    }
}

fn relative_path(base: &DocsUrl, url: &Url) -> Option<String> {
    base.subpath(url, true)
        .map(|subpath| subpath.trim_start_matches('/').to_string())
}
