use crate::config::{Config, DocConfig, ExtractorKind, FilterConfig, FilterKind, SourceKind};
use crate::document::{
    Filter, FilterStack, HeadingExtractor, KeepOnly, RemoveNodes, RenameNodes, Rewrite, SiteHooks,
    UnwrapNodes,
};
use crate::site::{DocMeta, RemoteSource, ScraperOptions, Site, Source};
use crate::url::DocsUrl;
use crate::{ConfigError, DocsError};
use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;

/// Resolves a documentation slug to a crawlable site
#[async_trait]
pub trait Registry: Send + Sync {
    /// Finds the site for `slug`, optionally pinned to a version
    ///
    /// `flags` are resolver-specific switches; unknown flags are ignored.
    async fn resolve(&self, slug: &str, version: Option<&str>, flags: &[String]) -> Result<Site, DocsError>;
}

/// Registry backed by the `[[doc]]` tables of a loaded configuration
#[derive(Debug, Clone)]
pub struct ConfigRegistry {
    docs: Vec<DocConfig>,
}

impl ConfigRegistry {
    pub fn new(docs: Vec<DocConfig>) -> Self {
        Self { docs }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.docs.clone())
    }

    /// Every configured doc as `(slug, version)`, in configuration order
    pub fn available(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.docs
            .iter()
            .map(|doc| (doc.slug.as_str(), doc.version.as_deref()))
    }

    fn find(&self, slug: &str, version: Option<&str>) -> Option<&DocConfig> {
        self.docs.iter().find(|doc| {
            doc.slug == slug && version.map_or(true, |v| doc.version.as_deref() == Some(v))
        })
    }
}

#[async_trait]
impl Registry for ConfigRegistry {
    async fn resolve(&self, slug: &str, version: Option<&str>, flags: &[String]) -> Result<Site, DocsError> {
        let doc = self.find(slug, version).ok_or_else(|| {
            DocsError::Registry(match version {
                Some(version) => format!("No documentation configured for {}@{}", slug, version),
                None => format!("No documentation configured for {}", slug),
            })
        })?;

        if !flags.is_empty() {
            tracing::debug!("Ignoring flags {:?} for {}", flags, doc.label());
        }

        site_from_config(doc)
    }
}

/// Builds a site from one `[[doc]]` table
///
/// # Returns
///
/// * `Ok(Site)` - Fully configured site
/// * `Err(DocsError)` - A URL, pattern or selector in the table is invalid
pub fn site_from_config(doc: &DocConfig) -> Result<Site, DocsError> {
    let mut meta = DocMeta::new(&doc.name, &doc.slug, &doc.doc_type);
    meta.version = doc.version.clone();
    meta.release = doc.release.clone();
    meta.links = doc.links.clone();
    meta.attribution = doc.attribution.clone();

    let base_url = DocsUrl::parse(&doc.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", doc.base_url, e)))?;

    let mut site = Site::new(meta, base_url)
        .with_initial_paths(doc.initial_paths.iter().cloned())
        .with_options(scraper_options(doc)?)
        .with_source(source(doc))
        .with_filters(filter_stack(&doc.filters)?)
        .with_hooks(site_hooks(doc)?);

    if let Some(root_path) = &doc.root_path {
        site = site.with_root_path(root_path)?;
    }

    if doc.extractor.kind == ExtractorKind::Heading {
        let extractor = &doc.extractor;
        let mut heading = HeadingExtractor::new(extractor.entry_type.as_deref().unwrap_or("Page"))?;
        if let Some(css) = &extractor.heading {
            heading = heading.with_heading(css)?;
        }
        if let Some(css) = &extractor.sections {
            heading = heading.with_sections(css, extractor.section_type.as_deref().unwrap_or("Section"))?;
        }
        site = site.with_extractor(heading);
    }

    Ok(site)
}

fn scraper_options(doc: &DocConfig) -> Result<ScraperOptions, ConfigError> {
    let config = &doc.options;
    let mut options = ScraperOptions::new()
        .with_skip(config.skip.iter().cloned())
        .with_skip_patterns(compile_all(&config.skip_patterns)?)
        .with_only(config.only.iter().cloned())
        .with_only_patterns(compile_all(&config.only_patterns)?)
        .with_skip_links(config.skip_links.iter().cloned())
        .with_max_concurrency(config.max_concurrency)
        .with_timeout(config.timeout())
        .with_retry_count(config.retry_count)
        .with_retry_delay(config.retry_delay());

    for (from, to) in &config.redirections {
        options = options.with_redirection(from.clone(), to.clone());
    }
    if let Some(limit) = config.rate_limit {
        options = options.with_rate_limit(limit);
    }

    if !config.url_rewrites.is_empty() {
        let rewrites = config
            .url_rewrites
            .iter()
            .map(|rewrite| Ok((compile(&rewrite.pattern)?, rewrite.replace.clone())))
            .collect::<Result<Vec<(Regex, String)>, ConfigError>>()?;
        options = options.with_url_fixer(move |url: &str| {
            rewrites
                .iter()
                .fold(url.to_string(), |url, (pattern, replace)| {
                    pattern.replace_all(&url, replace.as_str()).into_owned()
                })
        });
    } else if config.fixed_internal_urls {
        tracing::warn!(
            "fixed-internal-urls is set for {} but no url-rewrites are configured",
            doc.label()
        );
    }

    Ok(options)
}

fn source(doc: &DocConfig) -> Source {
    match doc.source.kind {
        SourceKind::Remote => Source::Remote(RemoteSource {
            headers: doc.source.headers.clone(),
            params: doc.source.params.clone(),
            force_gzip: doc.source.force_gzip,
        }),
        SourceKind::Local => Source::Local {
            directory: PathBuf::from(doc.source.directory.clone().unwrap_or_default()),
        },
    }
}

fn filter_stack(filters: &[FilterConfig]) -> Result<FilterStack, DocsError> {
    let mut stack = FilterStack::new();
    for config in filters {
        let filter: Box<dyn Filter> = match config.kind {
            FilterKind::KeepOnly => Box::new(KeepOnly::new(&config.selector)?),
            FilterKind::Remove => Box::new(RemoveNodes::new(&config.selector)?),
            FilterKind::Unwrap => Box::new(UnwrapNodes::new(&config.selector)?),
            FilterKind::Rename => Box::new(RenameNodes::new(
                &config.selector,
                config.tag.as_deref().unwrap_or_default(),
            )?),
        };
        stack.push_boxed(filter);
    }
    Ok(stack)
}

fn site_hooks(doc: &DocConfig) -> Result<SiteHooks, ConfigError> {
    let mut hooks = SiteHooks::new().strict(doc.hooks.strict);
    for rewrite in &doc.hooks.rewrites {
        let rewrite = Rewrite::new(&rewrite.pattern, &rewrite.replace)
            .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", rewrite.pattern, e)))?;
        hooks = hooks.with_rewrite(rewrite);
    }
    if let Some(markers) = &doc.hooks.reject_markers {
        hooks = hooks.with_reject_markers(markers.iter().cloned());
    }
    Ok(hooks)
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns.iter().map(|pattern| compile(pattern)).collect()
}
