use crate::config::types::{
    Config, DocConfig, ExtractorConfig, ExtractorKind, FilterConfig, FilterKind, HooksConfig,
    OptionsConfig, OutputConfig, RewriteConfig, SourceConfig, SourceKind,
};
use crate::url::DocsUrl;
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use std::collections::HashSet;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_output_config(&config.output)?;

    if config.docs.is_empty() {
        return Err(ConfigError::Validation(
            "At least one [[doc]] must be configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for doc in &config.docs {
        validate_doc(doc)?;
        if !seen.insert((doc.slug.as_str(), doc.version.as_deref())) {
            return Err(ConfigError::Validation(format!(
                "Duplicate doc '{}'",
                doc.label()
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates one doc entry
fn validate_doc(doc: &DocConfig) -> Result<(), ConfigError> {
    if doc.name.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "Doc '{}' must have a name",
            doc.slug
        )));
    }

    validate_slug(&doc.slug)?;

    if doc.version.as_deref().is_some_and(|v| v.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "Doc '{}' has an empty version",
            doc.slug
        )));
    }

    DocsUrl::parse(&doc.base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid base-url '{}' for '{}': {}", doc.base_url, doc.slug, e))
    })?;

    validate_source(doc, &doc.source)?;
    validate_options(doc, &doc.options)?;
    for filter in &doc.filters {
        validate_filter(doc, filter)?;
    }
    validate_extractor(doc, &doc.extractor)?;
    validate_hooks(&doc.hooks)?;

    Ok(())
}

/// Slugs name directories, so they are restricted to `[a-z0-9_.-]`
fn validate_slug(slug: &str) -> Result<(), ConfigError> {
    if slug.is_empty() {
        return Err(ConfigError::Validation("slug cannot be empty".to_string()));
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-'))
    {
        return Err(ConfigError::Validation(format!(
            "slug must contain only lowercase letters, digits, '_', '.' and '-', got '{}'",
            slug
        )));
    }

    Ok(())
}

fn validate_source(doc: &DocConfig, source: &SourceConfig) -> Result<(), ConfigError> {
    if source.kind == SourceKind::Local
        && source.directory.as_deref().map_or(true, |d| d.trim().is_empty())
    {
        return Err(ConfigError::Validation(format!(
            "Local source of '{}' requires a directory",
            doc.slug
        )));
    }
    Ok(())
}

fn validate_options(doc: &DocConfig, options: &OptionsConfig) -> Result<(), ConfigError> {
    if options.max_concurrency < 1 || options.max_concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "max-concurrency of '{}' must be between 1 and 100, got {}",
            doc.slug, options.max_concurrency
        )));
    }

    if options.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs of '{}' must be >= 1",
            doc.slug
        )));
    }

    if options.retry_count > 10 {
        return Err(ConfigError::Validation(format!(
            "retry-count of '{}' must be <= 10, got {}",
            doc.slug, options.retry_count
        )));
    }

    if options.rate_limit == Some(0) {
        return Err(ConfigError::Validation(format!(
            "rate-limit of '{}' must be >= 1",
            doc.slug
        )));
    }

    for pattern in options.skip_patterns.iter().chain(&options.only_patterns) {
        compile_pattern(pattern)?;
    }
    validate_rewrites(&options.url_rewrites)?;

    Ok(())
}

fn validate_filter(doc: &DocConfig, filter: &FilterConfig) -> Result<(), ConfigError> {
    compile_selector(&filter.selector)?;

    if filter.kind == FilterKind::Rename && filter.tag.as_deref().map_or(true, str::is_empty) {
        return Err(ConfigError::Validation(format!(
            "rename filter '{}' of '{}' requires a tag",
            filter.selector, doc.slug
        )));
    }

    Ok(())
}

fn validate_extractor(doc: &DocConfig, extractor: &ExtractorConfig) -> Result<(), ConfigError> {
    if extractor.kind == ExtractorKind::None {
        return Ok(());
    }

    if extractor.entry_type.as_deref().map_or(true, |t| t.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "heading extractor of '{}' requires an entry-type",
            doc.slug
        )));
    }

    for css in [&extractor.heading, &extractor.sections].into_iter().flatten() {
        compile_selector(css)?;
    }

    if extractor.sections.is_some() && extractor.section_type.is_none() {
        return Err(ConfigError::Validation(format!(
            "sections of '{}' require a section-type",
            doc.slug
        )));
    }

    Ok(())
}

fn validate_hooks(hooks: &HooksConfig) -> Result<(), ConfigError> {
    validate_rewrites(&hooks.rewrites)
}

fn validate_rewrites(rewrites: &[RewriteConfig]) -> Result<(), ConfigError> {
    for rewrite in rewrites {
        compile_pattern(&rewrite.pattern)?;
    }
    Ok(())
}

fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern)
        .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
}

fn compile_selector(css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css)
        .map_err(|e| ConfigError::InvalidPattern(format!("selector '{}': {:?}", css, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Config {
        toml::from_str(toml_str).unwrap()
    }

    fn config_with_doc(doc: &str) -> Config {
        parse(&format!(
            r#"
[output]
directory = "./out"

[[doc]]
name = "Example"
slug = "example"
base-url = "https://example.com/docs/"
{}
"#,
            doc
        ))
    }

    #[test]
    fn test_minimal_config_is_valid() {
        assert!(validate(&config_with_doc("")).is_ok());
    }

    #[test]
    fn test_no_docs_rejected() {
        let config = parse("[output]\ndirectory = \"./out\"\n");
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_empty_output_directory() {
        let mut config = config_with_doc("");
        config.output.directory = " ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_slug_rules() {
        assert!(validate_slug("serde").is_ok());
        assert!(validate_slug("node_18.x-lts").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Serde").is_err());
        assert!(validate_slug("a/b").is_err());
        assert!(validate_slug("a~b").is_err());
    }

    #[test]
    fn test_base_url_must_be_http() {
        let mut config = config_with_doc("");
        config.docs[0].base_url = "ftp://example.com/docs/".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_duplicate_slug_and_version() {
        let mut config = config_with_doc(r#"version = "1.0""#);
        let duplicate = config.docs[0].clone();
        config.docs.push(duplicate);
        assert!(validate(&config).is_err());

        config.docs[1].version = Some("2.0".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_option_bounds() {
        let config = config_with_doc("[doc.options]\nmax-concurrency = 0");
        assert!(validate(&config).is_err());

        let config = config_with_doc("[doc.options]\nmax-concurrency = 101");
        assert!(validate(&config).is_err());

        let config = config_with_doc("[doc.options]\ntimeout-secs = 0");
        assert!(validate(&config).is_err());

        let config = config_with_doc("[doc.options]\nretry-count = 11");
        assert!(validate(&config).is_err());

        let config = config_with_doc("[doc.options]\nrate-limit = 0");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_patterns_rejected() {
        let config = config_with_doc("[doc.options]\nskip-patterns = ['(unclosed']");
        assert!(matches!(validate(&config), Err(ConfigError::InvalidPattern(_))));

        let config = config_with_doc("[[doc.filters]]\nkind = \"remove\"\nselector = \"[[\"");
        assert!(matches!(validate(&config), Err(ConfigError::InvalidPattern(_))));
    }

    #[test]
    fn test_rename_requires_tag() {
        let config = config_with_doc("[[doc.filters]]\nkind = \"rename\"\nselector = \"h4\"");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_local_source_requires_directory() {
        let config = config_with_doc("[doc.source]\nkind = \"local\"");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_heading_extractor_requires_entry_type() {
        let config = config_with_doc("[doc.extractor]\nkind = \"heading\"");
        assert!(validate(&config).is_err());

        let config = config_with_doc("[doc.extractor]\nkind = \"heading\"\nentry-type = \"Guide\"");
        assert!(validate(&config).is_ok());
    }
}
