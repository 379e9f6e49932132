//! Generic cleanup steps that any documentation site can configure

use crate::document::{selector, Document, Filter, FilterContext};
use crate::DocsError;
use scraper::Selector;

/// Replaces the body with the first element matching a selector
///
/// Pages without a match are left unchanged, which keeps landing pages and
/// unusual layouts intact rather than emptying them.
#[derive(Debug, Clone)]
pub struct KeepOnly {
    css: String,
    selector: Selector,
}

impl KeepOnly {
    pub fn new(css: &str) -> Result<Self, DocsError> {
        Ok(Self {
            css: css.to_string(),
            selector: selector(css)?,
        })
    }
}

impl Filter for KeepOnly {
    fn apply(&self, mut document: Document, context: &FilterContext) -> Result<Document, DocsError> {
        if !document.keep_only_matching(&self.selector) {
            tracing::debug!("No {} on {}", self.css, context.current_url);
        }
        Ok(document)
    }

    fn name(&self) -> &str {
        "keep-only"
    }
}

/// Removes navigation chrome, scripts and other unwanted elements
#[derive(Debug, Clone)]
pub struct RemoveNodes {
    selector: Selector,
}

impl RemoveNodes {
    pub fn new(css: &str) -> Result<Self, DocsError> {
        Ok(Self {
            selector: selector(css)?,
        })
    }
}

impl Filter for RemoveNodes {
    fn apply(&self, mut document: Document, _context: &FilterContext) -> Result<Document, DocsError> {
        document.remove_matching(&self.selector);
        Ok(document)
    }

    fn name(&self) -> &str {
        "remove"
    }
}

/// Replaces wrapper elements (anchor links, `details` widgets) with their content
#[derive(Debug, Clone)]
pub struct UnwrapNodes {
    selector: Selector,
}

impl UnwrapNodes {
    pub fn new(css: &str) -> Result<Self, DocsError> {
        Ok(Self {
            selector: selector(css)?,
        })
    }
}

impl Filter for UnwrapNodes {
    fn apply(&self, mut document: Document, _context: &FilterContext) -> Result<Document, DocsError> {
        document.unwrap_matching(&self.selector);
        Ok(document)
    }

    fn name(&self) -> &str {
        "unwrap"
    }
}

/// Changes the tag of matching elements, e.g. to normalize heading levels
#[derive(Debug, Clone)]
pub struct RenameNodes {
    selector: Selector,
    tag: String,
}

impl RenameNodes {
    pub fn new(css: &str, tag: &str) -> Result<Self, DocsError> {
        let selector = selector(css)?;
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DocsError::Filter {
                filter: "rename".to_string(),
                message: format!("invalid tag name '{}'", tag),
            });
        }
        Ok(Self {
            selector,
            tag: tag.to_string(),
        })
    }
}

impl Filter for RenameNodes {
    fn apply(&self, mut document: Document, _context: &FilterContext) -> Result<Document, DocsError> {
        document.rename_matching(&self.selector, &self.tag);
        Ok(document)
    }

    fn name(&self) -> &str {
        "rename"
    }
}
