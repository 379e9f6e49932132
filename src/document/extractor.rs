use crate::document::{selector, Document, FilterContext};
use crate::index::Entry;
use crate::DocsError;
use scraper::Selector;

/// Characters that documentation generators attach to headings as anchor glyphs
const DECORATIVE_CHARS: &[char] = &['¶', '§', '#', '⎘', '¤', '🔗'];

/// Produces the entries found on one processed page
pub trait EntryExtractor: Send + Sync {
    fn extract(&self, document: &Document, context: &FilterContext) -> Result<Vec<Entry>, DocsError>;
}

impl<F> EntryExtractor for F
where
    F: Fn(&Document, &FilterContext) -> Result<Vec<Entry>, DocsError> + Send + Sync,
{
    fn extract(&self, document: &Document, context: &FilterContext) -> Result<Vec<Entry>, DocsError> {
        self(document, context)
    }
}

/// Extractor for sites without an entry strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEntries;

impl EntryExtractor for NoEntries {
    fn extract(&self, _document: &Document, _context: &FilterContext) -> Result<Vec<Entry>, DocsError> {
        Ok(Vec::new())
    }
}

/// Builds entries from page headings
///
/// The first match of the heading selector names the page itself, with the
/// page slug as its path. When a section selector is configured, every
/// matching element with an `id` becomes a `slug#id` entry of its own type.
#[derive(Debug, Clone)]
pub struct HeadingExtractor {
    entry_type: String,
    heading: Selector,
    sections: Option<(Selector, String)>,
}

impl HeadingExtractor {
    /// Creates an extractor that reads the page's first `h1`
    pub fn new(entry_type: &str) -> Result<Self, DocsError> {
        Ok(Self {
            entry_type: entry_type.to_string(),
            heading: selector("h1")?,
            sections: None,
        })
    }

    pub fn with_heading(mut self, css: &str) -> Result<Self, DocsError> {
        self.heading = selector(css)?;
        Ok(self)
    }

    pub fn with_sections(mut self, css: &str, entry_type: &str) -> Result<Self, DocsError> {
        self.sections = Some((selector(css)?, entry_type.to_string()));
        Ok(self)
    }
}

impl EntryExtractor for HeadingExtractor {
    fn extract(&self, document: &Document, context: &FilterContext) -> Result<Vec<Entry>, DocsError> {
        let slug = context.slug();
        let path = if slug.is_empty() { "index".to_string() } else { slug };
        let mut entries = Vec::new();

        if let Some(heading) = document.select(&self.heading).next() {
            let name = clean_name(&heading.text().collect::<String>());
            push_entry(&mut entries, &name, &path, &self.entry_type);
        }

        if let Some((sections, section_type)) = &self.sections {
            for section in document.select(sections) {
                let Some(id) = section.value().attr("id") else {
                    continue;
                };
                let name = clean_name(&section.text().collect::<String>());
                push_entry(&mut entries, &name, &format!("{}#{}", path, id), section_type);
            }
        }

        Ok(entries)
    }
}

fn push_entry(entries: &mut Vec<Entry>, name: &str, path: &str, entry_type: &str) {
    match Entry::new(name, path, entry_type) {
        Ok(entry) => entries.push(entry),
        Err(e) => tracing::debug!("Dropping entry at {}: {}", path, e),
    }
}

/// Collapses whitespace and strips anchor glyphs from both ends
pub(crate) fn clean_name(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| DECORATIVE_CHARS.contains(&c) || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::DocsUrl;

    fn context(page: &str) -> FilterContext {
        let base = DocsUrl::parse("https://example.com/docs/").unwrap();
        let current = base.joining(page).unwrap();
        FilterContext::new(base, current)
    }

    fn doc(body: &str) -> Document {
        Document::parse(&format!("<html><body>{}</body></html>", body))
    }

    #[test]
    fn test_no_entries() {
        let entries = NoEntries.extract(&doc("<h1>T</h1>"), &context("a.html")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("  Struct   Vec ¶ "), "Struct Vec");
        assert_eq!(clean_name("§ Safety"), "Safety");
        assert_eq!(clean_name("C#"), "C");
        assert_eq!(clean_name("Using C# here"), "Using C# here");
    }

    #[test]
    fn test_heading_entry_uses_slug() {
        let extractor = HeadingExtractor::new("Guide").unwrap();
        let entries = extractor
            .extract(&doc("<h1>Getting <em>Started</em> ¶</h1>"), &context("guide/start.html"))
            .unwrap();
        assert_eq!(entries, vec![Entry::new("Getting Started", "guide/start", "Guide").unwrap()]);
    }

    #[test]
    fn test_section_entries() {
        let extractor = HeadingExtractor::new("Struct")
            .unwrap()
            .with_sections("h4.method[id]", "Method")
            .unwrap();
        let body = r#"<h1>Vec</h1>
            <h4 class="method" id="method.push">push</h4>
            <h4 class="method">no id</h4>
            <h4 class="method" id="method.empty"> ¶ </h4>"#;

        let entries = extractor.extract(&doc(body), &context("std/vec/struct.Vec.html")).unwrap();
        assert_eq!(
            entries,
            vec![
                Entry::new("Vec", "std/vec/struct.Vec", "Struct").unwrap(),
                Entry::new("push", "std/vec/struct.Vec#method.push", "Method").unwrap(),
            ]
        );
    }

    #[test]
    fn test_root_page_entry_path_is_index() {
        let extractor = HeadingExtractor::new("Guide").unwrap();
        let entries = extractor.extract(&doc("<h1>Home</h1>"), &context("")).unwrap();
        assert!(entries[0].is_root());
    }

    #[test]
    fn test_missing_heading_yields_nothing() {
        let extractor = HeadingExtractor::new("Guide").unwrap();
        let entries = extractor.extract(&doc("<p>text</p>"), &context("a.html")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_closure_extractor() {
        let extractor = |_: &Document, ctx: &FilterContext| -> Result<Vec<Entry>, DocsError> {
            Ok(vec![Entry::new(ctx.slug(), ctx.slug(), "Page")?])
        };
        let entries = extractor.extract(&doc(""), &context("a.html")).unwrap();
        assert_eq!(entries[0].path(), "a");
    }
}
