//! HTML document model and the per-page processing pipeline
//!
//! This module contains everything that runs on a parsed page:
//! - `Document`, a mutable view over a `scraper` tree
//! - the ordered filter pipeline and its per-page context
//! - generic cleanup filters
//! - entry extractors
//! - raw response hooks applied before parsing

mod extractor;
mod filter;
mod filters;
mod hooks;

pub use extractor::{EntryExtractor, HeadingExtractor, NoEntries};
pub use filter::{Filter, FilterContext, FilterStack};
pub use filters::{KeepOnly, RemoveNodes, RenameNodes, UnwrapNodes};
pub use hooks::{ResponseHooks, Rewrite, SiteHooks, DEFAULT_REJECT_MARKERS};

use crate::DocsError;
use ego_tree::NodeId;
use html5ever::LocalName;
use scraper::{ElementRef, Html, Node, Selector};

/// Parses a CSS selector, mapping failures into [`DocsError::Selector`]
pub fn selector(css: &str) -> Result<Selector, DocsError> {
    Selector::parse(css).map_err(|e| DocsError::Selector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

/// A parsed HTML page that filters can query and rewrite
#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a full HTML document
    ///
    /// Parsing never fails; malformed markup is repaired the way browsers do.
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    pub fn as_html(&self) -> &Html {
        &self.html
    }

    /// Returns every element matching `selector`, in document order
    pub fn select<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.html.select(selector)
    }

    /// Returns the first element matching a CSS selector
    pub fn select_first(&self, css: &str) -> Result<Option<ElementRef<'_>>, DocsError> {
        let selector = selector(css)?;
        Ok(self.html.select(&selector).next())
    }

    pub fn count(&self, css: &str) -> Result<usize, DocsError> {
        let selector = selector(css)?;
        Ok(self.html.select(&selector).count())
    }

    /// Detaches every matching element along with its subtree
    ///
    /// # Returns
    ///
    /// The number of elements removed
    pub fn remove(&mut self, css: &str) -> Result<usize, DocsError> {
        Ok(self.remove_matching(&selector(css)?))
    }

    pub fn remove_matching(&mut self, selector: &Selector) -> usize {
        let ids = self.matching_ids(selector);
        for id in &ids {
            self.detach(*id);
        }
        ids.len()
    }

    /// Changes the tag name of every matching element, keeping attributes
    /// and children
    pub fn rename(&mut self, css: &str, tag: &str) -> Result<usize, DocsError> {
        Ok(self.rename_matching(&selector(css)?, tag))
    }

    pub fn rename_matching(&mut self, selector: &Selector, tag: &str) -> usize {
        let ids = self.matching_ids(selector);
        let local = LocalName::from(tag.to_ascii_lowercase());
        for id in &ids {
            if let Some(mut node) = self.html.tree.get_mut(*id) {
                if let Node::Element(element) = node.value() {
                    element.name.local = local.clone();
                }
            }
        }
        ids.len()
    }

    /// Replaces every matching element with its children
    pub fn unwrap_nodes(&mut self, css: &str) -> Result<usize, DocsError> {
        Ok(self.unwrap_matching(&selector(css)?))
    }

    pub fn unwrap_matching(&mut self, selector: &Selector) -> usize {
        let ids = self.matching_ids(selector);
        let mut unwrapped = 0;

        for id in ids {
            let children: Vec<NodeId> = match self.html.tree.get(id) {
                Some(node) if node.parent().is_some() => node.children().map(|c| c.id()).collect(),
                _ => continue,
            };

            for child in children {
                self.detach(child);
                if let Some(mut node) = self.html.tree.get_mut(id) {
                    node.insert_id_before(child);
                }
            }
            self.detach(id);
            unwrapped += 1;
        }

        unwrapped
    }

    /// Replaces the body's content with the first element matching `css`
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The element was found and is now the only body child
    /// * `Ok(false)` - Nothing matched; the document is unchanged
    pub fn keep_only(&mut self, css: &str) -> Result<bool, DocsError> {
        Ok(self.keep_only_matching(&selector(css)?))
    }

    pub fn keep_only_matching(&mut self, selector: &Selector) -> bool {
        let Some(keep) = self.html.select(selector).next().map(|element| element.id()) else {
            return false;
        };
        let Some(body) = self.body().map(|body| body.id()) else {
            return false;
        };
        if keep == body {
            return true;
        }

        let previous: Vec<NodeId> = match self.html.tree.get(body) {
            Some(node) => node.children().map(|c| c.id()).collect(),
            None => return false,
        };

        self.detach(keep);
        if let Some(mut body_node) = self.html.tree.get_mut(body) {
            body_node.append_id(keep);
        }

        for id in previous.into_iter().filter(|id| *id != keep) {
            self.detach(id);
        }

        true
    }

    /// Serializes the whole document back to markup
    pub fn html(&self) -> String {
        self.html.html()
    }

    /// Serializes the body's children, or the whole document without a body
    pub fn body_html(&self) -> String {
        match self.body() {
            Some(body) => body.inner_html(),
            None => self.html(),
        }
    }

    fn body(&self) -> Option<ElementRef<'_>> {
        self.html
            .root_element()
            .children()
            .filter_map(ElementRef::wrap)
            .find(|element| element.value().name() == "body")
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    fn matching_ids(&self, selector: &Selector) -> Vec<NodeId> {
        self.html.select(selector).map(|element| element.id()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Document {
        Document::parse(&format!("<html><head><title>T</title></head><body>{}</body></html>", body))
    }

    #[test]
    fn test_invalid_selector() {
        let document = doc("<p>x</p>");
        assert!(matches!(document.count("p[["), Err(DocsError::Selector { .. })));
    }

    #[test]
    fn test_remove() {
        let mut document = doc(r#"<nav>menu</nav><p>keep</p><div class="ad"><p>ad</p></div>"#);
        assert_eq!(document.remove("nav, .ad").unwrap(), 2);
        assert_eq!(document.body_html(), "<p>keep</p>");
    }

    #[test]
    fn test_remove_nested_matches() {
        let mut document = doc("<div><div>inner</div></div><p>keep</p>");
        document.remove("div").unwrap();
        assert_eq!(document.body_html(), "<p>keep</p>");
    }

    #[test]
    fn test_rename_keeps_attributes_and_children() {
        let mut document = doc(r#"<h3 class="code-header">fn <b>new</b>()</h3>"#);
        assert_eq!(document.rename("h3.code-header", "pre").unwrap(), 1);
        assert_eq!(
            document.body_html(),
            r#"<pre class="code-header">fn <b>new</b>()</pre>"#
        );
    }

    #[test]
    fn test_unwrap_nodes() {
        let mut document = doc(r##"<h2><a class="anchor" href="#x">Title <em>here</em></a></h2>"##);
        assert_eq!(document.unwrap_nodes("a.anchor").unwrap(), 1);
        assert_eq!(document.body_html(), "<h2>Title <em>here</em></h2>");
    }

    #[test]
    fn test_unwrap_nested() {
        let mut document = doc("<span><span>a</span>b</span>");
        assert_eq!(document.unwrap_nodes("span").unwrap(), 2);
        assert_eq!(document.body_html(), "ab");
    }

    #[test]
    fn test_keep_only_nested_element() {
        let mut document =
            doc(r#"<header>h</header><div class="wrap"><main id="main"><p>content</p></main></div><footer>f</footer>"#);
        assert!(document.keep_only("#main").unwrap());
        assert_eq!(document.body_html(), r#"<main id="main"><p>content</p></main>"#);
    }

    #[test]
    fn test_keep_only_missing_leaves_document() {
        let mut document = doc("<p>x</p>");
        assert!(!document.keep_only("#main").unwrap());
        assert_eq!(document.body_html(), "<p>x</p>");
    }

    #[test]
    fn test_matching_variants_take_parsed_selector() {
        let nav = selector("nav").unwrap();
        let main = selector("main").unwrap();
        let mut document = doc("<nav>menu</nav><main><nav>inner</nav><p>x</p></main><footer>f</footer>");

        assert!(document.keep_only_matching(&main));
        assert_eq!(document.remove_matching(&nav), 1);
        assert_eq!(document.body_html(), "<main><p>x</p></main>");
    }

    #[test]
    fn test_select_first_text() {
        let document = doc("<h1>Title</h1><h1>Other</h1>");
        let first = document.select_first("h1").unwrap().unwrap();
        assert_eq!(first.text().collect::<String>(), "Title");
    }
}
