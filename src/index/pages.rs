use std::collections::BTreeMap;

/// Processed page content keyed by store path
#[derive(Debug, Default, Clone)]
pub struct PageDatabase {
    pages: BTreeMap<String, String>,
}

impl PageDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a page; a later page with the same path replaces the earlier one
    pub fn add(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.pages.insert(path.into(), content.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.pages.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    /// Serializes the database as a JSON object of path to content
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.pages)
    }
}
