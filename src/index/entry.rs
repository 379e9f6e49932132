use crate::EntryError;
use serde::Serialize;

/// One named documentation item found on a page
///
/// All three fields are trimmed and guaranteed non-empty. Two entries are
/// equal when name, path and type are all equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Entry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    entry_type: String,
}

impl Entry {
    /// Creates an entry, trimming surrounding whitespace
    ///
    /// # Arguments
    ///
    /// * `name` - Display name, e.g. `Vec::push`
    /// * `path` - Location identifier, typically `slug[#fragment]`
    /// * `entry_type` - Category label, e.g. `Method`
    ///
    /// # Returns
    ///
    /// * `Ok(Entry)` - All fields were non-empty after trimming
    /// * `Err(EntryError)` - The first empty field, checked as name, path, type
    ///
    /// # Examples
    ///
    /// ```
    /// use docbundle::index::Entry;
    ///
    /// let entry = Entry::new("  Vec::push ", "vec#method.push", "Method").unwrap();
    /// assert_eq!(entry.name(), "Vec::push");
    /// assert!(Entry::new("Vec", "", "Struct").is_err());
    /// ```
    pub fn new(
        name: impl AsRef<str>,
        path: impl AsRef<str>,
        entry_type: impl AsRef<str>,
    ) -> Result<Self, EntryError> {
        let name = name.as_ref().trim();
        let path = path.as_ref().trim();
        let entry_type = entry_type.as_ref().trim();

        if name.is_empty() {
            return Err(EntryError::MissingName);
        }
        if path.is_empty() {
            return Err(EntryError::MissingPath);
        }
        if entry_type.is_empty() {
            return Err(EntryError::MissingType);
        }

        Ok(Self {
            name: name.to_string(),
            path: path.to_string(),
            entry_type: entry_type.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn entry_type(&self) -> &str {
        &self.entry_type
    }

    /// Root entries point at the site's landing page and are never indexed
    pub fn is_root(&self) -> bool {
        self.path == "index"
    }
}

/// Per-type entry count derived from an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryType {
    pub name: String,
    pub count: usize,
    pub slug: String,
}

impl EntryType {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        let name = name.into();
        let slug = type_slug(&name);
        Self { name, count, slug }
    }
}

/// Lowercases, turns spaces into hyphens and drops anything outside `[a-z0-9-]`
fn type_slug(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_fields() {
        let entry = Entry::new("  Option  ", "\toption\n", " Enum ").unwrap();
        assert_eq!(entry.name(), "Option");
        assert_eq!(entry.path(), "option");
        assert_eq!(entry.entry_type(), "Enum");
    }

    #[test]
    fn test_missing_fields_are_reported() {
        assert_eq!(Entry::new("", "p", "t"), Err(EntryError::MissingName));
        assert_eq!(Entry::new("n", "   ", "t"), Err(EntryError::MissingPath));
        assert_eq!(Entry::new("n", "p", "\n"), Err(EntryError::MissingType));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(EntryError::MissingName.to_string(), "invalid entry: missing name");
        assert_eq!(EntryError::MissingType.to_string(), "invalid entry: missing type");
    }

    #[test]
    fn test_equality_uses_all_fields() {
        let a = Entry::new("a", "p", "Module").unwrap();
        let b = Entry::new(" a ", "p", "Module").unwrap();
        let c = Entry::new("a", "p", "Function").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_is_root() {
        assert!(Entry::new("Home", "index", "Guide").unwrap().is_root());
        assert!(!Entry::new("Home", "index#top", "Guide").unwrap().is_root());
    }

    #[test]
    fn test_serializes_type_field() {
        let entry = Entry::new("Vec", "vec", "Struct").unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Vec", "path": "vec", "type": "Struct"}));
    }

    #[test]
    fn test_type_slug() {
        assert_eq!(EntryType::new("Trait Method", 1).slug, "trait-method");
        assert_eq!(EntryType::new("C++ Macros!", 1).slug, "c-macros");
        assert_eq!(EntryType::new("Module", 2).slug, "module");
    }
}
