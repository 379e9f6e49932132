use crate::storage::DocumentStore;
use crate::DocsError;
use serde_json::Value;

/// Location of the manifest in the store
pub const MANIFEST_PATH: &str = "docs.json";

/// List of every bundle in a store, built from their `meta.json` files
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    docs: Vec<Value>,
}

impl Manifest {
    /// Reads the `meta.json` of every top-level directory, in name order
    ///
    /// Directories without a `meta.json` (unfinished or cancelled bundles)
    /// are left out.
    pub async fn load(store: &dyn DocumentStore) -> Result<Self, DocsError> {
        let mut docs = Vec::new();
        for name in store.list("").await? {
            let meta_path = format!("{}/meta.json", name);
            if !store.exists(&meta_path).await? {
                continue;
            }
            let content = store.read(&meta_path).await?;
            match serde_json::from_slice(&content) {
                Ok(meta) => docs.push(meta),
                Err(e) => tracing::warn!("Skipping unreadable {}: {}", meta_path, e),
            }
        }
        Ok(Self { docs })
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn docs(&self) -> &[Value] {
        &self.docs
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.docs)
    }

    /// Writes `docs.json` at the root of the store
    pub async fn write(&self, store: &dyn DocumentStore) -> Result<(), DocsError> {
        store.write(MANIFEST_PATH, self.to_json()?.as_bytes()).await?;
        tracing::info!("Wrote {} with {} docs", MANIFEST_PATH, self.len());
        Ok(())
    }
}
