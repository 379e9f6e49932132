//! Storage module for persisting documentation bundles
//!
//! This module handles writing crawl output, including:
//! - The `DocumentStore` interface and its filesystem implementation
//! - Per-doc bundles: page files, `index.json`, `db.json` and `meta.json`
//! - The `docs.json` manifest listing every bundle in a store

mod filesystem;
mod manifest;
mod storer;
mod traits;

pub use filesystem::FileSystemStore;
pub use manifest::{Manifest, MANIFEST_PATH};
pub use storer::{DocStorer, StoreReport};
pub use traits::{DocumentStore, StorageError, StorageResult};
