//! Storage traits and error types
//!
//! This module defines the trait interface for bundle storage backends and
//! associated error types.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Paths are `/`-separated and relative to the store's root, e.g.
/// `serde~1.0/index.json`. Implementations must be shareable across tasks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Writes a file, creating parent directories and replacing existing content
    async fn write(&self, path: &str, content: &[u8]) -> StorageResult<()>;

    /// Reads a file
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<u8>)` - The file content
    /// * `Err(StorageError::NotFound)` - No such file
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>>;

    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Size of a file in bytes
    async fn size(&self, path: &str) -> StorageResult<u64>;

    /// Deletes a file or a whole directory; missing paths are not an error
    async fn delete(&self, path: &str) -> StorageResult<()>;

    /// Names of the entries directly under a directory, sorted
    ///
    /// An empty path lists the root. A missing directory lists as empty.
    async fn list(&self, path: &str) -> StorageResult<Vec<String>>;
}
