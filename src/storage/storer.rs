use crate::crawler::{Coordinator, CrawlStats};
use crate::index::{EntryIndex, PageDatabase};
use crate::site::DocMeta;
use crate::storage::DocumentStore;
use crate::DocsError;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Contents of a bundle's `meta.json`
#[derive(Debug, Serialize)]
struct MetaRecord<'a> {
    #[serde(flatten)]
    meta: &'a DocMeta,
    /// Unix timestamp of the write
    mtime: i64,
    /// Size of `db.json` in bytes
    db_size: usize,
}

/// What a stored bundle contains
#[derive(Debug, Clone)]
pub struct StoreReport {
    pub path: String,
    pub pages_written: usize,
    pub entries: usize,
    pub types: usize,
    pub db_size: usize,
    pub stats: CrawlStats,
}

/// Writes a crawl's output as a documentation bundle
///
/// The bundle lives under the doc's storage directory (`slug~version`):
/// - one `{store_path}.html` file per page, the root page as `index.html`
/// - `index.json` with the sorted entries and types
/// - `db.json` mapping store paths to page content
/// - `meta.json` with the doc's metadata, write time and database size
pub struct DocStorer;

impl DocStorer {
    /// Crawls the coordinator's site and stores the result
    ///
    /// Pages are written as they arrive. The index, database and metadata are
    /// written only after the crawl completes; a cancelled crawl leaves them
    /// untouched. A storage failure stops the crawl and fails the run.
    ///
    /// # Returns
    ///
    /// * `Ok(StoreReport)` - The bundle was written, or the crawl was cancelled
    /// * `Err(DocsError)` - Storage failed, or the crawl produced no pages
    pub async fn store(
        coordinator: Coordinator,
        store: &dyn DocumentStore,
        cancel: CancellationToken,
    ) -> Result<StoreReport, DocsError> {
        let meta = coordinator.site().meta.clone();
        let crawl_cancel = cancel.child_token();
        let (mut pages_rx, handle) = coordinator.spawn(crawl_cancel.clone());

        let mut index = EntryIndex::new();
        let mut pages = PageDatabase::new();
        while let Some(page) = pages_rx.recv().await {
            if let Err(e) = store.write(&meta.page_path(&page.store_path), page.content.as_bytes()).await {
                tracing::error!("Failed to write {}: {}", page.store_path, e);
                crawl_cancel.cancel();
                return Err(e.into());
            }
            index.extend(page.entries);
            pages.add(page.store_path, page.content);
        }

        let stats = handle.await?;
        let mut report = StoreReport {
            path: meta.path(),
            pages_written: pages.len(),
            entries: index.len(),
            types: 0,
            db_size: 0,
            stats,
        };

        if report.stats.cancelled {
            tracing::warn!(
                "Crawl of {} was cancelled; index not written ({} pages on disk)",
                meta.name,
                report.pages_written
            );
            return Ok(report);
        }

        if pages.is_empty() {
            return Err(DocsError::Empty(meta.path()));
        }

        let snapshot = index.snapshot();
        report.types = snapshot.types.len();
        let index_json = serde_json::to_string(&snapshot)?;
        store.write(&meta.index_path(), index_json.as_bytes()).await?;

        let db_json = pages.to_json()?;
        report.db_size = db_json.len();
        store.write(&meta.db_path(), db_json.as_bytes()).await?;

        let record = MetaRecord {
            meta: &meta,
            mtime: chrono::Utc::now().timestamp(),
            db_size: report.db_size,
        };
        store
            .write(&meta.meta_path(), serde_json::to_string(&record)?.as_bytes())
            .await?;

        tracing::info!(
            "Stored {}: {} pages, {} entries, {} types",
            report.path,
            report.pages_written,
            report.entries,
            report.types
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::testing::MemoryFetcher;
    use crate::crawler::Fetcher;
    use crate::document::HeadingExtractor;
    use crate::site::Site;
    use crate::storage::FileSystemStore;
    use crate::url::DocsUrl;
    use std::sync::Arc;
    use tempfile::TempDir;

    const BASE: &str = "https://example.com/docs/";

    fn coordinator(fetcher: MemoryFetcher) -> Coordinator {
        let site = Site::new(
            DocMeta::new("Example", "example", "simple").with_version("1.0"),
            DocsUrl::parse(BASE).unwrap(),
        )
        .with_extractor(HeadingExtractor::new("Guide").unwrap());
        let fetcher: Arc<dyn Fetcher> = Arc::new(fetcher);
        Coordinator::with_fetcher(site, fetcher)
    }

    #[tokio::test]
    async fn test_store_writes_bundle() {
        let dir = TempDir::new().unwrap();
        let store = FileSystemStore::new(dir.path());
        let fetcher = MemoryFetcher::new()
            .html(BASE, r#"<h1>Home</h1><a href="guide/intro.html">i</a>"#)
            .html("https://example.com/docs/guide/intro.html", "<h1>Intro</h1>");

        let report = DocStorer::store(coordinator(fetcher), &store, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.path, "example~1.0");
        assert_eq!(report.pages_written, 2);
        assert_eq!(report.entries, 1);
        assert_eq!(report.types, 1);

        let root = dir.path().join("example~1.0");
        assert!(root.join("index.html").is_file());
        assert!(root.join("guide/intro.html").is_file());

        let index: serde_json::Value =
            serde_json::from_slice(&std::fs::read(root.join("index.json")).unwrap()).unwrap();
        assert_eq!(index["entries"][0]["name"], "Intro");
        assert_eq!(index["entries"][0]["path"], "guide/intro");
        assert_eq!(index["types"][0]["name"], "Guide");
        assert_eq!(index["types"][0]["count"], 1);

        let db: serde_json::Value =
            serde_json::from_slice(&std::fs::read(root.join("db.json")).unwrap()).unwrap();
        assert!(db["guide/intro"].as_str().unwrap().contains("Intro"));
        assert!(db.get("index").is_some());

        let meta: serde_json::Value =
            serde_json::from_slice(&std::fs::read(root.join("meta.json")).unwrap()).unwrap();
        assert_eq!(meta["slug"], "example");
        assert_eq!(meta["version"], "1.0");
        assert_eq!(meta["type"], "simple");
        assert_eq!(meta["db_size"], report.db_size);
        assert!(meta["mtime"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_empty_crawl_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = FileSystemStore::new(dir.path());

        let result = DocStorer::store(coordinator(MemoryFetcher::new()), &store, CancellationToken::new()).await;

        assert!(matches!(result, Err(DocsError::Empty(_))));
        assert!(!dir.path().join("example~1.0/index.json").exists());
    }

    #[tokio::test]
    async fn test_cancelled_crawl_skips_index() {
        let dir = TempDir::new().unwrap();
        let store = FileSystemStore::new(dir.path());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let fetcher = MemoryFetcher::new().html(BASE, "<h1>Home</h1>");
        let report = DocStorer::store(coordinator(fetcher), &store, cancel).await.unwrap();

        assert!(report.stats.cancelled);
        assert!(!dir.path().join("example~1.0/index.json").exists());
    }
}
