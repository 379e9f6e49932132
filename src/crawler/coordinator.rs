//! Crawl engine
//!
//! This module contains the crawl loop that turns a [`Site`] into a stream of
//! processed pages, including:
//! - Seeding the frontier with the root URL and initial paths
//! - Running fetch and processing workers under the concurrency limit
//! - Admitting the responses worth processing
//! - Running the filter pipeline and entry extractor on each page
//! - Enqueueing discovered links that pass the site's admission rules
//! - Stopping promptly when the cancellation token fires

use crate::crawler::parser::extract_internal_urls;
use crate::crawler::scheduler::{ScheduledFetch, Scheduler};
use crate::crawler::{CrawlStats, Fetcher, LocalFetcher, RawResponse, RemoteFetcher};
use crate::document::Document;
use crate::index::{Entry, EntryIndex, PageDatabase};
use crate::site::{Site, Source};
use crate::url::{DocsUrl, PathRules};
use crate::DocsError;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use url::Url;

/// One processed page
#[derive(Debug, Clone)]
pub struct Page {
    /// URL the page was served from, after redirects
    pub url: Url,
    /// Path relative to the base URL, with a leading `/` (empty for the base)
    pub path: String,
    /// Identifier the page is stored under, `index` for the base URL
    pub store_path: String,
    /// Body markup after filtering
    pub content: String,
    /// In-scope links found on the page
    pub internal_urls: Vec<Url>,
    pub entries: Vec<Entry>,
}

/// Everything a finished crawl produced, gathered in memory
#[derive(Debug)]
pub struct CrawlOutput {
    pub index: EntryIndex,
    pub pages: PageDatabase,
    pub stats: CrawlStats,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    site: Arc<Site>,
    fetcher: Arc<dyn Fetcher>,
    rules: PathRules,
}

impl Coordinator {
    /// Creates a coordinator fetching from the site's configured source
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(DocsError::Setup)` - The source cannot be used, e.g. a missing
    ///   local directory or an invalid header
    pub fn new(site: Site) -> Result<Self, DocsError> {
        let fetcher: Arc<dyn Fetcher> = match &site.source {
            Source::Remote(remote) => Arc::new(RemoteFetcher::new(remote, &site.options)?),
            Source::Local { directory } => {
                Arc::new(LocalFetcher::new(site.base_url.clone(), directory.clone())?)
            }
        };
        Ok(Self::with_fetcher(site, fetcher))
    }

    /// Creates a coordinator with an explicit fetcher
    pub fn with_fetcher(site: Site, fetcher: Arc<dyn Fetcher>) -> Self {
        let rules = site.path_rules();
        Self {
            site: Arc::new(site),
            fetcher,
            rules,
        }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Fetches and processes a single page outside a crawl
    ///
    /// Links found on the page are returned on the [`Page`] but not followed.
    ///
    /// # Arguments
    ///
    /// * `path` - Base-relative path of the page; `""` builds the root page
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Page))` - The page was processed
    /// * `Ok(None)` - The response was not worth processing (not found, not HTML, ...)
    /// * `Err(DocsError)` - The path, fetch or processing failed
    pub async fn build_page(&self, path: &str) -> Result<Option<Page>, DocsError> {
        let url = self.site.url_for(path)?.into_url();
        let response = self.fetcher.fetch(&url).await?;

        if let Some(reason) = should_process_response(&self.site, &response)? {
            tracing::debug!("Skipped {}: {}", url, reason);
            return Ok(None);
        }

        let response = self.site.hooks.preprocess_response(response);
        process_response(&self.site, &response).map(Some)
    }

    /// Starts the crawl on a background task
    ///
    /// Pages arrive on the returned channel as they finish processing. The
    /// channel closes when the crawl completes or is cancelled; the handle then
    /// resolves to the crawl's statistics.
    pub fn spawn(self, cancel: CancellationToken) -> (mpsc::Receiver<Page>, JoinHandle<CrawlStats>) {
        let (tx, rx) = mpsc::channel(self.site.options.max_concurrency.max(1) * 2);
        let handle = tokio::spawn(self.run(tx, cancel));
        (rx, handle)
    }

    /// Crawls to completion and gathers the index and pages in memory
    pub async fn collect(self, cancel: CancellationToken) -> Result<CrawlOutput, DocsError> {
        let (mut pages_rx, handle) = self.spawn(cancel);

        let mut index = EntryIndex::new();
        let mut pages = PageDatabase::new();
        while let Some(page) = pages_rx.recv().await {
            index.extend(page.entries);
            pages.add(page.store_path, page.content);
        }

        let stats = handle.await?;
        Ok(CrawlOutput {
            index,
            pages,
            stats,
        })
    }

    /// Runs the main crawl loop
    ///
    /// This is the core crawling logic that:
    /// 1. Hands frontier URLs to workers while concurrency slots are free
    /// 2. Waits for the next worker to finish, or for cancellation
    /// 3. Enqueues the finished page's admitted links
    /// 4. Sends the page to the consumer
    ///
    /// The loop ends when the frontier is empty and no worker is in flight.
    /// Per-page failures are logged and counted, never propagated.
    pub async fn run(self, tx: mpsc::Sender<Page>, cancel: CancellationToken) -> CrawlStats {
        let start_time = Instant::now();
        let mut stats = CrawlStats::default();
        let mut scheduler = Scheduler::new(self.site.options.max_concurrency, self.site.initial_urls());
        let mut in_flight: JoinSet<Visit> = JoinSet::new();

        tracing::info!(
            "Starting crawl of {} at {} ({} seed URLs)",
            self.site.meta.name,
            self.site.base_url,
            scheduler.frontier_size()
        );

        'crawl: loop {
            if cancel.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            while let Some(scheduled) = scheduler.try_next() {
                let span = tracing::info_span!("page", url = %scheduled.url);
                let site = Arc::clone(&self.site);
                let fetcher = Arc::clone(&self.fetcher);
                in_flight.spawn(visit(site, fetcher, scheduled).instrument(span));
            }

            if in_flight.is_empty() {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            }

            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    stats.cancelled = true;
                    break;
                }
                joined = in_flight.join_next() => joined,
            };

            let visit = match joined {
                Some(Ok(visit)) => visit,
                Some(Err(e)) => {
                    if e.is_panic() {
                        tracing::error!("Page worker panicked: {}", e);
                        stats.processing_failures += 1;
                    }
                    continue;
                }
                None => continue,
            };

            match visit.outcome {
                Outcome::Page(page) => {
                    for link in &page.internal_urls {
                        if let Some(url) = self.rules.admit(link.clone(), &self.site.base_url) {
                            scheduler.enqueue(url);
                        }
                    }

                    if cancel.is_cancelled() {
                        stats.cancelled = true;
                        break;
                    }

                    let entries = page.entries.len();
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            stats.cancelled = true;
                            break 'crawl;
                        }
                        sent = tx.send(page) => {
                            if sent.is_err() {
                                tracing::warn!("Page consumer went away, stopping crawl");
                                stats.cancelled = true;
                                break 'crawl;
                            }
                        }
                    }

                    stats.pages_emitted += 1;
                    stats.entries_extracted += entries;

                    if stats.pages_emitted % 10 == 0 {
                        let rate = stats.pages_emitted as f64 / start_time.elapsed().as_secs_f64();
                        tracing::info!(
                            "Progress: {} pages processed, {} in frontier, {:.2} pages/sec",
                            stats.pages_emitted,
                            scheduler.frontier_size(),
                            rate
                        );
                    }
                }
                Outcome::Skipped(reason) => {
                    tracing::debug!("Skipped {}: {}", visit.url, reason);
                    stats.skipped += 1;
                }
                Outcome::Rejected(e) => {
                    tracing::warn!("{}", e);
                    stats.rejected += 1;
                }
                Outcome::FetchFailed(e) => {
                    tracing::warn!("Failed to fetch {}: {}", visit.url, e);
                    stats.fetch_failures += 1;
                }
                Outcome::ProcessingFailed(e) => {
                    tracing::warn!("Failed to process {}: {}", visit.url, e);
                    stats.processing_failures += 1;
                }
            }
        }

        if !in_flight.is_empty() {
            tracing::info!("Crawl cancelled with {} pages in flight", in_flight.len());
            in_flight.abort_all();
        }

        stats.urls_visited = scheduler.visited_count();
        stats.frontier_remaining = scheduler.frontier_size();
        stats.elapsed = start_time.elapsed();

        if stats.produced_nothing() && !stats.cancelled {
            tracing::error!(
                "Crawl of {} produced nothing; check the base URL and admission rules",
                self.site.meta.name
            );
        } else {
            tracing::info!("Crawl of {} finished: {}", self.site.meta.name, stats);
        }

        stats
    }
}

/// Crawls a site with its configured source and gathers the results
///
/// # Arguments
///
/// * `site` - The site to crawl
///
/// # Returns
///
/// * `Ok(CrawlOutput)` - Crawl completed
/// * `Err(DocsError)` - The fetcher could not be set up
pub async fn run_crawl(site: Site) -> Result<CrawlOutput, DocsError> {
    Coordinator::new(site)?.collect(CancellationToken::new()).await
}

struct Visit {
    url: Url,
    outcome: Outcome,
}

enum Outcome {
    Page(Page),
    Skipped(String),
    Rejected(DocsError),
    FetchFailed(DocsError),
    ProcessingFailed(DocsError),
}

/// Fetches and processes one URL on a worker task
async fn visit(site: Arc<Site>, fetcher: Arc<dyn Fetcher>, scheduled: ScheduledFetch) -> Visit {
    let ScheduledFetch { url, _permit } = scheduled;

    let outcome = match fetcher.fetch(&url).await {
        Err(e) => Outcome::FetchFailed(e),
        Ok(response) => match should_process_response(&site, &response) {
            Err(e) => Outcome::Rejected(e),
            Ok(Some(reason)) => Outcome::Skipped(reason),
            Ok(None) => {
                let response = site.hooks.preprocess_response(response);
                match process_response(&site, &response) {
                    Ok(page) => Outcome::Page(page),
                    Err(e) => Outcome::ProcessingFailed(e),
                }
            }
        },
    };

    Visit { url, outcome }
}

/// Decides whether a fetched response is processed
///
/// A response is processed when its status is exactly 200, its Content-Type
/// mentions HTML, its final URL still lies under the base URL, and the site's
/// hooks accept it.
///
/// # Returns
///
/// * `Ok(None)` - Process the response
/// * `Ok(Some(reason))` - Skip it
/// * `Err(DocsError)` - The hooks rejected it with an error
pub fn should_process_response(site: &Site, response: &RawResponse) -> Result<Option<String>, DocsError> {
    if !response.is_success() {
        return Ok(Some(format!("HTTP {}", response.status)));
    }
    if !response.is_html() {
        return Ok(Some(format!("not HTML ({})", response.content_type())));
    }
    if !site.base_url.contains(&response.url) {
        return Ok(Some(format!("redirected outside {} to {}", site.base_url, response.url)));
    }
    if !site.hooks.screen_response(response)? {
        return Ok(Some("rejected by site hooks".to_string()));
    }
    Ok(None)
}

/// Parses, filters and extracts one admitted response
///
/// Synchronous so the parsed document never lives across an await point.
pub fn process_response(site: &Site, response: &RawResponse) -> Result<Page, DocsError> {
    let current = DocsUrl::from_url(response.url.clone())?;
    let context = site.context_for(current);

    let document = Document::parse(&response.text());
    let document = site.filters.apply(document, &context)?;
    let entries = site.extractor.extract(&document, &context)?;
    let internal_urls = extract_internal_urls(&document, &response.url, &site.base_url);

    let slug = context.slug();
    Ok(Page {
        url: response.url.clone(),
        path: context.subpath().unwrap_or_default(),
        store_path: if slug.is_empty() { "index".to_string() } else { slug },
        content: document.body_html(),
        internal_urls,
        entries,
    })
}
