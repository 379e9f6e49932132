//! Crawler module for fetching and processing documentation pages
//!
//! This module contains the core crawling logic, including:
//! - Local and remote fetching with retries and rate limiting
//! - Frontier scheduling under a concurrency limit
//! - Link discovery on processed pages
//! - Overall crawl coordination and statistics

mod coordinator;
mod fetcher;
mod parser;
mod rate_limiter;
mod scheduler;
mod stats;

pub use coordinator::{
    process_response, run_crawl, should_process_response, Coordinator, CrawlOutput, Page,
};
pub use fetcher::{build_http_client, Fetcher, LocalFetcher, RawResponse, RemoteFetcher, USER_AGENT};
pub use parser::extract_internal_urls;
pub use rate_limiter::{RateLimiter, RATE_WINDOW};
pub use scheduler::{ScheduledFetch, Scheduler};
pub use stats::CrawlStats;

#[cfg(test)]
pub(crate) use fetcher::testing;
