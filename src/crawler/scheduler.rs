//! Crawl frontier and concurrency gate
//!
//! This module handles:
//! - FIFO ordering of URLs waiting to be fetched
//! - Deduplication by case-insensitive, fragment-free URL
//! - Global concurrency limiting via a semaphore

use crate::url::visit_key;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

/// A scheduled fetch with a semaphore permit
///
/// The permit is released when the fetch is dropped, which frees a slot for
/// the next URL.
pub struct ScheduledFetch {
    /// The URL to fetch
    pub url: Url,

    /// The semaphore permit for this fetch
    pub _permit: OwnedSemaphorePermit,
}

/// Scheduler manages the frontier queue and the concurrency limit
///
/// A URL counts as visited the moment it is first dequeued, not when it is
/// enqueued, so the same page discovered by several parents collapses into a
/// single fetch.
pub struct Scheduler {
    /// Global semaphore for limiting concurrent fetches
    semaphore: Arc<Semaphore>,

    /// URLs waiting to be fetched, in discovery order
    frontier: VecDeque<Url>,

    /// Visit keys of every URL handed out so far
    visited: HashSet<String>,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `max_concurrency` - Maximum number of fetches in flight (at least 1)
    /// * `seeds` - Initial URLs to crawl
    pub fn new(max_concurrency: usize, seeds: Vec<Url>) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))),
            frontier: seeds.into(),
            visited: HashSet::new(),
        }
    }

    /// Adds a URL to the back of the frontier
    ///
    /// # Returns
    ///
    /// `false` if the URL was already visited and was not queued
    pub fn enqueue(&mut self, url: Url) -> bool {
        if self.visited.contains(&visit_key(&url)) {
            tracing::trace!("Already visited {}", url);
            return false;
        }
        self.frontier.push_back(url);
        true
    }

    /// Gets the next unvisited URL if a concurrency slot is free
    ///
    /// # Returns
    ///
    /// * `Some(ScheduledFetch)` - A URL that's ready to fetch
    /// * `None` - No free slot, or no unvisited URL left in the frontier
    pub fn try_next(&mut self) -> Option<ScheduledFetch> {
        if self.frontier.is_empty() {
            return None;
        }

        let permit = Arc::clone(&self.semaphore).try_acquire_owned().ok()?;

        while let Some(url) = self.frontier.pop_front() {
            if self.visited.insert(visit_key(&url)) {
                tracing::debug!("Scheduling {}", url);
                return Some(ScheduledFetch {
                    url,
                    _permit: permit,
                });
            }
            tracing::trace!("Skipping duplicate {}", url);
        }
        None
    }

    /// Returns the number of URLs in the frontier
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Returns whether the frontier is empty
    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
