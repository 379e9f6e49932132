use std::fmt;
use std::time::Duration;

/// Counters collected over one crawl
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStats {
    /// Pages handed to the consumer
    pub pages_emitted: usize,
    pub entries_extracted: usize,
    /// Fetches that ended in a transport error
    pub fetch_failures: usize,
    /// Responses not admitted: error status, non-HTML, off-site redirect, or quiet rejection
    pub skipped: usize,
    /// Responses rejected with an error by the site's hooks
    pub rejected: usize,
    /// Pages whose filters or extractor failed
    pub processing_failures: usize,
    pub urls_visited: usize,
    pub frontier_remaining: usize,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl CrawlStats {
    pub fn produced_nothing(&self) -> bool {
        self.pages_emitted == 0
    }

    pub fn failures(&self) -> usize {
        self.fetch_failures + self.rejected + self.processing_failures
    }

    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.pages_emitted as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for CrawlStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pages, {} entries, {} visited, {} skipped, {} failed in {:.1}s",
            self.pages_emitted,
            self.entries_extracted,
            self.urls_visited,
            self.skipped,
            self.failures(),
            self.elapsed.as_secs_f64()
        )?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_produced_nothing() {
        let stats = CrawlStats::default();
        assert!(stats.produced_nothing());
        assert_eq!(stats.pages_per_second(), 0.0);
    }

    #[test]
    fn test_display() {
        let stats = CrawlStats {
            pages_emitted: 2,
            entries_extracted: 5,
            urls_visited: 3,
            skipped: 1,
            fetch_failures: 1,
            elapsed: Duration::from_secs(2),
            cancelled: true,
            ..Default::default()
        };
        assert_eq!(
            stats.to_string(),
            "2 pages, 5 entries, 3 visited, 1 skipped, 1 failed in 2.0s (cancelled)"
        );
        assert_eq!(stats.pages_per_second(), 1.0);
    }
}
