//! Storage abstractions for listing persistence.
//!
//! A store owns the set of listing URLs already recorded ([`CrawlProgress`])
//! and accepts each URL at most once.
//!
//! - [`CsvStore`]: append-only CSV file, flushed per row, resumable
//! - [`MemoryStore`]: keeps records in memory (dry runs)

pub mod local;
pub mod memory;

use std::collections::HashSet;

use crate::error::Result;
use crate::models::ListingRecord;

// Re-export for convenience
pub use local::CsvStore;
pub use memory::MemoryStore;

/// Outcome of offering a listing to a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// New URL; the record was stored
    Accepted,
    /// URL already known; nothing was written
    Duplicate,
}

impl RecordOutcome {
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

/// URLs already turned into stored records. Only ever grows.
#[derive(Debug, Clone, Default)]
pub struct CrawlProgress {
    urls: HashSet<String>,
}

impl CrawlProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Add a URL; returns `false` if it was already known.
    pub fn insert(&mut self, url: &str) -> bool {
        if self.urls.contains(url) {
            return false;
        }
        self.urls.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl FromIterator<String> for CrawlProgress {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            urls: iter.into_iter().filter(|u| !u.is_empty()).collect(),
        }
    }
}

/// Trait for listing storage backends.
pub trait ListingStore {
    /// Whether a listing URL has already been recorded.
    fn contains(&self, url: &str) -> bool;

    /// Store a listing unless its URL is already known.
    ///
    /// An accepted record is durable when this returns.
    fn record(&mut self, listing: &ListingRecord) -> Result<RecordOutcome>;

    /// Number of known listing URLs.
    fn known_count(&self) -> usize;
}
