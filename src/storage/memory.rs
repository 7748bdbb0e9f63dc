//! In-memory listing store, used for dry runs.

use crate::error::Result;
use crate::models::ListingRecord;
use crate::storage::{CrawlProgress, ListingStore, RecordOutcome};

/// Keeps accepted records in memory; nothing touches disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    progress: CrawlProgress,
    records: Vec<ListingRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from URLs recorded elsewhere, e.g. an existing output file.
    pub fn with_progress(progress: CrawlProgress) -> Self {
        Self {
            progress,
            records: Vec::new(),
        }
    }

    /// Records accepted by this store, in acceptance order.
    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }
}

impl ListingStore for MemoryStore {
    fn contains(&self, url: &str) -> bool {
        self.progress.contains(url)
    }

    fn record(&mut self, listing: &ListingRecord) -> Result<RecordOutcome> {
        if !self.progress.insert(&listing.url) {
            return Ok(RecordOutcome::Duplicate);
        }
        self.records.push(listing.clone());
        Ok(RecordOutcome::Accepted)
    }

    fn known_count(&self) -> usize {
        self.progress.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_dedups() {
        let mut store = MemoryStore::new();
        let record = ListingRecord::new("https://example.com/home/1");

        assert!(store.record(&record).unwrap().is_accepted());
        assert_eq!(store.record(&record).unwrap(), RecordOutcome::Duplicate);
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.known_count(), 1);
    }

    #[test]
    fn test_seeded_progress_counts_as_known() {
        let progress: CrawlProgress = vec!["https://example.com/home/1".to_string()]
            .into_iter()
            .collect();
        let mut store = MemoryStore::with_progress(progress);

        assert!(store.contains("https://example.com/home/1"));
        let outcome = store
            .record(&ListingRecord::new("https://example.com/home/1"))
            .unwrap();
        assert_eq!(outcome, RecordOutcome::Duplicate);
        assert!(store.records().is_empty());
    }
}
