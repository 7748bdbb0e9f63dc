//! Local CSV storage implementation.
//!
//! ## File Layout
//!
//! ```text
//! state,city,address,price,...,parking,url   # header, written once
//! Washington,Seattle,3915 S Brandon St,...   # one row per accepted listing
//! ```
//!
//! Rows are appended in acceptance order and flushed to disk one at a time,
//! so a crash loses at most the row being written. Reopening the file drops
//! such a torn row and rebuilds the known-URL set from the rows on disk.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{LISTING_COLUMNS, ListingRecord, ListingRow};
use crate::storage::{CrawlProgress, ListingStore, RecordOutcome};

/// Append-only CSV listing store.
pub struct CsvStore {
    path: PathBuf,
    writer: csv::Writer<File>,
    progress: CrawlProgress,
    existing_rows: usize,
}

impl CsvStore {
    /// Read the rows of an existing output file and the URLs they cover.
    ///
    /// A missing file yields nothing. Rows that cannot be read, or that
    /// carry no URL, are skipped with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<(Vec<ListingRow>, CrawlProgress)> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok((Vec::new(), CrawlProgress::new()));
        }

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let mut rows = Vec::new();
        for (index, result) in reader.deserialize::<ListingRow>().enumerate() {
            match result {
                Ok(row) if !row.url.trim().is_empty() => rows.push(row),
                Ok(_) => log::warn!("Row {} of {} has no url", index + 2, path.display()),
                Err(e) => log::warn!(
                    "Skipping unreadable row {} of {}: {}",
                    index + 2,
                    path.display(),
                    e
                ),
            }
        }

        let progress = rows.iter().map(|row| row.url.trim().to_string()).collect();
        Ok((rows, progress))
    }

    /// Open (or create) the output file for appending.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        truncate_torn_tail(&path)?;
        let (rows, progress) = Self::load(&path)?;

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let needs_header = file.metadata()?.len() == 0;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(LISTING_COLUMNS)?;
            writer.flush()?;
        }

        log::info!(
            "Loaded {} existing listings ({} known URLs) from {}",
            rows.len(),
            progress.len(),
            path.display()
        );

        Ok(Self {
            path,
            writer,
            progress,
            existing_rows: rows.len(),
        })
    }

    /// Path of the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of rows that were on disk when the store was opened.
    pub fn existing_rows(&self) -> usize {
        self.existing_rows
    }

    /// Known URLs, e.g. to seed a dry run.
    pub fn progress(&self) -> &CrawlProgress {
        &self.progress
    }
}

impl ListingStore for CsvStore {
    fn contains(&self, url: &str) -> bool {
        self.progress.contains(url)
    }

    fn record(&mut self, listing: &ListingRecord) -> Result<RecordOutcome> {
        if self.progress.contains(&listing.url) {
            log::debug!("Not writing duplicate {}", listing.url);
            return Ok(RecordOutcome::Duplicate);
        }

        self.writer.serialize(ListingRow::from(listing))?;
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.progress.insert(&listing.url);

        Ok(RecordOutcome::Accepted)
    }

    fn known_count(&self) -> usize {
        self.progress.len()
    }
}

/// Cut the file back to the end of its last complete record.
///
/// A record is complete when it ends with a newline and has as many fields
/// as the first (header) record. Anything after it is the remains of a write
/// interrupted by a crash, possibly inside a quoted field.
fn truncate_torn_tail(path: &Path) -> Result<()> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    if bytes.is_empty() {
        return Ok(());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_reader(bytes.as_slice());
    let mut record = csv::ByteRecord::new();
    let mut width = None;
    let mut complete_end = 0u64;

    while let Ok(true) = reader.read_byte_record(&mut record) {
        let end = reader.position().byte();
        let terminated = end
            .checked_sub(1)
            .and_then(|last| bytes.get(last as usize))
            .is_some_and(|b| *b == b'\n');
        let expected = *width.get_or_insert(record.len());
        if terminated && record.len() == expected {
            complete_end = end;
        }
    }

    if complete_end < bytes.len() as u64 {
        log::warn!(
            "{} ends with a torn row, dropping its last {} bytes",
            path.display(),
            bytes.len() as u64 - complete_end
        );
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(complete_end)?;
        file.sync_data()?;
    }
    Ok(())
}
