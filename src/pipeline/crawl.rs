// src/pipeline/crawl.rs

//! Listing crawl pipeline.
//!
//! States, then cities, then index pages, then listings, strictly in that
//! order. A failed listing or index page is logged and skipped; a state whose
//! city index cannot be read is skipped, and the run fails only when no
//! state could be read at all.

use std::pin::pin;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{CityReference, Config, StateTarget};
use crate::services::normalize::normalize_listing;
use crate::services::{FieldExtractor, IndexWalker, PageFetcher, fetch_bounded};
use crate::storage::{ListingStore, RecordOutcome};

/// Counters for one crawl run.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// States whose city index was read
    pub states: usize,
    pub cities: usize,
    /// Index pages loaded
    pub pages: usize,
    /// Listing URLs yielded by the walker, repeats included
    pub listings_seen: usize,
    pub accepted: usize,
    /// Fetched, but rejected by the store
    pub duplicates: usize,
    /// Skipped before fetching
    pub already_known: usize,
    pub listing_failures: usize,
    pub page_failures: usize,
}

impl CrawlSummary {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            states: 0,
            cities: 0,
            pages: 0,
            listings_seen: 0,
            accepted: 0,
            duplicates: 0,
            already_known: 0,
            listing_failures: 0,
            page_failures: 0,
        }
    }

    /// Wall-clock duration of the run in seconds.
    pub fn elapsed_secs(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    fn log(&self) {
        log::info!(
            "Crawl finished in {}s: {} states, {} cities, {} pages",
            self.elapsed_secs(),
            self.states,
            self.cities,
            self.pages
        );
        log::info!(
            "  {} listings seen, {} accepted, {} duplicates, {} already known",
            self.listings_seen,
            self.accepted,
            self.duplicates,
            self.already_known
        );
        if self.listing_failures + self.page_failures > 0 {
            log::warn!(
                "  {} listing pages and {} index pages failed",
                self.listing_failures,
                self.page_failures
            );
        }
    }
}

/// Crawl every configured state into `store`.
pub async fn run_crawler(
    config: &Config,
    fetcher: &dyn PageFetcher,
    store: &mut dyn ListingStore,
) -> Result<CrawlSummary> {
    let walker = IndexWalker::new(fetcher, &config.site.index, &config.crawler)?;
    let extractor = FieldExtractor::new(&config.site)?;
    let crawl = ListingCrawl {
        fetcher,
        walker: &walker,
        extractor: &extractor,
        page_timeout: Duration::from_secs(config.crawler.page_timeout_secs),
    };

    let mut summary = CrawlSummary::start();
    log::info!(
        "Starting crawl of {} state(s), {} listings already known",
        config.states.len(),
        store.known_count()
    );

    let mut last_unavailable: Option<AppError> = None;
    for state in &config.states {
        log::info!("Crawling {} ({})", state.name, state.url);
        let cities = match walker.discover_cities(&state.url).await {
            Ok(cities) => cities,
            Err(e @ AppError::IndexUnavailable { .. }) => {
                log::error!("Skipping state {}: {}", state.name, e);
                last_unavailable = Some(e);
                continue;
            }
            Err(e) => return Err(e),
        };
        summary.states += 1;

        for city in &cities {
            summary.cities += 1;
            crawl.city(state, city, store, &mut summary).await?;
        }
    }

    if summary.states == 0 {
        if let Some(e) = last_unavailable {
            return Err(e);
        }
    }

    summary.pages = walker.pages_fetched();
    summary.finished_at = Utc::now();
    summary.log();
    Ok(summary)
}

/// Collaborators shared by every city of a run.
struct ListingCrawl<'a> {
    fetcher: &'a dyn PageFetcher,
    walker: &'a IndexWalker<'a>,
    extractor: &'a FieldExtractor,
    page_timeout: Duration,
}

impl ListingCrawl<'_> {
    async fn city(
        &self,
        state: &StateTarget,
        city: &CityReference,
        store: &mut dyn ListingStore,
        summary: &mut CrawlSummary,
    ) -> Result<()> {
        log::info!("[{}] Walking {}", city.name, city.url);
        let mut listings = pin!(
            self.walker
                .paginate_listings(&city.url, state.listing_url_prefix.as_deref())
        );

        while let Some(next) = listings.next().await {
            let url = match next {
                Ok(url) => url,
                Err(e) => {
                    summary.page_failures += 1;
                    log::warn!("[{}] Index page skipped: {}", city.name, e);
                    continue;
                }
            };
            summary.listings_seen += 1;

            if store.contains(&url) {
                summary.already_known += 1;
                log::info!("[{}] Already known: {}", city.name, url);
                continue;
            }

            let raw = match fetch_bounded(self.fetcher, &url, self.page_timeout).await {
                Ok(document) => self.extractor.extract(&document),
                Err(e) if e.is_fetch_failure() => {
                    summary.listing_failures += 1;
                    log::warn!("[{}] Listing skipped: {}", city.name, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let mut record = normalize_listing(&url, raw);
            record.state = state.name.clone();
            record.city = city.name.clone();

            match store.record(&record)? {
                RecordOutcome::Accepted => {
                    summary.accepted += 1;
                    log::info!("[{}] Accepted: {}", city.name, url);
                }
                RecordOutcome::Duplicate => {
                    summary.duplicates += 1;
                    log::info!("[{}] Duplicate: {}", city.name, url);
                }
            }
        }

        Ok(())
    }
}
