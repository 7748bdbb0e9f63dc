// src/models/mod.rs

//! Domain models for the listing crawler.

mod config;
mod listing;
mod selectors;

// Re-export all public types
pub use config::{Config, CrawlerConfig, OutputConfig, StateTarget};
pub use listing::{
    Address, CityReference, LISTING_COLUMNS, ListingRecord, ListingRow, RawListing,
};
pub use selectors::{
    AmenityRule, DetailField, FieldSelectors, IndexSelectors, KeyDetailRule, SiteConfig,
};
