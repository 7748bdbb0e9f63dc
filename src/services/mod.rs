//! Service layer for the listing crawler.
//!
//! This module contains the business logic for:
//! - Page fetching behind a trait seam (`PageFetcher`, `FetchSession`)
//! - City discovery and index pagination (`IndexWalker`)
//! - Listing field extraction (`FieldExtractor`)
//! - Unit normalization (`normalize`)

pub mod extractor;
pub mod fetcher;
pub mod normalize;
pub mod walker;

pub use extractor::FieldExtractor;
pub use fetcher::{FetchSession, PageFetcher, fetch_bounded};
pub use walker::IndexWalker;
