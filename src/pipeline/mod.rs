//! Pipeline entry points for crawler operations.
//!
//! - `run_crawler`: Walk configured states and store new listings
//! - `run_validate`: Check configuration and selectors offline

pub mod crawl;
pub mod validate;

pub use crawl::{CrawlSummary, run_crawler};
pub use validate::run_validate;
