// src/lib.rs

//! Listing Crawler Library
//!
//! Walks state and city listing indexes, extracts and normalizes listing
//! fields, and appends each new listing once to a CSV file.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
