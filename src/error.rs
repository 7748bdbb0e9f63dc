// src/error.rs

//! Unified error handling for the listing crawler.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV reading/writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The city table (or another index structure) could not be located
    #[error("Index unavailable at {url}: {reason}")]
    IndexUnavailable { url: String, reason: String },

    /// A page did not load within the bounded timeout
    #[error("Timed out after {timeout_secs}s fetching {url}")]
    FetchTimeout { url: String, timeout_secs: u64 },

    /// A page could not be fetched or navigated to
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an index-unavailable error for the given index page.
    pub fn index_unavailable(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::IndexUnavailable {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a fetch error with context.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a fetch timeout error.
    pub fn timeout(url: impl Into<String>, timeout_secs: u64) -> Self {
        Self::FetchTimeout {
            url: url.into(),
            timeout_secs,
        }
    }

    /// Whether this error only concerns a single page or listing.
    ///
    /// Such failures are skipped by the crawl loop; anything else aborts the run.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::FetchTimeout { .. } | Self::Fetch { .. })
    }
}
