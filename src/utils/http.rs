// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use scraper::Selector;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Map a reqwest failure for `url` onto the fetch error taxonomy.
pub fn classify_error(url: &str, error: reqwest::Error, timeout_secs: u64) -> AppError {
    if error.is_timeout() {
        AppError::timeout(url, timeout_secs)
    } else {
        AppError::fetch(url, error)
    }
}

/// Parse a single CSS selector.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Parse an ordered list of fallback selectors.
pub fn parse_selectors(list: &[String]) -> Result<Vec<Selector>> {
    list.iter().map(|s| parse_selector(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector_valid() {
        assert!(parse_selector("div.class").is_ok());
        assert!(parse_selector("tr[class^='tl']").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(matches!(
            parse_selector("[[invalid"),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn test_parse_selectors_keeps_order() {
        let list = vec![".a".to_string(), ".b".to_string()];
        assert_eq!(parse_selectors(&list).unwrap().len(), 2);
    }

    #[test]
    fn test_create_client() {
        assert!(create_async_client(&CrawlerConfig::default()).is_ok());
    }
}
