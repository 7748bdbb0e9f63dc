// src/services/fetcher.rs

//! Page fetching seam.
//!
//! The crawl core only sees [`PageFetcher`]. [`FetchSession`] is the HTTP
//! implementation; it owns the client for the length of one crawl and logs
//! its closing when dropped, on every exit path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;
use crate::utils::http::{classify_error, create_async_client};

/// Something that turns a URL into a parsed document.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch and parse one page.
    ///
    /// Fails with [`AppError::FetchTimeout`] or [`AppError::Fetch`].
    async fn fetch(&self, url: &str) -> Result<Html>;
}

/// Fetch a page, converting an overrun of `timeout` into `FetchTimeout`.
pub async fn fetch_bounded(
    fetcher: &dyn PageFetcher,
    url: &str,
    timeout: Duration,
) -> Result<Html> {
    match tokio::time::timeout(timeout, fetcher.fetch(url)).await {
        Ok(result) => result,
        Err(_) => Err(AppError::timeout(url, timeout.as_secs())),
    }
}

/// HTTP-backed fetch session.
pub struct FetchSession {
    client: reqwest::Client,
    request_delay: Duration,
    timeout_secs: u64,
    requests: AtomicUsize,
}

impl FetchSession {
    /// Open a session configured from the crawler settings.
    pub fn open(config: &CrawlerConfig) -> Result<Self> {
        let client = create_async_client(config)?;
        log::info!(
            "Fetch session opened (timeout {}s, delay {}ms)",
            config.timeout_secs,
            config.request_delay_ms
        );

        Ok(Self {
            client,
            request_delay: Duration::from_millis(config.request_delay_ms),
            timeout_secs: config.timeout_secs,
            requests: AtomicUsize::new(0),
        })
    }

    /// Number of requests issued so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

impl Drop for FetchSession {
    fn drop(&mut self) {
        log::info!(
            "Fetch session closed after {} requests",
            self.request_count()
        );
    }
}

#[async_trait]
impl PageFetcher for FetchSession {
    async fn fetch(&self, url: &str) -> Result<Html> {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
        self.requests.fetch_add(1, Ordering::Relaxed);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e, self.timeout_secs))?
            .error_for_status()
            .map_err(|e| classify_error(url, e, self.timeout_secs))?;
        let text = response
            .text()
            .await
            .map_err(|e| classify_error(url, e, self.timeout_secs))?;

        Ok(Html::parse_document(&text))
    }
}

/// In-memory fetcher serving canned pages and recording every request.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use scraper::Html;

    use super::PageFetcher;
    use crate::error::{AppError, Result};

    #[derive(Default)]
    pub struct ScriptedFetcher {
        pages: HashMap<String, String>,
        delays: HashMap<String, Duration>,
        requests: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        pub fn slow_page(mut self, url: &str, html: &str, delay: Duration) -> Self {
            self.delays.insert(url.to_string(), delay);
            self.page(url, html)
        }

        pub fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<Html> {
            {
                self.requests.lock().unwrap().push(url.to_string());
            }
            if let Some(delay) = self.delays.get(url).copied() {
                tokio::time::sleep(delay).await;
            }
            match self.pages.get(url) {
                Some(html) => Ok(Html::parse_document(html)),
                None => Err(AppError::fetch(url, "404 Not Found")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedFetcher;
    use super::*;

    #[tokio::test]
    async fn test_fetch_bounded_passes_through() {
        let fetcher = ScriptedFetcher::new().page("https://example.com/", "<p>hi</p>");
        let doc = fetch_bounded(&fetcher, "https://example.com/", Duration::from_secs(1))
            .await
            .unwrap();
        assert!(doc.html().contains("hi"));
    }

    #[tokio::test]
    async fn test_fetch_bounded_times_out() {
        let fetcher = ScriptedFetcher::new().slow_page(
            "https://example.com/slow",
            "<p>late</p>",
            Duration::from_millis(500),
        );
        let result =
            fetch_bounded(&fetcher, "https://example.com/slow", Duration::from_millis(20)).await;
        assert!(matches!(result, Err(AppError::FetchTimeout { .. })));
    }

    #[tokio::test]
    async fn test_missing_page_is_fetch_error() {
        let fetcher = ScriptedFetcher::new();
        let result = fetcher.fetch("https://example.com/missing").await;
        assert!(matches!(result, Err(AppError::Fetch { .. })));
        assert_eq!(fetcher.requested(), vec!["https://example.com/missing"]);
    }

    #[test]
    fn test_session_opens_with_defaults() {
        let session = FetchSession::open(&CrawlerConfig::default()).unwrap();
        assert_eq!(session.request_count(), 0);
    }
}
