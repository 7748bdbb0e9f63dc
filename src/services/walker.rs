// src/services/walker.rs

//! Index walking: state city table and paginated city listing indexes.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::stream::{self, Stream};
use scraper::Selector;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{CityReference, CrawlerConfig, IndexSelectors};
use crate::services::fetcher::{PageFetcher, fetch_bounded};
use crate::utils::http::parse_selectors;
use crate::utils::{canonical_url, element_text, resolve_url, select_all, select_first};

/// Discovers cities and walks their listing index pages.
pub struct IndexWalker<'a> {
    fetcher: &'a dyn PageFetcher,
    city_table: Vec<Selector>,
    city_row: Vec<Selector>,
    city_link: Vec<Selector>,
    listing_card: Vec<Selector>,
    page_suffix: String,
    page_timeout: Duration,
    max_pages: Option<u32>,
    pages: AtomicUsize,
}

/// Pagination state carried between stream steps.
struct PageCursor {
    page: u32,
    pending: VecDeque<String>,
    finished: bool,
}

impl<'a> IndexWalker<'a> {
    /// Create a walker over the given fetcher.
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        selectors: &IndexSelectors,
        crawler: &CrawlerConfig,
    ) -> Result<Self> {
        Ok(Self {
            fetcher,
            city_table: parse_selectors(&selectors.city_table)?,
            city_row: parse_selectors(&selectors.city_row)?,
            city_link: parse_selectors(&selectors.city_link)?,
            listing_card: parse_selectors(&selectors.listing_card)?,
            page_suffix: selectors.page_suffix.clone(),
            page_timeout: Duration::from_secs(crawler.page_timeout_secs),
            max_pages: crawler.max_pages,
            pages: AtomicUsize::new(0),
        })
    }

    /// Read the city table of a state index page.
    ///
    /// Fails with `IndexUnavailable` when the page cannot be loaded or has no city table.
    pub async fn discover_cities(&self, state_index_url: &str) -> Result<Vec<CityReference>> {
        let base = Url::parse(state_index_url)?;
        let document = fetch_bounded(self.fetcher, state_index_url, self.page_timeout)
            .await
            .map_err(|e| AppError::index_unavailable(state_index_url, e))?;

        let root = document.root_element();
        let table = select_first(&root, &self.city_table).ok_or_else(|| {
            AppError::index_unavailable(state_index_url, "city table not found")
        })?;

        let cities: Vec<CityReference> = select_all(&table, &self.city_row)
            .iter()
            .filter_map(|row| {
                let link = select_first(row, &self.city_link)?;
                let href = link.value().attr("href")?;
                let name = element_text(&link);
                if name.is_empty() {
                    return None;
                }
                Some(CityReference {
                    name,
                    url: resolve_url(&base, href),
                })
            })
            .collect();

        log::info!("Found {} cities at {}", cities.len(), state_index_url);
        Ok(cities)
    }

    /// URL of the given 1-based index page of a city.
    pub fn page_url(&self, city_url: &str, page: u32) -> String {
        if page <= 1 {
            return city_url.to_string();
        }
        format!(
            "{}/{}",
            city_url.trim_end_matches('/'),
            self.page_suffix.replace("{page}", &page.to_string())
        )
    }

    /// Listing URLs of one index page, deduplicated within the page.
    ///
    /// Only URLs starting with `prefix` are kept when a prefix is given.
    pub async fn listing_urls(&self, page_url: &str, prefix: Option<&str>) -> Result<Vec<String>> {
        let base = Url::parse(page_url)?;
        let document = fetch_bounded(self.fetcher, page_url, self.page_timeout).await?;
        self.pages.fetch_add(1, Ordering::Relaxed);
        let root = document.root_element();

        let mut seen = HashSet::new();
        let urls = select_all(&root, &self.listing_card)
            .iter()
            .filter_map(|card| card.value().attr("href"))
            .filter_map(|href| canonical_url(&base, href))
            .filter(|url| prefix.is_none_or(|p| url.starts_with(p)))
            .filter(|url| seen.insert(url.clone()))
            .collect();

        Ok(urls)
    }

    /// Number of index pages loaded so far, across all cities.
    pub fn pages_fetched(&self) -> usize {
        self.pages.load(Ordering::Relaxed)
    }

    /// Lazily walk a city's index pages, yielding listing URLs.
    ///
    /// Starts at page 1 and requests `page-2`, `page-3`, ... until a page has
    /// no listing cards. A page that fails to load is yielded as an error and
    /// ends the sequence. Duplicates across pages are not filtered here.
    pub fn paginate_listings<'s>(
        &'s self,
        city_url: &'s str,
        prefix: Option<&'s str>,
    ) -> impl Stream<Item = Result<String>> + 's {
        let cursor = PageCursor {
            page: 1,
            pending: VecDeque::new(),
            finished: false,
        };

        stream::unfold(cursor, move |mut cursor| async move {
            loop {
                if let Some(url) = cursor.pending.pop_front() {
                    return Some((Ok(url), cursor));
                }
                if cursor.finished {
                    return None;
                }
                if self.max_pages.is_some_and(|max| cursor.page > max) {
                    log::info!("Reached page limit for {}", city_url);
                    return None;
                }

                let page_url = self.page_url(city_url, cursor.page);
                match self.listing_urls(&page_url, prefix).await {
                    Ok(urls) if urls.is_empty() => {
                        log::info!("No listings on page {} ({}), stopping", cursor.page, page_url);
                        return None;
                    }
                    Ok(urls) => {
                        log::info!(
                            "Found {} unique listing URLs on page {} ({})",
                            urls.len(),
                            cursor.page,
                            page_url
                        );
                        cursor.pending.extend(urls);
                        cursor.page += 1;
                    }
                    Err(e) => {
                        cursor.finished = true;
                        return Some((Err(e), cursor));
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::services::fetcher::testing::ScriptedFetcher;

    const STATE_URL: &str = "https://www.redfin.com/state/Washington";
    const CITY_URL: &str = "https://www.redfin.com/city/16163/WA/Seattle";

    const STATE_PAGE: &str = r#"
        <table class="filterableTable">
          <thead><tr><th>City</th></tr></thead>
          <tbody>
            <tr class="tl0"><td class="c0 Cities"><a href="/city/16163/WA/Seattle">Seattle</a></td></tr>
            <tr class="tl1"><td class="c0 Cities"><a href="/city/1387/WA/Bellevue">Bellevue</a></td></tr>
            <tr class="tl2"><td class="c0 Cities">No link</td></tr>
          </tbody>
        </table>
    "#;

    fn cards(ids: &[u32]) -> String {
        ids.iter()
            .map(|id| format!(r#"<a class="bp-Homecard" href="/WA/Seattle/{id}-Main-St/home/{id}">home</a>"#))
            .collect()
    }

    fn walker(fetcher: &ScriptedFetcher) -> IndexWalker<'_> {
        IndexWalker::new(fetcher, &IndexSelectors::default(), &CrawlerConfig::default()).unwrap()
    }

    async fn collect(walker: &IndexWalker<'_>, prefix: Option<&str>) -> Vec<Result<String>> {
        walker.paginate_listings(CITY_URL, prefix).collect().await
    }

    #[tokio::test]
    async fn test_discover_cities() {
        let fetcher = ScriptedFetcher::new().page(STATE_URL, STATE_PAGE);
        let cities = walker(&fetcher).discover_cities(STATE_URL).await.unwrap();

        assert_eq!(
            cities,
            vec![
                CityReference {
                    name: "Seattle".to_string(),
                    url: "https://www.redfin.com/city/16163/WA/Seattle".to_string(),
                },
                CityReference {
                    name: "Bellevue".to_string(),
                    url: "https://www.redfin.com/city/1387/WA/Bellevue".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_discover_cities_without_table() {
        let fetcher = ScriptedFetcher::new().page(STATE_URL, "<p>Access denied</p>");
        let result = walker(&fetcher).discover_cities(STATE_URL).await;
        assert!(matches!(result, Err(AppError::IndexUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_discover_cities_fetch_failure() {
        let fetcher = ScriptedFetcher::new();
        let result = walker(&fetcher).discover_cities(STATE_URL).await;
        assert!(matches!(result, Err(AppError::IndexUnavailable { .. })));
    }

    #[test]
    fn test_page_url() {
        let fetcher = ScriptedFetcher::new();
        let walker = walker(&fetcher);
        assert_eq!(walker.page_url(CITY_URL, 1), CITY_URL);
        assert_eq!(walker.page_url(CITY_URL, 3), format!("{CITY_URL}/page-3"));
        assert_eq!(
            walker.page_url(&format!("{CITY_URL}/"), 2),
            format!("{CITY_URL}/page-2")
        );
    }

    #[tokio::test]
    async fn test_pagination_stops_at_first_empty_page() {
        let fetcher = ScriptedFetcher::new()
            .page(CITY_URL, &cards(&[1, 2]))
            .page(&format!("{CITY_URL}/page-2"), &cards(&[3]))
            .page(&format!("{CITY_URL}/page-3"), "<div>No results</div>")
            .page(&format!("{CITY_URL}/page-4"), &cards(&[4]));

        let urls: Vec<String> = collect(&walker(&fetcher), None)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(
            urls,
            vec![
                "https://www.redfin.com/WA/Seattle/1-Main-St/home/1",
                "https://www.redfin.com/WA/Seattle/2-Main-St/home/2",
                "https://www.redfin.com/WA/Seattle/3-Main-St/home/3",
            ]
        );
        assert_eq!(
            fetcher.requested(),
            vec![
                CITY_URL.to_string(),
                format!("{CITY_URL}/page-2"),
                format!("{CITY_URL}/page-3"),
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicates_within_page_count_once() {
        let page = format!(
            "{}{}",
            cards(&[1, 1, 2]),
            r#"<a class="bp-Homecard" href="/WA/Seattle/1-Main-St/home/1?from=map">again</a>"#
        );
        let fetcher = ScriptedFetcher::new()
            .page(CITY_URL, &page)
            .page(&format!("{CITY_URL}/page-2"), &cards(&[2]))
            .page(&format!("{CITY_URL}/page-3"), "");

        let urls: Vec<String> = collect(&walker(&fetcher), None)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        // home/2 repeats on page 2; that is left to the store
        assert_eq!(
            urls,
            vec![
                "https://www.redfin.com/WA/Seattle/1-Main-St/home/1",
                "https://www.redfin.com/WA/Seattle/2-Main-St/home/2",
                "https://www.redfin.com/WA/Seattle/2-Main-St/home/2",
            ]
        );
    }

    #[tokio::test]
    async fn test_prefix_filters_foreign_cards() {
        let page = format!(
            "{}{}",
            cards(&[1]),
            r#"<a class="bp-Homecard" href="https://www.redfin.com/OR/Portland/9-Elm/home/9">x</a>"#
        );
        let fetcher = ScriptedFetcher::new().page(CITY_URL, &page);

        let results = collect(&walker(&fetcher), Some("https://www.redfin.com/WA/")).await;
        // page 2 is missing and ends the walk with an error
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].as_ref().unwrap(),
            "https://www.redfin.com/WA/Seattle/1-Main-St/home/1"
        );
        assert!(results[1].is_err());
    }

    #[tokio::test]
    async fn test_page_failure_yields_error_and_stops() {
        let fetcher = ScriptedFetcher::new().page(CITY_URL, &cards(&[1]));

        let results = collect(&walker(&fetcher), None).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(AppError::Fetch { .. })));
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_max_pages_caps_walk() {
        let fetcher = ScriptedFetcher::new()
            .page(CITY_URL, &cards(&[1]))
            .page(&format!("{CITY_URL}/page-2"), &cards(&[2]));
        let crawler = CrawlerConfig {
            max_pages: Some(1),
            ..CrawlerConfig::default()
        };
        let walker = IndexWalker::new(&fetcher, &IndexSelectors::default(), &crawler).unwrap();

        let results = collect(&walker, None).await;
        assert_eq!(results.len(), 1);
        assert_eq!(fetcher.requested(), vec![CITY_URL.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_page_times_out() {
        let fetcher = ScriptedFetcher::new()
            .page(CITY_URL, &cards(&[1]))
            .slow_page(
                &format!("{CITY_URL}/page-2"),
                &cards(&[2]),
                Duration::from_secs(60),
            );
        let walker = walker(&fetcher);

        let results = collect(&walker, None).await;
        assert_eq!(results.len(), 2);
        assert!(matches!(results[1], Err(AppError::FetchTimeout { .. })));
        assert_eq!(walker.pages_fetched(), 1);
    }
}
