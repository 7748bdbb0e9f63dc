//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::SiteConfig;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Where accepted listings are written
    #[serde(default)]
    pub output: OutputConfig,

    /// States to crawl, in order
    #[serde(default = "defaults::states")]
    pub states: Vec<StateTarget>,

    /// Selectors and label tables describing the site layout
    #[serde(default)]
    pub site: SiteConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    ///
    /// Selector syntax is checked separately when the extractor and walker are built.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.page_timeout_secs == 0 {
            return Err(AppError::validation("crawler.page_timeout_secs must be > 0"));
        }
        if self.crawler.max_pages == Some(0) {
            return Err(AppError::validation("crawler.max_pages must be > 0 when set"));
        }
        if self.output.file.trim().is_empty() {
            return Err(AppError::validation("output.file is empty"));
        }
        if self.states.is_empty() {
            return Err(AppError::validation("No states defined"));
        }
        for state in &self.states {
            if state.name.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "State with url {} has no name",
                    state.url
                )));
            }
            url::Url::parse(&state.url).map_err(|e| {
                AppError::validation(format!("State {} has invalid url: {}", state.name, e))
            })?;
        }
        if !self.site.index.page_suffix.contains("{page}") {
            return Err(AppError::validation(
                "site.index.page_suffix must contain {page}",
            ));
        }
        Ok(())
    }

    /// Keep only the state whose name matches (case-insensitive).
    pub fn retain_state(&mut self, name: &str) -> Result<()> {
        self.states.retain(|s| s.name.eq_ignore_ascii_case(name));
        if self.states.is_empty() {
            return Err(AppError::config(format!("State {name} is not configured")));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            output: OutputConfig::default(),
            states: defaults::states(),
            site: SiteConfig::default(),
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// HTTP client timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Upper bound for loading a single index or listing page
    #[serde(default = "defaults::page_timeout")]
    pub page_timeout_secs: u64,

    /// Delay before each request in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Optional cap on index pages per city
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            page_timeout_secs: defaults::page_timeout(),
            request_delay_ms: defaults::request_delay(),
            max_pages: None,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// CSV file name, relative to the storage directory
    #[serde(default = "defaults::output_file")]
    pub file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: defaults::output_file(),
        }
    }
}

/// A state whose city table seeds the crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTarget {
    /// Display name written to the `state` column (e.g., "Washington")
    pub name: String,

    /// URL of the state's city index page
    pub url: String,

    /// Only listing URLs starting with this prefix are kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing_url_prefix: Option<String>,
}

mod defaults {
    use super::StateTarget;

    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; listing-crawler/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn page_timeout() -> u64 {
        10
    }
    pub fn request_delay() -> u64 {
        1000
    }
    pub fn output_file() -> String {
        "house_listings.csv".into()
    }

    pub fn states() -> Vec<StateTarget> {
        vec![StateTarget {
            name: "Washington".to_string(),
            url: "https://www.redfin.com/state/Washington".to_string(),
            listing_url_prefix: Some("https://www.redfin.com/WA/".to_string()),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_max_pages() {
        let mut config = Config::default();
        config.crawler.max_pages = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_state_url() {
        let mut config = Config::default();
        config.states[0].url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            request_delay_ms = 0

            [[states]]
            name = "Mississippi"
            url = "https://www.redfin.com/state/Mississippi"
            "#,
        )
        .unwrap();

        assert_eq!(config.crawler.request_delay_ms, 0);
        assert_eq!(config.crawler.page_timeout_secs, 10);
        assert_eq!(config.states.len(), 1);
        assert_eq!(config.states[0].name, "Mississippi");
        assert!(config.states[0].listing_url_prefix.is_none());
        assert_eq!(config.output.file, "house_listings.csv");
        assert!(!config.site.key_details.is_empty());
    }

    #[test]
    fn retain_state_is_case_insensitive() {
        let mut config = Config::default();
        assert!(config.retain_state("washington").is_ok());
        assert_eq!(config.states.len(), 1);

        let mut config = Config::default();
        assert!(config.retain_state("Oregon").is_err());
    }

    #[test]
    fn sample_config_parses_and_validates() {
        let config: Config = toml::from_str(include_str!("../../data/config.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.states.len(), 2);
        assert_eq!(config.site.amenities[1].terms.len(), 3);

        // Both site layouts stay covered by the shipped tables
        let labels: Vec<&str> = config
            .site
            .key_details
            .iter()
            .map(|rule| rule.label.as_str())
            .collect();
        assert!(labels.contains(&"Price/Sq.Ft."));
        assert!(labels.contains(&"Price/Sq. Ft."));
        assert!(
            config
                .site
                .fields
                .bathrooms
                .iter()
                .any(|s| s.contains("statsLabel"))
        );
        assert_eq!(config.site.fields.bathrooms, SiteConfig::default().fields.bathrooms);
    }
}
