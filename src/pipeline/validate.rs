// src/pipeline/validate.rs

//! Configuration check without touching the network.

use crate::error::Result;
use crate::models::Config;
use crate::services::FieldExtractor;
use crate::utils::http::parse_selectors;

/// Check the configuration values and compile every selector.
pub fn run_validate(config: &Config) -> Result<()> {
    config.validate()?;
    log::info!("Config OK");
    log::info!("  user agent: {}", config.crawler.user_agent);
    log::info!(
        "  timeouts: {}s per request, {}s per page",
        config.crawler.timeout_secs,
        config.crawler.page_timeout_secs
    );
    log::info!("  request delay: {}ms", config.crawler.request_delay_ms);
    for state in &config.states {
        log::info!("  state: {} ({})", state.name, state.url);
    }

    let index = &config.site.index;
    for list in [&index.city_table, &index.city_row, &index.city_link, &index.listing_card] {
        parse_selectors(list)?;
    }
    FieldExtractor::new(&config.site)?;
    log::info!(
        "Selectors OK ({} key-detail labels, {} amenity rules)",
        config.site.key_details.len(),
        config.site.amenities.len()
    );

    Ok(())
}
