//! Utility functions and helpers.

pub mod http;

use scraper::{ElementRef, Selector};
use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Canonical form of a listing link: absolute, without query or fragment.
///
/// Returns `None` for hrefs that cannot be resolved to an http(s) URL.
pub fn canonical_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-normalized text content of an element.
pub fn element_text(element: &ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// First descendant of `scope` matched by the first selector that matches anything.
pub fn select_first<'a>(scope: &ElementRef<'a>, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|sel| scope.select(sel).next())
}

/// All descendants of `scope` matched by the first selector that matches anything.
pub fn select_all<'a>(scope: &ElementRef<'a>, selectors: &[Selector]) -> Vec<ElementRef<'a>> {
    selectors
        .iter()
        .map(|sel| scope.select(sel).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}
