// src/services/normalize.rs

//! Unit normalization for raw listing values.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Address, ListingRecord, RawListing};

/// Square feet per acre.
pub const SQFT_PER_ACRE: f64 = 43_560.0;

static ACRE_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)acres?\b").expect("acre pattern"));
static SQFT_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)sq\.?\s*f(?:ee)?t\.?").expect("sqft pattern"));
static PARKING_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:cars?|garage|spaces?)\b").expect("parking pattern")
});

/// Convert a lot size to whole square feet.
///
/// `"0.25 acres"` becomes `"10890"`, `"5,000 sq ft"` becomes `"5000"`. Text
/// that is not a number once separators and units are removed is returned
/// cleaned but otherwise unchanged.
pub fn normalize_lot_size(raw: &str) -> String {
    let in_acres = ACRE_UNIT.is_match(raw);
    let without_acres = ACRE_UNIT.replace_all(raw, "");
    let cleaned = SQFT_UNIT
        .replace_all(&without_acres, "")
        .replace(',', "")
        .trim()
        .to_string();

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            let sqft = if in_acres { value * SQFT_PER_ACRE } else { value };
            (sqft.trunc() as i64).to_string()
        }
        _ => cleaned,
    }
}

/// Strip currency symbols and thousands separators.
pub fn normalize_price(raw: &str) -> String {
    raw.replace(['$', ','], "").trim().to_string()
}

/// Reduce "Est. $2,345/mo" to "2345".
pub fn normalize_monthly_payment(raw: &str) -> String {
    normalize_price(&raw.replace("Est.", "").replace("/mo", ""))
}

/// Strip unit words from a parking value, leaving a count or description.
pub fn normalize_parking(raw: &str) -> String {
    let stripped = PARKING_UNIT.replace_all(raw, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip a trailing unit word ("3 ba", "2 beds") from a count.
pub fn normalize_count(raw: &str, units: &[&str]) -> String {
    let trimmed = raw.trim();
    for unit in units {
        if let Some(count) = trimmed.strip_suffix(unit) {
            // "3 ba" or "3ba", never the tail of a longer word
            if count.ends_with(|c: char| c.is_whitespace() || c.is_ascii_digit()) {
                return count.trim_end().to_string();
            }
        }
    }
    trimmed.to_string()
}

/// Strip thousands separators and a square-feet unit.
pub fn normalize_area(raw: &str) -> String {
    SQFT_UNIT.replace_all(raw, "").replace(',', "").trim().to_string()
}

/// Site placeholders for "no value".
fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.chars().all(|c| matches!(c, '—' | '–' | '-'))
}

fn clean(value: Option<String>, normalize: impl Fn(&str) -> String) -> Option<String> {
    value
        .filter(|v| !is_placeholder(v))
        .map(|v| normalize(&v))
        .filter(|v| !v.is_empty())
}

/// Turn raw page values into a normalized record for `url`.
///
/// Origin (state and city of the crawl) is attached by the caller.
pub fn normalize_listing(url: &str, raw: RawListing) -> ListingRecord {
    let mut record = ListingRecord::new(url);

    record.address = raw
        .address
        .filter(|a| !is_placeholder(a))
        .map(|a| Address::parse(&a))
        .unwrap_or_default();
    record.price = clean(raw.price, normalize_price);
    record.est_monthly_payment = clean(raw.est_monthly_payment, normalize_monthly_payment);
    record.bedrooms = clean(raw.bedrooms, |v| normalize_count(v, &["beds", "bed", "bd"]));
    record.bathrooms = clean(raw.bathrooms, |v| normalize_count(v, &["baths", "bath", "ba"]));
    record.square_footage = clean(raw.square_footage, normalize_area);
    record.property_type = clean(raw.property_type, |v| v.trim().to_string());
    record.year_built = clean(raw.year_built, |v| v.trim().to_string());
    record.lot_size = clean(raw.lot_size, normalize_lot_size);
    record.price_per_sqft = clean(raw.price_per_sqft, normalize_price);
    record.parking = clean(raw.parking, normalize_parking)
        .or_else(|| clean(raw.parking_amenities, |v| v.trim().to_string()));
    record.hoa_fee = clean(raw.hoa_fee, |v| v.trim().to_string());

    record
}
