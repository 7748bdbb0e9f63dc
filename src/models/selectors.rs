// src/models/selectors.rs

//! Site layout description: CSS selectors and label tables.
//!
//! Every selector field is an ordered list of candidates. The first candidate
//! that matches wins, which lets a layout change degrade to the next known
//! layout instead of an empty field.

use serde::{Deserialize, Serialize};

/// Selectors and label-matching tables for the listing site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// State and city index pages
    #[serde(default)]
    pub index: IndexSelectors,

    /// Listing page fields
    #[serde(default)]
    pub fields: FieldSelectors,

    /// Key-detail label to record field mapping
    #[serde(default = "defaults::key_details")]
    pub key_details: Vec<KeyDetailRule>,

    /// Amenity section to record field mapping
    #[serde(default = "defaults::amenities")]
    pub amenities: Vec<AmenityRule>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            index: IndexSelectors::default(),
            fields: FieldSelectors::default(),
            key_details: defaults::key_details(),
            amenities: defaults::amenities(),
        }
    }
}

/// Selectors for the state city table and the per-city listing index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSelectors {
    /// The table holding one row per city
    #[serde(default = "defaults::city_table")]
    pub city_table: Vec<String>,

    /// City rows, relative to the table
    #[serde(default = "defaults::city_row")]
    pub city_row: Vec<String>,

    /// The anchor carrying the city name and index URL, relative to a row
    #[serde(default = "defaults::city_link")]
    pub city_link: Vec<String>,

    /// Listing cards on a city index page (anchors with `href`)
    #[serde(default = "defaults::listing_card")]
    pub listing_card: Vec<String>,

    /// Path appended to the city URL for pages after the first
    #[serde(default = "defaults::page_suffix")]
    pub page_suffix: String,
}

impl Default for IndexSelectors {
    fn default() -> Self {
        Self {
            city_table: defaults::city_table(),
            city_row: defaults::city_row(),
            city_link: defaults::city_link(),
            listing_card: defaults::listing_card(),
            page_suffix: defaults::page_suffix(),
        }
    }
}

/// Selectors for the fields of a single listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSelectors {
    /// Combined "street, city, state zip" element
    #[serde(default = "defaults::address")]
    pub address: Vec<String>,

    /// Street-only element, used when no combined address exists
    #[serde(default = "defaults::street_address")]
    pub street_address: Vec<String>,

    /// "city, state zip" element paired with `street_address`
    #[serde(default = "defaults::city_state_zip")]
    pub city_state_zip: Vec<String>,

    #[serde(default = "defaults::price")]
    pub price: Vec<String>,

    #[serde(default = "defaults::monthly_payment")]
    pub est_monthly_payment: Vec<String>,

    #[serde(default = "defaults::bedrooms")]
    pub bedrooms: Vec<String>,

    #[serde(default = "defaults::bathrooms")]
    pub bathrooms: Vec<String>,

    #[serde(default = "defaults::square_footage")]
    pub square_footage: Vec<String>,

    /// One label/value row of the key details table
    #[serde(default = "defaults::key_detail_row")]
    pub key_detail_row: Vec<String>,

    #[serde(default = "defaults::key_detail_label")]
    pub key_detail_label: Vec<String>,

    #[serde(default = "defaults::key_detail_value")]
    pub key_detail_value: Vec<String>,

    /// One titled amenity group
    #[serde(default = "defaults::amenity_group")]
    pub amenity_group: Vec<String>,

    #[serde(default = "defaults::amenity_title")]
    pub amenity_title: Vec<String>,

    #[serde(default = "defaults::amenity_item")]
    pub amenity_item: Vec<String>,
}

impl Default for FieldSelectors {
    fn default() -> Self {
        Self {
            address: defaults::address(),
            street_address: defaults::street_address(),
            city_state_zip: defaults::city_state_zip(),
            price: defaults::price(),
            est_monthly_payment: defaults::monthly_payment(),
            bedrooms: defaults::bedrooms(),
            bathrooms: defaults::bathrooms(),
            square_footage: defaults::square_footage(),
            key_detail_row: defaults::key_detail_row(),
            key_detail_label: defaults::key_detail_label(),
            key_detail_value: defaults::key_detail_value(),
            amenity_group: defaults::amenity_group(),
            amenity_title: defaults::amenity_title(),
            amenity_item: defaults::amenity_item(),
        }
    }
}

/// Record fields that are filled from labeled rows or amenity sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailField {
    PropertyType,
    YearBuilt,
    LotSize,
    PricePerSqft,
    Parking,
    HoaFee,
}

/// Maps a key-detail label (e.g., "Year Built") onto a record field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyDetailRule {
    /// Label as shown on the page; compared after label normalization
    pub label: String,

    pub field: DetailField,
}

/// Collects line items from titled amenity sections into a record field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmenityRule {
    /// Section titles that qualify (exact match after trimming)
    pub sections: Vec<String>,

    pub field: DetailField,

    /// Keep only items containing one of these substrings; empty keeps all
    #[serde(default)]
    pub terms: Vec<String>,

    /// Joins items collected across all qualifying sections
    #[serde(default = "defaults::separator")]
    pub separator: String,
}

mod defaults {
    use super::{AmenityRule, DetailField, KeyDetailRule};

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // Index pages
    pub fn city_table() -> Vec<String> {
        list(&["table.filterableTable"])
    }
    pub fn city_row() -> Vec<String> {
        list(&["tbody tr", "tr[class^='tl']", "tr"])
    }
    pub fn city_link() -> Vec<String> {
        list(&["td.c0 a", ".Cities a", "td a"])
    }
    pub fn listing_card() -> Vec<String> {
        list(&["a.bp-Homecard", ".bp-Homecard a"])
    }
    pub fn page_suffix() -> String {
        "page-{page}".into()
    }

    // Listing pages
    pub fn address() -> Vec<String> {
        list(&[".bp-homeAddress", "[data-rf-test-id='abp-homeinfo-homeaddress']"])
    }
    pub fn street_address() -> Vec<String> {
        list(&[".street-address"])
    }
    pub fn city_state_zip() -> Vec<String> {
        list(&[".bp-cityStateZip"])
    }
    pub fn price() -> Vec<String> {
        list(&[
            "[data-rf-test-id='abp-price'] .statsValue",
            ".statsValue.price",
        ])
    }
    pub fn monthly_payment() -> Vec<String> {
        list(&[".monthly-payment", ".est-monthly-payment"])
    }
    pub fn bedrooms() -> Vec<String> {
        list(&[
            "[data-rf-test-id='abp-beds'] .statsValue",
            ".stat-block.beds-section .statsValue",
        ])
    }
    pub fn bathrooms() -> Vec<String> {
        list(&[
            ".stat-block.baths-section .bath-flyout",
            "[data-rf-test-id='abp-baths'] .statsValue",
            ".stat-block.baths-section .statsValue",
            ".stat-block.baths-section .statsLabel",
        ])
    }
    pub fn square_footage() -> Vec<String> {
        list(&[
            "[data-rf-test-id='abp-sqFt'] .statsValue",
            ".stat-block.sqft-section .statsValue",
        ])
    }
    pub fn key_detail_row() -> Vec<String> {
        list(&[".keyDetails-row"])
    }
    pub fn key_detail_label() -> Vec<String> {
        list(&[".valueType"])
    }
    pub fn key_detail_value() -> Vec<String> {
        list(&[".valueText"])
    }
    pub fn amenity_group() -> Vec<String> {
        list(&[".amenity-group"])
    }
    pub fn amenity_title() -> Vec<String> {
        list(&[".title"])
    }
    pub fn amenity_item() -> Vec<String> {
        list(&["li"])
    }

    pub fn separator() -> String {
        " ".into()
    }

    pub fn key_details() -> Vec<KeyDetailRule> {
        [
            ("Property Type", DetailField::PropertyType),
            ("Year Built", DetailField::YearBuilt),
            ("Lot Size", DetailField::LotSize),
            ("Price/Sq.Ft.", DetailField::PricePerSqft),
            ("Price/Sq. Ft.", DetailField::PricePerSqft),
            ("Parking", DetailField::Parking),
            ("HOA Dues", DetailField::HoaFee),
        ]
        .into_iter()
        .map(|(label, field)| KeyDetailRule {
            label: label.to_string(),
            field,
        })
        .collect()
    }

    pub fn amenities() -> Vec<AmenityRule> {
        vec![
            AmenityRule {
                sections: list(&["Parking Information"]),
                field: DetailField::Parking,
                terms: Vec::new(),
                separator: ", ".into(),
            },
            AmenityRule {
                sections: list(&[
                    "HOA / Condo / Coop",
                    "Community Information",
                    "Association Fee Information",
                    "Association Information",
                ]),
                field: DetailField::HoaFee,
                terms: list(&["HOA Fee", "Dues", "Association Fee"]),
                separator: separator(),
            },
        ]
    }
}
