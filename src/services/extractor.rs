// src/services/extractor.rs

//! Listing page field extraction.
//!
//! Each field is looked up on its own. A field whose element is missing is
//! simply `None`; it never prevents the other fields from being read.

use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};

use crate::error::Result;
use crate::models::{AmenityRule, DetailField, RawListing, SiteConfig};
use crate::utils::http::parse_selectors;
use crate::utils::{element_text, select_all, select_first};

/// Normalize a key-detail label: lowercase, trailing colon removed, spaces as underscores.
pub fn label_key(label: &str) -> String {
    label
        .trim()
        .trim_end_matches(':')
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Extracts raw listing fields from a parsed listing page.
pub struct FieldExtractor {
    address: Vec<Selector>,
    street_address: Vec<Selector>,
    city_state_zip: Vec<Selector>,
    price: Vec<Selector>,
    est_monthly_payment: Vec<Selector>,
    bedrooms: Vec<Selector>,
    bathrooms: Vec<Selector>,
    square_footage: Vec<Selector>,
    key_detail_row: Vec<Selector>,
    key_detail_label: Vec<Selector>,
    key_detail_value: Vec<Selector>,
    amenity_group: Vec<Selector>,
    amenity_title: Vec<Selector>,
    amenity_item: Vec<Selector>,
    /// label_key -> target field
    key_details: HashMap<String, DetailField>,
    amenities: Vec<AmenityRule>,
}

impl FieldExtractor {
    /// Compile the site's field selectors and label tables.
    pub fn new(site: &SiteConfig) -> Result<Self> {
        let fields = &site.fields;

        let mut key_details = HashMap::new();
        for rule in &site.key_details {
            key_details.entry(label_key(&rule.label)).or_insert(rule.field);
        }

        Ok(Self {
            address: parse_selectors(&fields.address)?,
            street_address: parse_selectors(&fields.street_address)?,
            city_state_zip: parse_selectors(&fields.city_state_zip)?,
            price: parse_selectors(&fields.price)?,
            est_monthly_payment: parse_selectors(&fields.est_monthly_payment)?,
            bedrooms: parse_selectors(&fields.bedrooms)?,
            bathrooms: parse_selectors(&fields.bathrooms)?,
            square_footage: parse_selectors(&fields.square_footage)?,
            key_detail_row: parse_selectors(&fields.key_detail_row)?,
            key_detail_label: parse_selectors(&fields.key_detail_label)?,
            key_detail_value: parse_selectors(&fields.key_detail_value)?,
            amenity_group: parse_selectors(&fields.amenity_group)?,
            amenity_title: parse_selectors(&fields.amenity_title)?,
            amenity_item: parse_selectors(&fields.amenity_item)?,
            key_details,
            amenities: site.amenities.clone(),
        })
    }

    /// Extract every known field from a listing document.
    pub fn extract(&self, document: &Html) -> RawListing {
        let root = document.root_element();

        let mut raw = RawListing {
            address: self.address(&root),
            price: text_of(&root, &self.price),
            est_monthly_payment: text_of(&root, &self.est_monthly_payment),
            bedrooms: text_of(&root, &self.bedrooms),
            bathrooms: text_of(&root, &self.bathrooms),
            square_footage: text_of(&root, &self.square_footage),
            ..RawListing::default()
        };

        for (label, value) in self.key_detail_rows(&root) {
            match self.key_details.get(&label) {
                Some(field) => {
                    detail_slot(&mut raw, *field).get_or_insert(value);
                }
                None => log::trace!("Ignoring key detail '{}'", label),
            }
        }

        let sections = self.amenity_sections(&root);
        for rule in &self.amenities {
            if let Some(text) = collect_amenity(rule, &sections) {
                let slot = match rule.field {
                    DetailField::Parking => &mut raw.parking_amenities,
                    field => detail_slot(&mut raw, field),
                };
                slot.get_or_insert(text);
            }
        }

        raw
    }

    /// Generic label/value pairs of the key details table, labels normalized.
    pub fn key_detail_rows(&self, root: &ElementRef) -> Vec<(String, String)> {
        select_all(root, &self.key_detail_row)
            .iter()
            .filter_map(|row| {
                let label = text_of(row, &self.key_detail_label)?;
                let value = text_of(row, &self.key_detail_value)?;
                Some((label_key(&label), value))
            })
            .collect()
    }

    /// Amenity line items grouped by section title.
    pub fn amenity_sections(&self, root: &ElementRef) -> HashMap<String, Vec<String>> {
        let mut sections: HashMap<String, Vec<String>> = HashMap::new();
        for group in select_all(root, &self.amenity_group) {
            let Some(title) = text_of(&group, &self.amenity_title) else {
                continue;
            };
            let items = select_all(&group, &self.amenity_item)
                .into_iter()
                .map(|item| element_text(&item))
                .filter(|item| !item.is_empty());
            sections.entry(title).or_default().extend(items);
        }
        sections
    }

    fn address(&self, root: &ElementRef) -> Option<String> {
        if let Some(full) = text_of(root, &self.address) {
            return Some(full);
        }

        let street = text_of(root, &self.street_address);
        let rest = text_of(root, &self.city_state_zip);
        match (street, rest) {
            (Some(street), Some(rest)) => Some(format!(
                "{}, {}",
                street.trim_end_matches(',').trim_end(),
                rest
            )),
            (street, rest) => street.or(rest),
        }
    }
}

/// Non-empty text of the first element matched by the fallback selectors.
fn text_of(scope: &ElementRef, selectors: &[Selector]) -> Option<String> {
    select_first(scope, selectors)
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
}

fn detail_slot(raw: &mut RawListing, field: DetailField) -> &mut Option<String> {
    match field {
        DetailField::PropertyType => &mut raw.property_type,
        DetailField::YearBuilt => &mut raw.year_built,
        DetailField::LotSize => &mut raw.lot_size,
        DetailField::PricePerSqft => &mut raw.price_per_sqft,
        DetailField::Parking => &mut raw.parking,
        DetailField::HoaFee => &mut raw.hoa_fee,
    }
}

/// Items of all sections named by `rule`, filtered by its terms and joined.
fn collect_amenity(rule: &AmenityRule, sections: &HashMap<String, Vec<String>>) -> Option<String> {
    let items: Vec<&str> = rule
        .sections
        .iter()
        .filter_map(|title| sections.get(title.trim()))
        .flatten()
        .filter(|item| rule.terms.is_empty() || rule.terms.iter().any(|t| item.contains(t.as_str())))
        .map(String::as_str)
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items.join(&rule.separator))
    }
}
