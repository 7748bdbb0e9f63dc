//! Listing data structures.

use serde::{Deserialize, Serialize};

/// Column order of the persisted listing table.
pub const LISTING_COLUMNS: [&str; 14] = [
    "state",
    "city",
    "address",
    "price",
    "est_monthly_payment",
    "bedrooms",
    "bathrooms",
    "square_footage",
    "property_type",
    "year_built",
    "lot_size",
    "price_per_sqft",
    "parking",
    "url",
];

/// A discovered city: display name and first index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityReference {
    pub name: String,
    pub url: String,
}

/// A listing address, raw and split into components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    /// Address exactly as extracted
    pub raw: String,
    /// Street part, or the whole raw text when it could not be split
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl Address {
    /// Split a "street, city, ST zip" string.
    ///
    /// At least three ", "-separated segments are required; otherwise the
    /// whole string is kept as the street and the components stay empty.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let parts: Vec<&str> = raw.split(", ").collect();

        if parts.len() < 3 {
            return Self {
                raw: raw.to_string(),
                street: raw.to_string(),
                ..Self::default()
            };
        }

        let mut state_zip = parts[2].split_whitespace();
        let state = state_zip.next().unwrap_or_default().to_string();
        let postal_code = state_zip.collect::<Vec<_>>().join(" ");

        Self {
            raw: raw.to_string(),
            street: parts[0].trim().to_string(),
            city: parts[1].trim().to_string(),
            state,
            postal_code,
        }
    }
}

/// Raw field values as found on a listing page, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawListing {
    pub address: Option<String>,
    pub price: Option<String>,
    pub est_monthly_payment: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub square_footage: Option<String>,
    pub property_type: Option<String>,
    pub year_built: Option<String>,
    pub lot_size: Option<String>,
    pub price_per_sqft: Option<String>,
    /// Parking from the key-details table
    pub parking: Option<String>,
    /// Parking description collected from amenity sections
    pub parking_amenities: Option<String>,
    pub hoa_fee: Option<String>,
}

/// One scraped property, keyed by its canonical URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    pub url: String,
    /// Originating state name (from the crawl, not the address)
    pub state: String,
    /// Originating city name (from the crawl, not the address)
    pub city: String,
    pub address: Address,
    pub price: Option<String>,
    pub est_monthly_payment: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub square_footage: Option<String>,
    pub property_type: Option<String>,
    pub year_built: Option<String>,
    /// Square feet
    pub lot_size: Option<String>,
    pub price_per_sqft: Option<String>,
    pub parking: Option<String>,
    pub hoa_fee: Option<String>,
}

impl ListingRecord {
    /// Create an empty record for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: String::new(),
            city: String::new(),
            address: Address::default(),
            price: None,
            est_monthly_payment: None,
            bedrooms: None,
            bathrooms: None,
            square_footage: None,
            property_type: None,
            year_built: None,
            lot_size: None,
            price_per_sqft: None,
            parking: None,
            hoa_fee: None,
        }
    }
}

/// A listing as stored in the output table (one string per column).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRow {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub est_monthly_payment: String,
    #[serde(default)]
    pub bedrooms: String,
    #[serde(default)]
    pub bathrooms: String,
    #[serde(default)]
    pub square_footage: String,
    #[serde(default)]
    pub property_type: String,
    #[serde(default)]
    pub year_built: String,
    #[serde(default)]
    pub lot_size: String,
    #[serde(default)]
    pub price_per_sqft: String,
    #[serde(default)]
    pub parking: String,
    pub url: String,
}

impl From<&ListingRecord> for ListingRow {
    fn from(record: &ListingRecord) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            state: record.state.clone(),
            city: record.city.clone(),
            address: record.address.street.clone(),
            price: text(&record.price),
            est_monthly_payment: text(&record.est_monthly_payment),
            bedrooms: text(&record.bedrooms),
            bathrooms: text(&record.bathrooms),
            square_footage: text(&record.square_footage),
            property_type: text(&record.property_type),
            year_built: text(&record.year_built),
            lot_size: text(&record.lot_size),
            price_per_sqft: text(&record.price_per_sqft),
            parking: text(&record.parking),
            url: record.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_address() {
        let address = Address::parse("123 Main St, Seattle, WA 98118");
        assert_eq!(address.street, "123 Main St");
        assert_eq!(address.city, "Seattle");
        assert_eq!(address.state, "WA");
        assert_eq!(address.postal_code, "98118");
        assert_eq!(address.raw, "123 Main St, Seattle, WA 98118");
    }

    #[test]
    fn test_parse_address_without_commas() {
        let address = Address::parse("Unit 4B");
        assert_eq!(address.street, "Unit 4B");
        assert_eq!(address.city, "");
        assert_eq!(address.state, "");
        assert_eq!(address.postal_code, "");
    }

    #[test]
    fn test_parse_address_two_segments() {
        let address = Address::parse("123 Main St, Seattle");
        assert_eq!(address.street, "123 Main St, Seattle");
        assert!(address.city.is_empty());
    }

    #[test]
    fn test_parse_address_state_without_zip() {
        let address = Address::parse("9 Elm Rd, Jackson, MS");
        assert_eq!(address.state, "MS");
        assert_eq!(address.postal_code, "");
    }

    #[test]
    fn test_row_keeps_column_order_and_blanks() {
        let mut record = ListingRecord::new("https://www.redfin.com/WA/Seattle/home/1");
        record.state = "Washington".to_string();
        record.city = "Seattle".to_string();
        record.address = Address::parse("1 A St, Seattle, WA 98101");
        record.price = Some("500000".to_string());

        let row = ListingRow::from(&record);
        assert_eq!(row.address, "1 A St");
        assert_eq!(row.price, "500000");
        assert_eq!(row.bathrooms, "");

        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(Vec::new());
        writer.serialize(&row).unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let header = out.lines().next().unwrap();
        assert_eq!(header, LISTING_COLUMNS.join(","));
    }
}
