use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::*;

/// One scraped listing exactly as the crawler exported it.
///
/// Every field is optional here; presence is checked by the normalizer so a
/// missing field is reported per item instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawItem {
    pub url: Option<String>,
    pub title: Option<String>,
    pub product_type: Option<String>,
    pub price_excl_tax: Option<String>,
    pub price_incl_tax: Option<String>,
    pub tax: Option<String>,
    pub availability: Option<String>,
    pub stars: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
}

impl RawItem {
    /// Build a raw item from a field name -> value mapping. Unknown keys are ignored.
    pub fn from_map(mut fields: HashMap<String, String>) -> Self {
        let mut take = |name: &str| fields.remove(name);
        Self {
            url: take(FIELD_URL),
            title: take(FIELD_TITLE),
            product_type: take(FIELD_PRODUCT_TYPE),
            price_excl_tax: take(FIELD_PRICE_EXCL_TAX),
            price_incl_tax: take(FIELD_PRICE_INCL_TAX),
            tax: take(FIELD_TAX),
            availability: take(FIELD_AVAILABILITY),
            stars: take(FIELD_STARS),
            category: take(FIELD_CATEGORY),
            description: take(FIELD_DESCRIPTION),
            price: take(FIELD_PRICE),
        }
    }
}

/// A fully typed listing ready for storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub url: String,
    pub title: String,
    pub product_type: String,
    pub price_excl_tax: f64,
    pub price_incl_tax: f64,
    pub tax: f64,
    pub availability: u32,
    pub stars: u8,
    pub category: String,
    pub description: String,
    pub price: f64,
}

/// A row of the `book` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBook {
    pub book_id: i64,
    #[serde(flatten)]
    pub item: NormalizedItem,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_map_picks_known_fields() {
        let fields = HashMap::from([
            ("title".to_string(), "Olio".to_string()),
            ("stars".to_string(), "Four".to_string()),
            ("upc".to_string(), "a22124811bfa8350".to_string()),
        ]);
        let raw = RawItem::from_map(fields);
        assert_eq!(raw.title.as_deref(), Some("Olio"));
        assert_eq!(raw.stars.as_deref(), Some("Four"));
        assert_eq!(raw.price, None);
    }
}
