use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::*;
use crate::error::ValidationError;
use crate::types::{NormalizedItem, RawItem};

/// First parenthesized integer in an availability blurb, e.g. `In stock (19 available)`.
static STOCK_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d+)[^)]*\)").expect("stock count pattern is valid"));

/// Trait for turning a raw scraped listing into a typed item
pub trait Normalizer: Send + Sync {
    fn normalize(&self, raw: &RawItem) -> Result<NormalizedItem, ValidationError>;
}

/// Normalizer for books.toscrape.com style listings.
///
/// Stateless: one instance can be shared across threads and items.
#[derive(Debug, Default, Clone, Copy)]
pub struct BookNormalizer;

impl Normalizer for BookNormalizer {
    fn normalize(&self, raw: &RawItem) -> Result<NormalizedItem, ValidationError> {
        normalize(raw)
    }
}

/// Normalize a single raw item.
pub fn normalize(raw: &RawItem) -> Result<NormalizedItem, ValidationError> {
    let url = text(FIELD_URL, &raw.url)?;
    let title = text(FIELD_TITLE, &raw.title)?;
    let product_type = text(FIELD_PRODUCT_TYPE, &raw.product_type)?.to_lowercase();
    let category = text(FIELD_CATEGORY, &raw.category)?.to_lowercase();
    // Description keeps its surrounding whitespace verbatim
    let description = required(FIELD_DESCRIPTION, &raw.description)?.to_string();

    let price = parse_price(FIELD_PRICE, text(FIELD_PRICE, &raw.price)?)?;
    let price_excl_tax = parse_price(
        FIELD_PRICE_EXCL_TAX,
        text(FIELD_PRICE_EXCL_TAX, &raw.price_excl_tax)?,
    )?;
    let price_incl_tax = parse_price(
        FIELD_PRICE_INCL_TAX,
        text(FIELD_PRICE_INCL_TAX, &raw.price_incl_tax)?,
    )?;
    let tax = parse_price(FIELD_TAX, text(FIELD_TAX, &raw.tax)?)?;

    let availability = parse_availability(text(FIELD_AVAILABILITY, &raw.availability)?)?;
    let stars = parse_rating(text(FIELD_STARS, &raw.stars)?)?;

    Ok(NormalizedItem {
        url: url.to_string(),
        title: title.to_string(),
        product_type,
        price_excl_tax,
        price_incl_tax,
        tax,
        availability,
        stars,
        category,
        description,
        price,
    })
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str, ValidationError> {
    value.as_deref().ok_or(ValidationError::MissingField(field))
}

fn text<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str, ValidationError> {
    required(field, value).map(str::trim)
}

/// Parse a currency amount, dropping any pound-sign artifact first.
pub fn parse_price(field: &'static str, value: &str) -> Result<f64, ValidationError> {
    let stripped = CURRENCY_ARTIFACTS
        .iter()
        .fold(value.to_string(), |acc, artifact| acc.replace(artifact, ""));

    let invalid = || ValidationError::InvalidPrice {
        field,
        value: value.to_string(),
    };

    let amount: f64 = stripped.trim().parse().map_err(|_| invalid())?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(invalid());
    }
    // "-0.00" passes the sign check; store it as plain zero
    Ok(amount.abs())
}

/// Extract the stock count. No count in the text means nothing confirmed in stock.
pub fn parse_availability(value: &str) -> Result<u32, ValidationError> {
    match STOCK_COUNT.captures(value) {
        Some(caps) => caps[1]
            .parse()
            .map_err(|_| ValidationError::InvalidAvailability(value.to_string())),
        None => Ok(0),
    }
}

/// Map a rating word (`zero`..`five`, any case) to its number of stars.
pub fn parse_rating(value: &str) -> Result<u8, ValidationError> {
    match value.trim().to_lowercase().as_str() {
        "zero" => Ok(0),
        "one" => Ok(1),
        "two" => Ok(2),
        "three" => Ok(3),
        "four" => Ok(4),
        "five" => Ok(5),
        _ => Err(ValidationError::UnknownRating(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raw() -> RawItem {
        RawItem {
            url: Some("  https://books.toscrape.com/catalogue/a-light-in-the-attic_1000/index.html ".to_string()),
            title: Some(" A Light in the Attic\n".to_string()),
            product_type: Some("Books".to_string()),
            price_excl_tax: Some("Â£51.77".to_string()),
            price_incl_tax: Some("Â£51.77".to_string()),
            tax: Some("Â£0.00".to_string()),
            availability: Some("\n    In stock (22 available)\n".to_string()),
            stars: Some("Three".to_string()),
            category: Some("Poetry ".to_string()),
            description: Some("  It's hard to imagine a world without A Light in the Attic.  ".to_string()),
            price: Some("£51.77".to_string()),
        }
    }

    #[test]
    fn test_normalize_full_listing() {
        let item = normalize(&sample_raw()).unwrap();

        assert_eq!(
            item.url,
            "https://books.toscrape.com/catalogue/a-light-in-the-attic_1000/index.html"
        );
        assert_eq!(item.title, "A Light in the Attic");
        assert_eq!(item.product_type, "books");
        assert_eq!(item.category, "poetry");
        assert_eq!(item.price, 51.77);
        assert_eq!(item.price_excl_tax, 51.77);
        assert_eq!(item.price_incl_tax, 51.77);
        assert_eq!(item.tax, 0.0);
        assert_eq!(item.availability, 22);
        assert_eq!(item.stars, 3);
    }

    #[test]
    fn test_description_is_not_trimmed() {
        let item = normalize(&sample_raw()).unwrap();
        assert_eq!(
            item.description,
            "  It's hard to imagine a world without A Light in the Attic.  "
        );
    }

    #[test]
    fn test_category_lowercased_after_trim() {
        let mut raw = sample_raw();
        raw.category = Some("FICTION ".to_string());
        assert_eq!(normalize(&raw).unwrap().category, "fiction");
    }

    #[test]
    fn test_parse_price_strips_currency_artifacts() {
        assert_eq!(parse_price(FIELD_PRICE, "£51.77").unwrap(), 51.77);
        assert_eq!(parse_price(FIELD_PRICE, "Â£51.77").unwrap(), 51.77);
        assert_eq!(parse_price(FIELD_PRICE, "13.99").unwrap(), 13.99);
    }

    #[test]
    fn test_parse_price_rejects_garbage() {
        let err = parse_price(FIELD_TAX, "Â£free").unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidPrice {
                field: FIELD_TAX,
                value: "Â£free".to_string()
            }
        );
        assert!(parse_price(FIELD_PRICE, "£-3.00").is_err());
        assert!(parse_price(FIELD_PRICE, "NaN").is_err());
        assert!(parse_price(FIELD_PRICE, "").is_err());
    }

    #[test]
    fn test_parse_price_negative_zero_is_zero() {
        let tax = parse_price(FIELD_TAX, "Â£-0.00").unwrap();
        assert_eq!(tax, 0.0);
        assert!(tax.is_sign_positive());
    }

    #[test]
    fn test_parse_availability() {
        assert_eq!(parse_availability("In stock (22 available)").unwrap(), 22);
        assert_eq!(parse_availability("In stock (1 available)").unwrap(), 1);
        assert_eq!(parse_availability("Out of stock").unwrap(), 0);
        assert_eq!(parse_availability("In stock").unwrap(), 0);
        // First count wins
        assert_eq!(parse_availability("In stock (3 available) (9 on order)").unwrap(), 3);
    }

    #[test]
    fn test_parse_availability_overflow() {
        assert!(matches!(
            parse_availability("In stock (99999999999 available)"),
            Err(ValidationError::InvalidAvailability(_))
        ));
    }

    #[test]
    fn test_parse_rating_words() {
        let words = ["zero", "One", "TWO", "three", "fOuR", "Five"];
        for (expected, word) in words.iter().enumerate() {
            assert_eq!(parse_rating(word).unwrap() as usize, expected);
        }
    }

    #[test]
    fn test_unknown_rating_is_rejected() {
        assert_eq!(
            parse_rating("six"),
            Err(ValidationError::UnknownRating("six".to_string()))
        );
        assert!(parse_rating("").is_err());
        assert!(parse_rating("3").is_err());
    }

    #[test]
    fn test_missing_field_is_reported() {
        let mut raw = sample_raw();
        raw.stars = None;
        assert_eq!(
            normalize(&raw),
            Err(ValidationError::MissingField(FIELD_STARS))
        );
    }

    #[test]
    fn test_normalizer_trait_matches_free_function() {
        let raw = sample_raw();
        assert_eq!(BookNormalizer.normalize(&raw), normalize(&raw));
    }
}
