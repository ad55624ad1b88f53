/// Names shared between the normalizer, the store and the CLI.
pub const BOOK_TABLE: &str = "book";

pub const DEFAULT_DB_PATH: &str = "books.sqlite";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILE: &str = "book_scraper.log";
pub const DEFAULT_LOG_FILTER: &str = "book_scraper=info";

/// Environment variable overriding `[database] path`.
pub const DB_PATH_ENV: &str = "BOOKS_DB_PATH";

// Raw item field names as exported by the crawler
pub const FIELD_URL: &str = "url";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_PRODUCT_TYPE: &str = "product_type";
pub const FIELD_PRICE_EXCL_TAX: &str = "price_excl_tax";
pub const FIELD_PRICE_INCL_TAX: &str = "price_incl_tax";
pub const FIELD_TAX: &str = "tax";
pub const FIELD_AVAILABILITY: &str = "availability";
pub const FIELD_STARS: &str = "stars";
pub const FIELD_CATEGORY: &str = "category";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_PRICE: &str = "price";

/// Currency prefixes removed before parsing amounts. The mis-decoded
/// UTF-8 pound sign must come first so its trailing `£` is not left behind.
pub const CURRENCY_ARTIFACTS: &[&str] = &["Â£", "£"];
