use thiserror::Error;

/// Reasons a raw item cannot be turned into a `NormalizedItem`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field '{field}' is not a valid amount: {value:?}")]
    InvalidPrice { field: &'static str, value: String },

    #[error("Availability count out of range: {0:?}")]
    InvalidAvailability(String),

    #[error("Unknown star rating: {0:?}")]
    UnknownRating(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blocking database task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Store schema has not been initialized")]
    NotInitialized,

    #[error("Store is closed")]
    Closed,
}

#[derive(Error, Debug)]
pub enum BookError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Feed line {line} is not a valid item: {source}")]
    Feed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BookError {
    /// Errors after which no further item can be persisted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BookError::Storage(StorageError::NotInitialized | StorageError::Closed)
        )
    }
}

pub type Result<T> = std::result::Result<T, BookError>;
