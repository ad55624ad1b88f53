pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod types;

pub use error::{BookError, Result, StorageError, ValidationError};
pub use types::{NormalizedItem, RawItem, StoredBook};
