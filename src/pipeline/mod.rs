// Item pipeline: ingestion, processing, and storage

pub mod ingestion;
pub mod pipeline;
pub mod processing;
pub mod storage;

// Re-export key types from each stage
pub use pipeline::{ItemOutcome, ItemPipeline, PipelineResult};
pub use processing::normalize::{normalize, BookNormalizer, Normalizer};
pub use storage::{BookStore, InMemoryBookStore, Outcome, SqliteBookStore, StoreState};
