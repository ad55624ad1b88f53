use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{BookError, Result};
use crate::metrics::PipelineMetrics;
use crate::pipeline::processing::normalize::{BookNormalizer, Normalizer};
use crate::pipeline::storage::{BookStore, Outcome};
use crate::types::RawItem;

/// What happened to a single item that made it through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemOutcome {
    Stored { book_id: i64 },
    Duplicate,
}

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub total_items: usize,
    pub inserted: usize,
    pub skipped: usize,
    /// Unreadable or invalid items
    pub rejected: usize,
    /// Items that normalized fine but could not be stored
    pub failed: usize,
    /// Set when the store became unusable and the run stopped early
    pub aborted: bool,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_secs: f64,
}

/// Normalizes raw items and hands them to the dedup store, one at a time.
pub struct ItemPipeline {
    normalizer: Arc<dyn Normalizer>,
    store: Arc<dyn BookStore>,
}

impl ItemPipeline {
    /// Prepare the store schema and build a pipeline around it.
    ///
    /// A failure here means nothing can be persisted, so it is returned
    /// rather than deferred to the first item.
    pub async fn open(store: Arc<dyn BookStore>) -> Result<Self> {
        store.ensure_schema().await?;
        Ok(Self::new(store))
    }

    /// Build a pipeline around a store whose schema is already in place.
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self {
            normalizer: Arc::new(BookNormalizer),
            store,
        }
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn Normalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn store(&self) -> &Arc<dyn BookStore> {
        &self.store
    }

    /// Normalize one raw item and store it unless its title is already known.
    pub async fn process_item(&self, raw: &RawItem) -> Result<ItemOutcome> {
        let item = self.normalizer.normalize(raw)?;
        match self.store.insert_if_absent(&item).await? {
            Outcome::Inserted { book_id } => Ok(ItemOutcome::Stored { book_id }),
            Outcome::Skipped => Ok(ItemOutcome::Duplicate),
        }
    }

    /// Run every item through the pipeline. Per-item failures are tallied and
    /// logged; only a store that can no longer accept writes stops the run.
    #[instrument(skip(self, items))]
    pub async fn run<I>(&self, items: I) -> PipelineResult
    where
        I: IntoIterator<Item = Result<RawItem>>,
    {
        let started_at = Utc::now();
        let timer = Instant::now();
        info!("Starting item pipeline");

        let mut result = PipelineResult {
            total_items: 0,
            inserted: 0,
            skipped: 0,
            rejected: 0,
            failed: 0,
            aborted: false,
            errors: Vec::new(),
            started_at,
            finished_at: started_at,
            duration_secs: 0.0,
        };

        for (index, item) in items.into_iter().enumerate() {
            result.total_items += 1;

            let outcome = match item {
                Ok(raw) => self.process_item(&raw).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(ItemOutcome::Stored { book_id }) => {
                    result.inserted += 1;
                    PipelineMetrics::record_inserted();
                    debug!(book_id, "Stored item {}", index);
                }
                Ok(ItemOutcome::Duplicate) => {
                    result.skipped += 1;
                    PipelineMetrics::record_skipped();
                    debug!("Item {} is a duplicate, skipped", index);
                }
                Err(e) if e.is_fatal() => {
                    error!("Store unusable, stopping run: {}", e);
                    result.failed += 1;
                    result.aborted = true;
                    result.errors.push(format!("item {index}: {e}"));
                    PipelineMetrics::record_storage_error();
                    break;
                }
                Err(e @ BookError::Storage(_)) => {
                    warn!("Failed to store item {}: {}", index, e);
                    result.failed += 1;
                    result.errors.push(format!("item {index}: {e}"));
                    PipelineMetrics::record_storage_error();
                }
                Err(e) => {
                    warn!("Rejected item {}: {}", index, e);
                    result.rejected += 1;
                    result.errors.push(format!("item {index}: {e}"));
                    PipelineMetrics::record_rejected();
                }
            }
        }

        result.finished_at = Utc::now();
        result.duration_secs = timer.elapsed().as_secs_f64();
        PipelineMetrics::record_run_duration(result.duration_secs);

        info!(
            total = result.total_items,
            inserted = result.inserted,
            skipped = result.skipped,
            rejected = result.rejected,
            failed = result.failed,
            "Item pipeline finished"
        );
        result
    }
}
