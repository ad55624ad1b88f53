//! Item pipeline metrics
//!
//! Counters are emitted through the `metrics` facade. Without an installed
//! recorder they are no-ops, so library users opt in by installing one.

pub const ITEMS_INSERTED: &str = "books_inserted_total";
pub const ITEMS_SKIPPED: &str = "books_skipped_total";
pub const ITEMS_REJECTED: &str = "books_rejected_total";
pub const STORAGE_ERRORS: &str = "books_storage_errors_total";
pub const RUN_DURATION: &str = "books_run_duration_seconds";

/// Metrics collection for the normalize + dedup pipeline
pub struct PipelineMetrics;

impl PipelineMetrics {
    pub fn record_inserted() {
        ::metrics::counter!(ITEMS_INSERTED).increment(1);
    }

    pub fn record_skipped() {
        ::metrics::counter!(ITEMS_SKIPPED).increment(1);
    }

    /// Item failed normalization or could not be read from the feed
    pub fn record_rejected() {
        ::metrics::counter!(ITEMS_REJECTED).increment(1);
    }

    pub fn record_storage_error() {
        ::metrics::counter!(STORAGE_ERRORS).increment(1);
    }

    pub fn record_run_duration(duration_secs: f64) {
        ::metrics::histogram!(RUN_DURATION).record(duration_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_names() {
        assert_eq!(ITEMS_INSERTED, "books_inserted_total");
        assert_eq!(ITEMS_SKIPPED, "books_skipped_total");
        assert_eq!(ITEMS_REJECTED, "books_rejected_total");
        assert_eq!(STORAGE_ERRORS, "books_storage_errors_total");
    }
}
