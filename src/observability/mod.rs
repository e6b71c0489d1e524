//! Simple metrics module for the reconciliation engine.
//!
//! Provides a straightforward API for recording metrics using standard
//! Prometheus naming conventions. Installing a recorder/exporter is the
//! embedding application's concern; the engine only emits.

use std::fmt;

/// Enum representing all metric names used in the engine.
/// This eliminates magic strings and provides compile-time safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Import pipeline metrics
    ImportBatchesProcessed,
    ImportRecordsProcessed,
    ImportRecordsAccepted,
    ImportRecordsSkipped,
    ImportRecordsRejected,
    ImportStoreFailures,
    ImportBatchDuration,

    // Duplicate detection metrics
    DedupeCandidatesFound,
    DedupeConfidenceScore,

    // Geocoding metrics
    GeocodeCacheHits,
    GeocodeLookups,
    GeocodeFailures,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ImportBatchesProcessed => "chronicler_import_batches_processed_total",
            MetricName::ImportRecordsProcessed => "chronicler_import_records_processed_total",
            MetricName::ImportRecordsAccepted => "chronicler_import_records_accepted_total",
            MetricName::ImportRecordsSkipped => "chronicler_import_records_skipped_total",
            MetricName::ImportRecordsRejected => "chronicler_import_records_rejected_total",
            MetricName::ImportStoreFailures => "chronicler_import_store_failures_total",
            MetricName::ImportBatchDuration => "chronicler_import_batch_duration_seconds",
            MetricName::DedupeCandidatesFound => "chronicler_dedupe_candidates_found_total",
            MetricName::DedupeConfidenceScore => "chronicler_dedupe_confidence_score",
            MetricName::GeocodeCacheHits => "chronicler_geocode_cache_hits_total",
            MetricName::GeocodeLookups => "chronicler_geocode_lookups_total",
            MetricName::GeocodeFailures => "chronicler_geocode_failures_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn emit_counter(name: MetricName, value: u64) {
    metrics::counter!(name.as_str()).increment(value);
}

pub fn emit_histogram(name: MetricName, value: f64) {
    metrics::histogram!(name.as_str()).record(value);
}
