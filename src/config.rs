use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::error::{ReconcileError, Result};

/// Similarity thresholds consumed by duplicate detection.
///
/// The default values (0.8 strong, 0.7 supporting) are heuristic and have not
/// been validated against labeled data; they are surfaced here so callers can
/// tune them instead of patching constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Minimum score for a name/title match to count on its own
    pub strong_match: f64,
    /// Minimum score for a place match used to corroborate a date signal
    pub supporting_match: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            strong_match: 0.8,
            supporting_match: 0.7,
        }
    }
}

/// Configuration for the duplicate detector and the import pipeline's
/// skip decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Candidates scoring below this floor are dropped entirely
    pub confidence_floor: f64,
    /// Candidates at or above this threshold cause the record to be skipped.
    /// Defaults to the floor, so any surviving candidate is treated as a
    /// duplicate.
    pub skip_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_floor: 0.7,
            skip_threshold: 0.7,
        }
    }
}

/// Configuration for the optional geocoding enrichment step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Whether accepted records get their places enriched at all
    pub enabled: bool,
    /// Base URL of the lookup service
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Minimum spacing between two lookups in milliseconds
    pub min_interval_ms: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://nominatim.openstreetmap.org/search".to_string(),
            timeout_secs: 10,
            min_interval_ms: 1000,
        }
    }
}

/// Top-level engine configuration, loadable from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    pub similarity: SimilarityConfig,
    pub detector: DetectorConfig,
    pub geocoding: GeocodingConfig,
}

impl ReconcilerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| ReconcileError::Config(e.to_string()))
    }
}
