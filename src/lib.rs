//! Fuzzy data reconciliation engine for the Chronicler historical-records
//! suite: imprecise date interpretation, text normalization, similarity
//! scoring, duplicate detection and bulk-import orchestration.

pub mod common;
pub mod config;
pub mod domain;
pub mod infra;
pub mod logging;
pub mod observability;
pub mod pipeline;

pub use common::error::{ReconcileError, Result};
pub use config::ReconcilerConfig;
pub use domain::ImportType;
pub use pipeline::import::{ImportPipeline, ImportReport};
pub use pipeline::processing::dates::{DateInterpreter, DateUncertainty, FuzzyDate};
pub use pipeline::processing::dedupe::{DuplicateDetector, MatchCandidate};
pub use pipeline::processing::normalize::TextNormalizer;
pub use pipeline::processing::similarity::SimilarityScorer;
pub use pipeline::storage::{InMemoryStore, RecordStore};
