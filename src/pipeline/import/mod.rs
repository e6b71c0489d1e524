use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::common::error::{ReconcileError, Result};
use crate::config::ReconcilerConfig;
use crate::domain::{
    ImportType, NormalizedEntity, NormalizedEvent, NormalizedPerson, RawEventRecord,
    RawPersonRecord, RecordSnapshot,
};
use crate::infra::geocoding::Geocoder;
use crate::observability::{emit_counter, emit_histogram, MetricName};
use crate::pipeline::processing::dates::DateInterpreter;
use crate::pipeline::processing::dedupe::{CandidateRecord, DuplicateDetector, MatchCandidate};
use crate::pipeline::processing::normalize::TextNormalizer;
use crate::pipeline::storage::RecordStore;

/// Terminal status of a finalized batch. Partial is a first-class outcome,
/// not a failure bucket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Completed,
    Partial,
}

/// One record-level failure, positioned by input index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub index: usize,
    pub message: String,
}

/// Audit summary of one bulk-import invocation. Immutable once finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: Uuid,
    pub import_type: ImportType,
    pub total_records: usize,
    pub imported_count: usize,
    pub skipped_count: usize,
    pub error_count: usize,
    pub processing_time_ms: u64,
    pub status: BatchStatus,
    pub error_details: Vec<ErrorDetail>,
    pub created_at: DateTime<Utc>,
}

/// Terminal state of a single record. States are mutually exclusive; every
/// record lands in exactly one.
#[derive(Debug, Clone, Serialize)]
pub enum RecordOutcome {
    Accepted { id: Uuid },
    Duplicate { matched: MatchCandidate },
    Rejected { message: String },
    StoreFailed { message: String },
}

/// Per-record diagnostic, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct RecordDiagnostic {
    pub index: usize,
    pub outcome: RecordOutcome,
}

/// The externally visible result of one import run: the finalized batch
/// summary plus per-record outcomes for caller-side display.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub batch: ImportBatch,
    pub outcomes: Vec<RecordDiagnostic>,
}

impl ImportReport {
    /// The match that triggered each skip, for caller-side display.
    pub fn skipped_matches(&self) -> Vec<(usize, &MatchCandidate)> {
        self.outcomes
            .iter()
            .filter_map(|d| match &d.outcome {
                RecordOutcome::Duplicate { matched } => Some((d.index, matched)),
                _ => None,
            })
            .collect()
    }
}

// Validation failures ahead of the store: structural (missing/malformed
// field) or logical (start after end). Both reject the record, not the batch.
#[derive(Debug)]
enum ValidationFailure {
    Structural(String),
    Logical(String),
}

impl ValidationFailure {
    fn message(&self) -> String {
        match self {
            ValidationFailure::Structural(m) => format!("structural validation: {m}"),
            ValidationFailure::Logical(m) => format!("logical validation: {m}"),
        }
    }
}

/// Orchestrates one bulk import: envelope check, per-record validation,
/// normalization, duplicate detection against the existing snapshot plus
/// already-accepted records, store writes, and batch bookkeeping.
///
/// Records are processed strictly in input order so that the second
/// occurrence of the same person within one file is detected against the
/// first, not just against the pre-existing store.
pub struct ImportPipeline {
    store: Arc<dyn RecordStore>,
    geocoder: Option<Arc<dyn Geocoder>>,
    interpreter: DateInterpreter,
    detector: DuplicateDetector,
}

impl ImportPipeline {
    pub fn new(store: Arc<dyn RecordStore>, config: &ReconcilerConfig) -> Self {
        Self {
            store,
            geocoder: None,
            interpreter: DateInterpreter::new(),
            detector: DuplicateDetector::new(
                config.similarity.clone(),
                config.detector.clone(),
            ),
        }
    }

    /// Attach a geocoder for post-acceptance place enrichment. Lookup
    /// results never feed the duplicate decision.
    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub async fn run(&self, payload: &Value, import_type: ImportType) -> Result<ImportReport> {
        let started = Instant::now();
        let batch_id = Uuid::new_v4();

        // Only a malformed envelope is a hard failure; everything after this
        // point is captured per record.
        let records = payload
            .as_array()
            .ok_or_else(|| ReconcileError::MalformedBatch("payload is not an array".to_string()))?;
        if records.is_empty() {
            return Err(ReconcileError::MalformedBatch(
                "payload contains no records".to_string(),
            ));
        }

        info!(
            "Starting import batch {} ({}, {} records)",
            batch_id,
            import_type,
            records.len()
        );
        emit_counter(MetricName::ImportBatchesProcessed, 1);

        // Read-only snapshot for the duration of this batch; accepted records
        // are appended so later entries in the file see earlier ones.
        let mut snapshot = self.store.list_existing(import_type).await?;

        let mut outcomes = Vec::with_capacity(records.len());
        let mut error_details = Vec::new();
        let mut imported_count = 0;
        let mut skipped_count = 0;

        for (index, record) in records.iter().enumerate() {
            emit_counter(MetricName::ImportRecordsProcessed, 1);

            let outcome = match self.process_record(record, import_type, &snapshot).await {
                Processed::Accepted { id, entity } => {
                    imported_count += 1;
                    emit_counter(MetricName::ImportRecordsAccepted, 1);
                    debug!("Record {} accepted as {}", index, id);
                    // Grow the snapshot so later records in this batch see
                    // this one; this step is inherently sequential even if
                    // scoring were parallelized ahead of time.
                    snapshot.push(entity.snapshot(id));
                    RecordOutcome::Accepted { id }
                }
                Processed::Duplicate(matched) => {
                    skipped_count += 1;
                    emit_counter(MetricName::ImportRecordsSkipped, 1);
                    emit_histogram(MetricName::DedupeConfidenceScore, matched.confidence);
                    info!(
                        "Record {} skipped as duplicate of {} ({})",
                        index, matched.existing_id, matched.reason
                    );
                    RecordOutcome::Duplicate { matched }
                }
                Processed::Rejected(message) => {
                    emit_counter(MetricName::ImportRecordsRejected, 1);
                    error_details.push(ErrorDetail {
                        index,
                        message: message.clone(),
                    });
                    RecordOutcome::Rejected { message }
                }
                Processed::StoreFailed(message) => {
                    emit_counter(MetricName::ImportStoreFailures, 1);
                    error_details.push(ErrorDetail {
                        index,
                        message: message.clone(),
                    });
                    RecordOutcome::StoreFailed { message }
                }
            };

            outcomes.push(RecordDiagnostic { index, outcome });
        }

        let error_count = error_details.len();
        let status = if error_count == 0 {
            BatchStatus::Completed
        } else {
            BatchStatus::Partial
        };

        let batch = ImportBatch {
            batch_id,
            import_type,
            total_records: records.len(),
            imported_count,
            skipped_count,
            error_count,
            processing_time_ms: started.elapsed().as_millis() as u64,
            status,
            error_details,
            created_at: Utc::now(),
        };

        emit_histogram(
            MetricName::ImportBatchDuration,
            started.elapsed().as_secs_f64(),
        );

        // Audit write is best-effort: its failure must never fail the import
        // it is recording.
        if let Err(e) = self.store.record_import_batch(&batch).await {
            warn!("Failed to record import batch {}: {}", batch.batch_id, e);
        }

        info!(
            "Finished import batch {}: {} imported, {} skipped, {} errors",
            batch.batch_id, batch.imported_count, batch.skipped_count, batch.error_count
        );

        Ok(ImportReport { batch, outcomes })
    }

    async fn process_record(
        &self,
        record: &Value,
        import_type: ImportType,
        snapshot: &[RecordSnapshot],
    ) -> Processed {
        let prepared = match import_type {
            ImportType::Persons => self.prepare_person(record),
            ImportType::Events => self.prepare_event(record),
        };
        let (mut entity, candidate) = match prepared {
            Ok(prepared) => prepared,
            Err(failure) => return Processed::Rejected(failure.message()),
        };

        if let Some(matched) = self.detector.best_duplicate(&candidate, snapshot) {
            emit_counter(MetricName::DedupeCandidatesFound, 1);
            return Processed::Duplicate(matched);
        }

        // Enrichment runs strictly after the duplicate decision; lookup
        // results are never an input to it.
        if let Some(geocoder) = &self.geocoder {
            self.enrich_places(&mut entity, geocoder.as_ref()).await;
        }

        match self.store.insert(entity.clone()).await {
            Ok(id) => Processed::Accepted { id, entity },
            Err(e) => Processed::StoreFailed(e.to_string()),
        }
    }

    fn prepare_person(
        &self,
        record: &Value,
    ) -> std::result::Result<(NormalizedEntity, CandidateRecord), ValidationFailure> {
        let raw: RawPersonRecord = serde_json::from_value(record.clone())
            .map_err(|e| ValidationFailure::Structural(format!("invalid person record: {e}")))?;

        let first_name = clean(raw.first_name);
        let last_name = clean(raw.last_name);
        if first_name.is_none() && last_name.is_none() {
            return Err(ValidationFailure::Structural(
                "person requires at least one of first_name or last_name".to_string(),
            ));
        }

        let birth_date = clean(raw.birth_date).map(|d| self.interpreter.interpret(&d));
        let death_date = clean(raw.death_date).map(|d| self.interpreter.interpret(&d));
        if let (Some(birth), Some(death)) = (&birth_date, &death_date) {
            if birth.resolved_after(death) {
                return Err(ValidationFailure::Logical(format!(
                    "birth_date {:?} is after death_date {:?}",
                    birth.raw_text, death.raw_text
                )));
            }
        }

        let person = NormalizedPerson {
            first_name,
            last_name,
            birth_date,
            birth_place: clean(raw.birth_place).map(|p| TextNormalizer::normalize_place(&p)),
            death_date,
            death_place: clean(raw.death_place).map(|p| TextNormalizer::normalize_place(&p)),
            notes: clean(raw.notes),
        };

        let candidate = CandidateRecord {
            name: person.display_name(),
            date: person.birth_date.clone(),
            place: person.birth_place.as_ref().map(|p| p.original.clone()),
        };

        Ok((NormalizedEntity::Person(person), candidate))
    }

    fn prepare_event(
        &self,
        record: &Value,
    ) -> std::result::Result<(NormalizedEntity, CandidateRecord), ValidationFailure> {
        let raw: RawEventRecord = serde_json::from_value(record.clone())
            .map_err(|e| ValidationFailure::Structural(format!("invalid event record: {e}")))?;

        let title = clean(raw.title).ok_or_else(|| {
            ValidationFailure::Structural("event requires a non-empty title".to_string())
        })?;

        let date = clean(raw.date).map(|d| self.interpreter.interpret(&d));
        let end_date = clean(raw.end_date).map(|d| self.interpreter.interpret(&d));
        if let (Some(start), Some(end)) = (&date, &end_date) {
            if start.resolved_after(end) {
                return Err(ValidationFailure::Logical(format!(
                    "date {:?} is after end_date {:?}",
                    start.raw_text, end.raw_text
                )));
            }
        }

        let event = NormalizedEvent {
            title,
            description: clean(raw.description),
            date,
            end_date,
            location: clean(raw.location).map(|p| TextNormalizer::normalize_place(&p)),
        };

        let candidate = CandidateRecord {
            name: event.title.clone(),
            date: event.date.clone(),
            place: event.location.as_ref().map(|p| p.original.clone()),
        };

        Ok((NormalizedEntity::Event(event), candidate))
    }

    async fn enrich_places(&self, entity: &mut NormalizedEntity, geocoder: &dyn Geocoder) {
        match entity {
            NormalizedEntity::Person(person) => {
                if let Some(place) = person.birth_place.as_mut() {
                    enrich_place(place, geocoder).await;
                }
                if let Some(place) = person.death_place.as_mut() {
                    enrich_place(place, geocoder).await;
                }
            }
            NormalizedEntity::Event(event) => {
                if let Some(place) = event.location.as_mut() {
                    enrich_place(place, geocoder).await;
                }
            }
        }
    }
}

// Outcome of processing one record, carrying the accepted entity so the
// caller can extend the in-batch snapshot.
enum Processed {
    Accepted { id: Uuid, entity: NormalizedEntity },
    Duplicate(MatchCandidate),
    Rejected(String),
    StoreFailed(String),
}

async fn enrich_place(
    place: &mut crate::pipeline::processing::normalize::NormalizedPlace,
    geocoder: &dyn Geocoder,
) {
    if let Some(result) = geocoder.geocode(&place.original).await {
        result.apply_to(place);
    }
}

/// Treats missing, empty and whitespace-only optional fields uniformly as
/// absent.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
