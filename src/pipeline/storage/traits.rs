use async_trait::async_trait;
use uuid::Uuid;

use crate::common::error::Result;
use crate::domain::{ImportType, NormalizedEntity, RecordSnapshot};
use crate::pipeline::import::ImportBatch;

/// Port to the entity store holding persons and events.
///
/// The engine treats the store purely as a read source (the existing-record
/// snapshot) and a write sink (accepted records plus the batch audit row);
/// schema and transaction semantics live behind this trait.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Snapshot of the existing records duplicate detection compares against.
    /// Read once per batch and treated as immutable for the batch's duration.
    async fn list_existing(&self, import_type: ImportType) -> Result<Vec<RecordSnapshot>>;

    /// Persist an accepted record, returning its new identifier.
    async fn insert(&self, entity: NormalizedEntity) -> Result<Uuid>;

    /// Persist the finalized batch summary as an audit record. Callers treat
    /// failures here as non-fatal to the import being recorded.
    async fn record_import_batch(&self, batch: &ImportBatch) -> Result<()>;
}
