use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::traits::RecordStore;
use crate::common::error::{ReconcileError, Result};
use crate::domain::{ImportType, NormalizedEntity, RecordSnapshot};
use crate::pipeline::import::ImportBatch;

/// In-memory store implementation for development and testing.
pub struct InMemoryStore {
    entities: Arc<Mutex<HashMap<Uuid, NormalizedEntity>>>,
    batches: Arc<Mutex<Vec<ImportBatch>>>,
    /// When set, the next insert fails once. Lets tests exercise the
    /// per-record store-failure path.
    fail_next_insert: Arc<Mutex<bool>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entities: Arc::new(Mutex::new(HashMap::new())),
            batches: Arc::new(Mutex::new(Vec::new())),
            fail_next_insert: Arc::new(Mutex::new(false)),
        }
    }

    /// Pre-populate the store with existing entities (e.g. from a seed file).
    pub fn seed(&self, entities: Vec<NormalizedEntity>) {
        let mut store = self.entities.lock().unwrap();
        for entity in entities {
            store.insert(Uuid::new_v4(), entity);
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.lock().unwrap().len()
    }

    pub fn recorded_batches(&self) -> Vec<ImportBatch> {
        self.batches.lock().unwrap().clone()
    }

    pub fn fail_next_insert(&self) {
        *self.fail_next_insert.lock().unwrap() = true;
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn list_existing(&self, import_type: ImportType) -> Result<Vec<RecordSnapshot>> {
        let entities = self.entities.lock().unwrap();
        let mut snapshots: Vec<RecordSnapshot> = entities
            .iter()
            .filter(|(_, entity)| entity.import_type() == import_type)
            .map(|(id, entity)| entity.snapshot(*id))
            .collect();
        // HashMap iteration order is arbitrary; keep snapshots stable for
        // deterministic matching
        snapshots.sort_by_key(|s| s.id);
        Ok(snapshots)
    }

    async fn insert(&self, entity: NormalizedEntity) -> Result<Uuid> {
        let mut fail = self.fail_next_insert.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(ReconcileError::StoreWrite(
                "simulated store failure".to_string(),
            ));
        }
        drop(fail);

        let id = Uuid::new_v4();
        let mut entities = self.entities.lock().unwrap();
        entities.insert(id, entity);
        debug!("Inserted entity with id {}", id);
        Ok(id)
    }

    async fn record_import_batch(&self, batch: &ImportBatch) -> Result<()> {
        let mut batches = self.batches.lock().unwrap();
        batches.push(batch.clone());
        debug!("Recorded import batch {}", batch.batch_id);
        Ok(())
    }
}
