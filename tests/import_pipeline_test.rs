use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use chronicler::config::ReconcilerConfig;
use chronicler::domain::ImportType;
use chronicler::pipeline::import::{BatchStatus, ImportPipeline, RecordOutcome};
use chronicler::pipeline::processing::dedupe::MatchField;
use chronicler::pipeline::storage::InMemoryStore;
use chronicler::ReconcileError;

fn pipeline_with_store() -> (ImportPipeline, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let pipeline = ImportPipeline::new(store.clone(), &ReconcilerConfig::default());
    (pipeline, store)
}

#[tokio::test]
async fn clean_batch_imports_every_record() -> Result<()> {
    let (pipeline, store) = pipeline_with_store();
    let batch = json!([
        {"first_name": "Clemens", "last_name": "von Metternich", "birth_date": "1773-05-15", "birth_place": "Koblenz"},
        {"first_name": "Wilhelmine", "last_name": "von Sagan", "birth_date": "1781-02-08", "birth_place": "Mitau"},
    ]);

    let report = pipeline.run(&batch, ImportType::Persons).await?;

    assert_eq!(report.batch.total_records, 2);
    assert_eq!(report.batch.imported_count, 2);
    assert_eq!(report.batch.skipped_count, 0);
    assert_eq!(report.batch.error_count, 0);
    assert_eq!(report.batch.status, BatchStatus::Completed);
    assert_eq!(store.entity_count(), 2);
    Ok(())
}

#[tokio::test]
async fn same_person_twice_in_one_batch_is_caught_in_input_order() -> Result<()> {
    let (pipeline, store) = pipeline_with_store();
    let batch = json!([
        {"first_name": "Max", "last_name": "Mustermann", "birth_date": "1900-01-01"},
        {"first_name": "Max", "last_name": "Mustermann", "birth_date": "1900-01-01"},
    ]);

    let report = pipeline.run(&batch, ImportType::Persons).await?;

    assert_eq!(report.batch.imported_count, 1);
    assert_eq!(report.batch.skipped_count, 1);
    assert!(matches!(
        report.outcomes[0].outcome,
        RecordOutcome::Accepted { .. }
    ));
    assert!(matches!(
        report.outcomes[1].outcome,
        RecordOutcome::Duplicate { .. }
    ));
    assert_eq!(store.entity_count(), 1);
    Ok(())
}

#[tokio::test]
async fn duplicate_against_preexisting_store_reports_the_match() -> Result<()> {
    let (pipeline, _store) = pipeline_with_store();

    // First import seeds the store
    let seed = json!([
        {"first_name": "Max", "last_name": "Mustermann", "birth_date": "1900-01-01", "birth_place": "Wien"},
    ]);
    pipeline.run(&seed, ImportType::Persons).await?;

    // Identical name, birth day off by one: the name path alone must fire
    let batch = json!([
        {"first_name": "Max", "last_name": "Mustermann", "birth_date": "1900-01-02", "birth_place": "Wien"},
    ]);
    let report = pipeline.run(&batch, ImportType::Persons).await?;

    assert_eq!(report.batch.skipped_count, 1);
    let skipped = report.skipped_matches();
    assert_eq!(skipped.len(), 1);
    let matched = skipped[0].1;
    assert!(matched.matched_fields.contains(&MatchField::Name));
    assert!(matched.confidence >= 0.8);
    Ok(())
}

#[tokio::test]
async fn rejected_record_makes_the_batch_partial_but_not_failed() -> Result<()> {
    let (pipeline, store) = pipeline_with_store();
    let batch = json!([
        {"first_name": "Anna", "last_name": "Schmidt", "birth_date": "1850"},
        {"birth_date": "1850"},
        {"last_name": "Huber", "birth_date": "1900-01-01", "death_date": "1890-01-01"},
    ]);

    let report = pipeline.run(&batch, ImportType::Persons).await?;

    assert_eq!(report.batch.imported_count, 1);
    assert_eq!(report.batch.error_count, 2);
    assert_eq!(report.batch.status, BatchStatus::Partial);
    assert_eq!(report.batch.error_details[0].index, 1);
    assert_eq!(report.batch.error_details[1].index, 2);
    assert!(report.batch.error_details[1].message.contains("logical"));
    assert_eq!(store.entity_count(), 1);
    Ok(())
}

#[tokio::test]
async fn store_failure_is_a_record_error_and_the_batch_continues() -> Result<()> {
    let (pipeline, store) = pipeline_with_store();
    store.fail_next_insert();

    let batch = json!([
        {"last_name": "Erste"},
        {"last_name": "Zweite"},
    ]);
    let report = pipeline.run(&batch, ImportType::Persons).await?;

    assert_eq!(report.batch.imported_count, 1);
    assert_eq!(report.batch.error_count, 1);
    assert_eq!(report.batch.status, BatchStatus::Partial);
    assert!(matches!(
        report.outcomes[0].outcome,
        RecordOutcome::StoreFailed { .. }
    ));
    assert_eq!(store.entity_count(), 1);
    Ok(())
}

#[tokio::test]
async fn counts_never_exceed_total() -> Result<()> {
    let (pipeline, _store) = pipeline_with_store();
    let batch = json!([
        {"last_name": "Mustermann", "birth_date": "1900-01-01"},
        {"last_name": "Mustermann", "birth_date": "1900-01-01"},
        {"notes": "no name at all"},
        {"last_name": "Andere"},
    ]);

    let report = pipeline.run(&batch, ImportType::Persons).await?;
    let batch = &report.batch;
    assert!(batch.imported_count + batch.skipped_count + batch.error_count <= batch.total_records);
    assert_eq!(
        batch.imported_count + batch.skipped_count + batch.error_count,
        batch.total_records
    );
    Ok(())
}

#[tokio::test]
async fn event_batches_deduplicate_on_date_and_location() -> Result<()> {
    let (pipeline, _store) = pipeline_with_store();
    let batch = json!([
        {"title": "Opening Ball", "date": "1814-10-02", "location": "Vienna"},
        {"title": "Grand Opening Ball", "date": "1814-10-02", "location": "Vienna"},
        {"title": "Closing Ceremony", "date": "1815-06-09", "location": "Vienna"},
    ]);

    let report = pipeline.run(&batch, ImportType::Events).await?;

    assert_eq!(report.batch.imported_count, 2);
    assert_eq!(report.batch.skipped_count, 1);
    let skipped = report.skipped_matches();
    let matched = skipped[0].1;
    assert!(matched.matched_fields.contains(&MatchField::Date));
    assert!(matched.matched_fields.contains(&MatchField::Place));
    Ok(())
}

#[tokio::test]
async fn persons_and_events_do_not_cross_match() -> Result<()> {
    let (pipeline, store) = pipeline_with_store();

    let persons = json!([
        {"first_name": "Johann", "last_name": "Strauss"},
    ]);
    pipeline.run(&persons, ImportType::Persons).await?;

    // An event titled like the person must not be skipped
    let events = json!([
        {"title": "Johann Strauss", "date": "1825-10-25"},
    ]);
    let report = pipeline.run(&events, ImportType::Events).await?;

    assert_eq!(report.batch.imported_count, 1);
    assert_eq!(report.batch.skipped_count, 0);
    assert_eq!(store.entity_count(), 2);
    Ok(())
}

#[tokio::test]
async fn malformed_envelope_is_a_hard_failure() {
    let (pipeline, _store) = pipeline_with_store();

    let not_an_array = json!({"records": []});
    let err = pipeline
        .run(&not_an_array, ImportType::Persons)
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::MalformedBatch(_)));

    let empty = json!([]);
    let err = pipeline.run(&empty, ImportType::Persons).await.unwrap_err();
    assert!(matches!(err, ReconcileError::MalformedBatch(_)));
}

#[tokio::test]
async fn finalized_batch_is_persisted_as_audit_record() -> Result<()> {
    let (pipeline, store) = pipeline_with_store();
    let batch = json!([
        {"last_name": "Mustermann"},
    ]);

    let report = pipeline.run(&batch, ImportType::Persons).await?;

    let recorded = store.recorded_batches();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].batch_id, report.batch.batch_id);
    assert_eq!(recorded[0].imported_count, 1);
    Ok(())
}

#[tokio::test]
async fn estimated_year_matches_exact_date_in_same_year_with_place() -> Result<()> {
    let (pipeline, _store) = pipeline_with_store();
    let batch = json!([
        {"title": "Hofburg Reception", "date": "1815", "location": "Vienna"},
        {"title": "Reception at Court", "date": "1815-03-20", "location": "Vienna"},
    ]);

    let report = pipeline.run(&batch, ImportType::Events).await?;

    assert_eq!(report.batch.imported_count, 1);
    assert_eq!(report.batch.skipped_count, 1);
    Ok(())
}
