//! End-to-end passes over the fake source and the in-memory store.

mod common;

use common::*;
use destination_store::{DestinationStore, MemoryStore};
use mysql_async::consts::ColumnType;
use mysql_async::Value;
use std::sync::Arc;
use sync_core::{EntityKind, RelationKind, SourcePk, SyncReport, SyncValue};
use sync_engine::scheduler::ENTITY_ORDER;
use sync_engine::testing::{FakeConnector, FakeRow, FakeSource, RecordingBackup};
use sync_engine::{PassAborted, SyncError, SyncOptions, SyncOrchestrator};

async fn run_pass(
    source: &Arc<FakeSource>,
    store: &MemoryStore,
    options: SyncOptions,
) -> Result<SyncReport, PassAborted> {
    let connector = FakeConnector::new(Arc::clone(source));
    let backup = RecordingBackup::new(Arc::clone(source));
    SyncOrchestrator::new(&connector, store)
        .with_backup(&backup)
        .run(options)
        .await
}

async fn derived(
    store: &MemoryStore,
    kind: EntityKind,
    pk: i64,
    attribute: &str,
) -> Option<String> {
    store
        .get(kind, SourcePk(pk))
        .await
        .unwrap()
        .unwrap()
        .value(attribute)
        .unwrap()
        .and_then(SyncValue::as_str)
        .map(str::to_string)
}

fn rows_events(source: &FakeSource) -> Vec<String> {
    source
        .events()
        .into_iter()
        .filter(|e| e.starts_with("rows:"))
        .collect()
}

#[tokio::test]
async fn test_first_pass_imports_every_row() {
    init_logging();
    let source = seeded_source();
    let store = MemoryStore::new();

    let report = run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(report.entity(EntityKind::GlobalStudy).created, 1);
    assert_eq!(report.entity(EntityKind::Subcohort).created, 4);
    assert_eq!(report.entity(EntityKind::SourceTrait).created, 2);
    assert_eq!(report.entity(EntityKind::HarmonizedTraitEncodedValue).created, 1);
    assert_eq!(store.total_records().await, 17);

    let study = store.get(EntityKind::Study, SourcePk(7)).await.unwrap().unwrap();
    assert_eq!(
        study.value("i_study_name").unwrap(),
        Some(&SyncValue::Text("Framingham Cohort".to_string()))
    );
    assert_eq!(study.parent("global_study"), Some(SourcePk(1)));
    assert_eq!(study.created_watermark, at(1));
    assert_eq!(study.changed_watermark, at(1));

    let dataset = store
        .get(EntityKind::SourceDataset, SourcePk(20))
        .await
        .unwrap()
        .unwrap();
    // NULL text becomes the empty string, NULL datetime stays null
    assert_eq!(
        dataset.value("i_dbgap_description").unwrap(),
        Some(&SyncValue::Text(String::new()))
    );
    assert_eq!(
        dataset.value("i_dbgap_date_created").unwrap(),
        Some(&SyncValue::Null)
    );
    assert_eq!(
        dataset.value("i_is_subject_file").unwrap(),
        Some(&SyncValue::Bool(false))
    );

    let source_trait = store
        .get(EntityKind::SourceTrait, SourcePk(40))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        source_trait.value("i_description").unwrap(),
        Some(&SyncValue::Text("body mass index".to_string()))
    );
    assert_eq!(
        source_trait.value("i_is_unique_key").unwrap(),
        Some(&SyncValue::Null)
    );
}

#[tokio::test]
async fn test_first_pass_derives_accessions() {
    let source = seeded_source();
    let store = MemoryStore::new();
    run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(
        derived(&store, EntityKind::Study, 7, "phs").await.as_deref(),
        Some("phs000007")
    );
    assert_eq!(
        derived(&store, EntityKind::SourceStudyVersion, 10, "full_accession")
            .await
            .as_deref(),
        Some("phs000007.v1.p1")
    );
    assert_eq!(
        derived(&store, EntityKind::SourceDataset, 20, "full_accession")
            .await
            .as_deref(),
        Some("pht012345.v1.p1")
    );
    assert_eq!(
        derived(&store, EntityKind::SourceTrait, 40, "full_accession")
            .await
            .as_deref(),
        Some("phv00000140.v1.p1")
    );
    assert!(derived(&store, EntityKind::SourceTrait, 40, "dbgap_link")
        .await
        .unwrap()
        .ends_with("variable.cgi?study_id=phs000007.v1.p1&phv=00000140"));
    assert_eq!(
        derived(&store, EntityKind::HarmonizedTrait, 80, "trait_flavor_name")
            .await
            .as_deref(),
        Some("bmi_baseline_1")
    );
}

#[tokio::test]
async fn test_derived_accession_follows_an_update() {
    let source = seeded_source();
    let store = MemoryStore::new();
    run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    source.replace(
        table(EntityKind::SourceStudyVersion),
        "id",
        10,
        source_study_version(10, 7)
            .int("version", 2)
            .stamped(at(1), at(5)),
    );
    let report = run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(report.entity(EntityKind::SourceStudyVersion).updated, 1);
    let version = store
        .get(EntityKind::SourceStudyVersion, SourcePk(10))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        version.value("full_accession").unwrap(),
        Some(&SyncValue::from("phs000007.v2.p1"))
    );
    assert_eq!(
        version.value("dbgap_link").unwrap(),
        Some(&SyncValue::from(
            "http://www.ncbi.nlm.nih.gov/projects/gap/cgi-bin/study.cgi?study_id=phs000007.v2.p1"
        ))
    );
}

#[tokio::test]
async fn test_first_pass_links_every_relation() {
    let source = seeded_source();
    let store = MemoryStore::new();

    let report = run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(report.relation(RelationKind::SourceDatasetSubcohorts).added, 3);
    assert_eq!(
        store
            .linked(RelationKind::SourceDatasetSubcohorts, SourcePk(20))
            .await
            .unwrap(),
        pks(&[30, 31, 32])
    );
    assert_eq!(
        store
            .linked(RelationKind::TraitSetVersionUpdateReasons, SourcePk(60))
            .await
            .unwrap(),
        pks(&[90])
    );
    assert_eq!(
        store
            .linked(RelationKind::UnitComponentBatchTraits, SourcePk(70))
            .await
            .unwrap(),
        pks(&[41])
    );
    // Unit 70 appears in two component tables but is linked once
    assert_eq!(report.relation(RelationKind::TraitHarmonizationUnits).added, 1);
    assert_eq!(
        store
            .linked(RelationKind::TraitHarmonizationUnits, SourcePk(80))
            .await
            .unwrap(),
        pks(&[70])
    );
    assert!(store
        .linked(RelationKind::UnitComponentAgeTraits, SourcePk(70))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_second_pass_is_quiescent() {
    let source = seeded_source();
    let store = MemoryStore::new();
    run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();
    let before = store.get(EntityKind::Study, SourcePk(7)).await.unwrap();

    let report = run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    assert!(report.is_quiescent(), "unexpected changes: {report:?}");
    assert_eq!(store.total_records().await, 17);
    assert_eq!(store.get(EntityKind::Study, SourcePk(7)).await.unwrap(), before);
}

#[tokio::test]
async fn test_entities_are_read_in_dependency_order() {
    let source = seeded_source();
    let store = MemoryStore::new();
    let expected: Vec<String> = ENTITY_ORDER
        .iter()
        .map(|kind| format!("rows:{}", table(*kind)))
        .collect();

    run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();
    // Nothing is imported yet, so the update phase reads no rows
    assert_eq!(rows_events(&source), expected);

    source.clear_events();
    run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();
    let both_phases: Vec<String> = expected.iter().chain(expected.iter()).cloned().collect();
    assert_eq!(rows_events(&source), both_phases);
}

#[tokio::test]
async fn test_backup_then_lock_then_release() {
    let source = seeded_source();
    let store = MemoryStore::new();

    run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    let events = source.events();
    assert_eq!(events[0], "backup");
    assert_eq!(events[1], "lock:acquire");
    assert_eq!(events.last().map(String::as_str), Some("lock:release"));
    assert_eq!(events.iter().filter(|e| *e == "lock:acquire").count(), 1);
}

#[tokio::test]
async fn test_update_changes_exactly_one_field() {
    let source = seeded_source();
    let store = MemoryStore::new();
    run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();
    let before = store
        .get(EntityKind::Subcohort, SourcePk(31))
        .await
        .unwrap()
        .unwrap();

    source.replace(
        table(EntityKind::Subcohort),
        "id",
        31,
        subcohort(31, "Offspring Cohort", 7).stamped(at(1), at(5)),
    );
    let report = run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(report.entity(EntityKind::Subcohort).updated, 1);
    assert_eq!(report.entity(EntityKind::Subcohort).created, 0);
    let after = store
        .get(EntityKind::Subcohort, SourcePk(31))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        after.value("i_name").unwrap(),
        Some(&SyncValue::Text("Offspring Cohort".to_string()))
    );
    assert_eq!(after.parent("study"), before.parent("study"));
    assert_eq!(after.created_watermark, before.created_watermark);
    assert_eq!(after.changed_watermark, at(5));
    assert_eq!(after.created_at, before.created_at);

    let untouched = store
        .get(EntityKind::Subcohort, SourcePk(30))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.changed_watermark, at(1));
}

#[tokio::test]
async fn test_edit_without_newer_watermark_is_not_picked_up() {
    let source = seeded_source();
    let store = MemoryStore::new();
    run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    source.replace(
        table(EntityKind::Subcohort),
        "id",
        31,
        subcohort(31, "Offspring Cohort", 7),
    );
    let report = run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    assert!(report.is_quiescent());
    let record = store
        .get(EntityKind::Subcohort, SourcePk(31))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        record.value("i_name").unwrap(),
        Some(&SyncValue::Text("Offspring".to_string()))
    );
}

#[tokio::test]
async fn test_unexpected_update_is_still_applied() {
    let source = seeded_source();
    let store = MemoryStore::new();
    run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    source.replace(
        table(EntityKind::GlobalStudy),
        "id",
        1,
        global_study(1, "Framingham Heart Study").stamped(at(1), at(3)),
    );
    let report = run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(report.entity(EntityKind::GlobalStudy).updated, 1);
    let record = store
        .get(EntityKind::GlobalStudy, SourcePk(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        record.value("i_name").unwrap(),
        Some(&SyncValue::Text("Framingham Heart Study".to_string()))
    );
}

#[tokio::test]
async fn test_links_converge_to_source_membership() {
    let source = seeded_source();
    let store = MemoryStore::new();
    run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    // {30, 31, 32} in the destination, {31, 32, 33} in the source
    source.delete("source_dataset_subcohorts", "subcohort_id", 30);
    source.insert("source_dataset_subcohorts", dataset_subcohort(20, 33));
    let report = run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    let counts = report.relation(RelationKind::SourceDatasetSubcohorts);
    assert_eq!(counts.added, 1);
    assert_eq!(counts.removed, 1);
    assert_eq!(
        store
            .linked(RelationKind::SourceDatasetSubcohorts, SourcePk(20))
            .await
            .unwrap(),
        pks(&[31, 32, 33])
    );
    // The unlinked subcohort itself is kept
    assert!(store
        .contains(EntityKind::Subcohort, SourcePk(30))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_missing_join_table_leaves_links_untouched() {
    let source = seeded_source();
    let store = MemoryStore::new();
    run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    source.drop_table("source_dataset_subcohorts");
    let report = run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    assert!(report.is_quiescent());
    assert_eq!(
        store
            .linked(RelationKind::SourceDatasetSubcohorts, SourcePk(20))
            .await
            .unwrap()
            .len(),
        3
    );
}

#[tokio::test]
async fn test_link_to_skipped_child_is_deferred() {
    let source = seeded_source();
    source.replace(
        table(EntityKind::SourceTrait),
        "source_trait_id",
        41,
        source_trait(41, "AGE", 20).raw(
            "boundary",
            ColumnType::MYSQL_TYPE_GEOMETRY,
            Value::Bytes(vec![0, 0, 0, 0, 1]),
        ),
    );
    let store = MemoryStore::new();

    for _ in 0..2 {
        let report = run_pass(&source, &store, SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(report.entity(EntityKind::SourceTrait).skipped, 1);
        let batch = report.relation(RelationKind::UnitComponentBatchTraits);
        assert_eq!(batch.added, 0);
        assert_eq!(batch.deferred, 1);
        assert!(store
            .linked(RelationKind::UnitComponentBatchTraits, SourcePk(70))
            .await
            .unwrap()
            .is_empty());
        // Relations after the deferred one are still reconciled
        assert_eq!(
            store
                .linked(RelationKind::TraitHarmonizationUnits, SourcePk(80))
                .await
                .unwrap(),
            pks(&[70])
        );
        assert_eq!(
            store
                .linked(RelationKind::TraitComponentSourceTraits, SourcePk(80))
                .await
                .unwrap(),
            pks(&[40])
        );
    }

    // Once the row is readable the link lands on the next pass
    source.replace(
        table(EntityKind::SourceTrait),
        "source_trait_id",
        41,
        source_trait(41, "AGE", 20),
    );
    let report = run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(report.entity(EntityKind::SourceTrait).created, 1);
    let batch = report.relation(RelationKind::UnitComponentBatchTraits);
    assert_eq!(batch.added, 1);
    assert_eq!(batch.deferred, 0);
    assert_eq!(
        store
            .linked(RelationKind::UnitComponentBatchTraits, SourcePk(70))
            .await
            .unwrap(),
        pks(&[41])
    );
}

#[tokio::test]
async fn test_link_to_child_created_later_in_the_pass_is_not_deferred() {
    let source = seeded_source();
    let store = MemoryStore::new();
    run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    // The update phase sees the link before the import phase creates 34
    source.insert(table(EntityKind::Subcohort), subcohort(34, "Omni 2", 7));
    source.insert("source_dataset_subcohorts", dataset_subcohort(20, 34));
    let report = run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    let counts = report.relation(RelationKind::SourceDatasetSubcohorts);
    assert_eq!(counts.added, 1);
    assert_eq!(counts.deferred, 0);
    assert_eq!(
        store
            .linked(RelationKind::SourceDatasetSubcohorts, SourcePk(20))
            .await
            .unwrap(),
        pks(&[30, 31, 32, 34])
    );
}

#[tokio::test]
async fn test_unnormalizable_join_row_leaves_parent_links_untouched() {
    let source = seeded_source();
    let store = MemoryStore::new();
    run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    source.delete("source_dataset_subcohorts", "subcohort_id", 30);
    source.insert(
        "source_dataset_subcohorts",
        FakeRow::new()
            .int("dataset_id", 20)
            .raw(
                "subcohort_id",
                ColumnType::MYSQL_TYPE_GEOMETRY,
                Value::Bytes(vec![0, 0, 0, 0, 1]),
            )
            .stamped(at(1), at(1)),
    );
    source.delete("harmonized_trait_set_version_update_reason", "reason_id", 90);
    let report = run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    let counts = report.relation(RelationKind::SourceDatasetSubcohorts);
    assert_eq!((counts.added, counts.removed, counts.deferred), (0, 0, 0));
    assert_eq!(
        store
            .linked(RelationKind::SourceDatasetSubcohorts, SourcePk(20))
            .await
            .unwrap(),
        pks(&[30, 31, 32])
    );
    // Other relations carry on
    assert_eq!(
        report.relation(RelationKind::TraitSetVersionUpdateReasons).removed,
        1
    );
    assert!(store
        .linked(RelationKind::TraitSetVersionUpdateReasons, SourcePk(60))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_dangling_reference_aborts_without_writing_the_child() {
    let source = seeded_source();
    source.insert(
        table(EntityKind::Study),
        study(8, "Jackson Heart Study", 99),
    );
    let store = MemoryStore::new();

    let aborted = run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap_err();

    match &aborted.error {
        SyncError::DanglingReference {
            kind,
            pk,
            parent,
            parent_pk,
            ..
        } => {
            assert_eq!(*kind, EntityKind::Study);
            assert_eq!(*pk, SourcePk(8));
            assert_eq!(*parent, EntityKind::GlobalStudy);
            assert_eq!(*parent_pk, SourcePk(99));
        }
        other => panic!("expected a dangling reference, got {other:?}"),
    }
    // The whole batch is rejected, including the valid study
    assert_eq!(store.count(EntityKind::Study).await, 0);
    // Earlier entity types stay imported and are reported
    assert_eq!(store.count(EntityKind::GlobalStudy).await, 1);
    assert_eq!(aborted.report.entity(EntityKind::GlobalStudy).created, 1);
    assert_eq!(
        source.events().last().map(String::as_str),
        Some("lock:release")
    );
}

#[tokio::test]
async fn test_unnormalizable_row_is_skipped() {
    let source = seeded_source();
    source.insert(
        table(EntityKind::Subcohort),
        subcohort(34, "Broken", 7).raw(
            "boundary",
            ColumnType::MYSQL_TYPE_GEOMETRY,
            Value::Bytes(vec![0, 0, 0, 0, 1]),
        ),
    );
    let store = MemoryStore::new();

    let report = run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();

    let counts = report.entity(EntityKind::Subcohort);
    assert_eq!(counts.created, 4);
    assert_eq!(counts.skipped, 1);
    assert!(!store
        .contains(EntityKind::Subcohort, SourcePk(34))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_both_restrictions_open_no_connections() {
    let source = seeded_source();
    let store = MemoryStore::new();
    let connector = FakeConnector::new(Arc::clone(&source));
    let backup = RecordingBackup::new(Arc::clone(&source));

    let aborted = SyncOrchestrator::new(&connector, &store)
        .with_backup(&backup)
        .run(SyncOptions {
            import_only: true,
            update_only: true,
            test_context: true,
            ..SyncOptions::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(aborted.error, SyncError::UnsupportedMode(_)));
    assert_eq!(connector.connections_opened(), 0);
    assert_eq!(backup.runs(), 0);
    assert!(source.events().is_empty());
}

#[tokio::test]
async fn test_restricted_mode_needs_test_context() {
    let source = seeded_source();
    let store = MemoryStore::new();

    let aborted = run_pass(
        &source,
        &store,
        SyncOptions {
            import_only: true,
            ..SyncOptions::default()
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(aborted.error, SyncError::UnsupportedMode(_)));
    assert_eq!(store.total_records().await, 0);
}

#[tokio::test]
async fn test_update_only_creates_nothing() {
    let source = seeded_source();
    let store = MemoryStore::new();

    let report = run_pass(
        &source,
        &store,
        SyncOptions {
            update_only: true,
            test_context: true,
            ..SyncOptions::default()
        },
    )
    .await
    .unwrap();

    assert!(report.is_quiescent());
    assert_eq!(store.total_records().await, 0);
}

#[tokio::test]
async fn test_import_only_skips_updates() {
    let source = seeded_source();
    let store = MemoryStore::new();
    run_pass(&source, &store, SyncOptions::default())
        .await
        .unwrap();
    source.replace(
        table(EntityKind::Subcohort),
        "id",
        31,
        subcohort(31, "Offspring Cohort", 7).stamped(at(1), at(5)),
    );
    source.insert(table(EntityKind::GlobalStudy), global_study(2, "ARIC"));

    let report = run_pass(
        &source,
        &store,
        SyncOptions {
            import_only: true,
            test_context: true,
            ..SyncOptions::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(report.entity(EntityKind::GlobalStudy).created, 1);
    assert_eq!(report.entity(EntityKind::Subcohort).updated, 0);
    let record = store
        .get(EntityKind::Subcohort, SourcePk(31))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        record.value("i_name").unwrap(),
        Some(&SyncValue::Text("Offspring".to_string()))
    );
}

#[tokio::test]
async fn test_failed_backup_aborts_before_the_lock() {
    let source = seeded_source();
    let store = MemoryStore::new();
    let connector = FakeConnector::new(Arc::clone(&source));
    let backup = RecordingBackup::new(Arc::clone(&source)).failing();

    let aborted = SyncOrchestrator::new(&connector, &store)
        .with_backup(&backup)
        .run(SyncOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(aborted.error, SyncError::Backup(_)));
    assert_eq!(source.events(), vec!["backup".to_string()]);
    assert_eq!(connector.connections_opened(), 0);
    assert_eq!(store.total_records().await, 0);
}

#[tokio::test]
async fn test_missing_backup_aborts_before_the_lock() {
    let source = seeded_source();
    let store = MemoryStore::new();
    let connector = FakeConnector::new(Arc::clone(&source));

    let aborted = SyncOrchestrator::new(&connector, &store)
        .run(SyncOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(aborted.error, SyncError::Backup(_)));
    assert!(source.events().is_empty());
    assert_eq!(connector.connections_opened(), 0);
    assert_eq!(store.total_records().await, 0);
    assert_eq!(aborted.report, SyncReport::default());
}

#[tokio::test]
async fn test_skip_backup_does_not_run_it() {
    let source = seeded_source();
    let store = MemoryStore::new();
    let connector = FakeConnector::new(Arc::clone(&source));
    let backup = RecordingBackup::new(Arc::clone(&source));

    SyncOrchestrator::new(&connector, &store)
        .with_backup(&backup)
        .run(SyncOptions {
            skip_backup: true,
            ..SyncOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(backup.runs(), 0);
    assert_eq!(source.events()[0], "lock:acquire");
}

#[tokio::test]
async fn test_lock_failure_aborts_the_pass() {
    let source = seeded_source();
    let store = MemoryStore::new();
    let connector = FakeConnector::new(Arc::clone(&source)).with_failing_lock();

    let aborted = SyncOrchestrator::new(&connector, &store)
        .run(SyncOptions {
            skip_backup: true,
            ..SyncOptions::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(aborted.error, SyncError::LockAcquisition(_)));
    assert!(rows_events(&source).is_empty());
    assert_eq!(store.total_records().await, 0);
}
