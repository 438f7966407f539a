//! Shared fixture: a small but complete source database.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use mysql_async::consts::ColumnType;
use std::collections::BTreeSet;
use std::sync::Arc;
use sync_core::{EntityKind, RelationKind, SourcePk};
use sync_engine::testing::{FakeRow, FakeSource};

/// Initialize logging for tests
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 1, day, 12, 0, 0).unwrap()
}

pub fn pks(keys: &[i64]) -> BTreeSet<SourcePk> {
    keys.iter().copied().map(SourcePk).collect()
}

pub fn table(kind: EntityKind) -> &'static str {
    kind.mapping().source_table
}

pub fn global_study(id: i64, name: &str) -> FakeRow {
    FakeRow::new()
        .int("id", id)
        .text("name", name)
        .int("topmed_accession", id)
        .text("topmed_abbreviation", "FHS")
        .stamped(at(1), at(1))
}

pub fn study(accession: i64, name: &str, global_study_id: i64) -> FakeRow {
    FakeRow::new()
        .int("accession", accession)
        .text("study_name", name)
        .int("global_study_id", global_study_id)
        .stamped(at(1), at(1))
}

pub fn source_study_version(id: i64, study_accession: i64) -> FakeRow {
    FakeRow::new()
        .int("id", id)
        .int("version", 1)
        .int("participant_set", 1)
        .datetime("dbgap_date", at(1))
        .flag("is_prerelease", false)
        .flag("is_deprecated", false)
        .int("accession", study_accession)
        .stamped(at(1), at(1))
}

pub fn source_dataset(id: i64, study_version_id: i64) -> FakeRow {
    FakeRow::new()
        .int("id", id)
        .int("accession", 12345)
        .int("version", 1)
        .flag("is_subject_file", false)
        .text("study_subject_column", "dbGaP_Subject_ID")
        .null("dbgap_description", ColumnType::MYSQL_TYPE_BLOB)
        .null("dbgap_date_created", ColumnType::MYSQL_TYPE_DATETIME)
        .int("study_version_id", study_version_id)
        .stamped(at(1), at(1))
}

pub fn subcohort(id: i64, name: &str, study_accession: i64) -> FakeRow {
    FakeRow::new()
        .int("id", id)
        .text("name", name)
        .int("study_accession", study_accession)
        .stamped(at(1), at(1))
}

pub fn source_trait(id: i64, name: &str, dataset_id: i64) -> FakeRow {
    FakeRow::new()
        .int("source_trait_id", id)
        .text("trait_name", name)
        .text("dcc_description", "body mass index")
        .text("detected_type", "decimal")
        .text("dbgap_type", "decimal")
        .int("dbgap_variable_accession", 100 + id)
        .int("dbgap_variable_version", 1)
        .null("dbgap_comment", ColumnType::MYSQL_TYPE_BLOB)
        .text("dbgap_unit", "kg/m2")
        .int("n_records", 5000)
        .int("n_missing", 12)
        .null("is_unique_key", ColumnType::MYSQL_TYPE_TINY)
        .flag("are_values_truncated", false)
        .int("dataset_id", dataset_id)
        .stamped(at(1), at(1))
}

pub fn source_trait_encoded_value(id: i64, source_trait_id: i64) -> FakeRow {
    FakeRow::new()
        .int("id", id)
        .text("category", "1")
        .text("value", "yes")
        .int("source_trait_id", source_trait_id)
        .stamped(at(1), at(1))
}

pub fn harmonized_trait_set(id: i64) -> FakeRow {
    FakeRow::new()
        .int("id", id)
        .text("trait_set_name", "bmi_baseline")
        .int("flavor", 1)
        .flag("is_longitudinal", false)
        .flag("is_demographic", false)
        .stamped(at(1), at(1))
}

pub fn allowed_update_reason(id: i64, abbreviation: &str) -> FakeRow {
    FakeRow::new()
        .int("id", id)
        .text("abbreviation", abbreviation)
        .text("description", "Added data from a new study")
        .stamped(at(1), at(1))
}

pub fn harmonized_trait_set_version(id: i64, set_id: i64) -> FakeRow {
    FakeRow::new()
        .int("id", id)
        .int("version", 1)
        .text("git_commit_hash", "0123456789abcdef0123456789abcdef01234567")
        .text("harmonized_by", "analyst")
        .flag("is_deprecated", false)
        .int("harmonized_trait_set_id", set_id)
        .stamped(at(1), at(1))
}

pub fn harmonization_unit(id: i64, version_id: i64) -> FakeRow {
    FakeRow::new()
        .int("id", id)
        .text("tag", "FHS_unit")
        .int("harmonized_trait_set_version_id", version_id)
        .stamped(at(1), at(1))
}

pub fn harmonized_trait(id: i64, version_id: i64) -> FakeRow {
    FakeRow::new()
        .int("harmonized_trait_id", id)
        .text("trait_name", "bmi_baseline")
        .text("description", "Body mass index at baseline")
        .text("data_type", "decimal")
        .text("unit", "kg/m2")
        .flag("is_unique_key", false)
        .flag("has_batch", true)
        .int("harmonized_trait_set_version_id", version_id)
        .stamped(at(1), at(1))
}

pub fn harmonized_trait_encoded_value(id: i64, trait_id: i64) -> FakeRow {
    FakeRow::new()
        .int("id", id)
        .text("category", "0")
        .text("value", "no")
        .int("harmonized_trait_id", trait_id)
        .stamped(at(1), at(1))
}

pub fn dataset_subcohort(dataset_id: i64, subcohort_id: i64) -> FakeRow {
    FakeRow::new()
        .int("dataset_id", dataset_id)
        .int("subcohort_id", subcohort_id)
        .stamped(at(1), at(1))
}

pub fn component(trait_id: i64, unit_id: i64, column: &str, component_id: i64) -> FakeRow {
    FakeRow::new()
        .int("harmonized_trait_id", trait_id)
        .int("harmonization_unit_id", unit_id)
        .int(column, component_id)
        .stamped(at(1), at(1))
}

/// A source with every entity table and join table present and a small
/// tree of rows in each.
pub fn seeded_source() -> Arc<FakeSource> {
    let source = Arc::new(FakeSource::new());
    for kind in EntityKind::ALL {
        source.create_table(table(kind));
    }
    for relation in RelationKind::ALL {
        for join_table in relation.mapping().join.tables {
            source.create_table(join_table);
        }
    }

    source.insert(table(EntityKind::GlobalStudy), global_study(1, "Framingham"));
    source.insert(table(EntityKind::Study), study(7, "Framingham Cohort", 1));
    source.insert(
        table(EntityKind::SourceStudyVersion),
        source_study_version(10, 7),
    );
    source.insert(table(EntityKind::SourceDataset), source_dataset(20, 10));
    for (id, name) in [(30, "Original"), (31, "Offspring"), (32, "Gen3"), (33, "Omni")] {
        source.insert(table(EntityKind::Subcohort), subcohort(id, name, 7));
    }
    source.insert(table(EntityKind::SourceTrait), source_trait(40, "BMI", 20));
    source.insert(table(EntityKind::SourceTrait), source_trait(41, "AGE", 20));
    source.insert(
        table(EntityKind::SourceTraitEncodedValue),
        source_trait_encoded_value(45, 40),
    );
    source.insert(table(EntityKind::HarmonizedTraitSet), harmonized_trait_set(50));
    source.insert(
        table(EntityKind::AllowedUpdateReason),
        allowed_update_reason(90, "new_study"),
    );
    source.insert(
        table(EntityKind::HarmonizedTraitSetVersion),
        harmonized_trait_set_version(60, 50),
    );
    source.insert(table(EntityKind::HarmonizationUnit), harmonization_unit(70, 60));
    source.insert(table(EntityKind::HarmonizedTrait), harmonized_trait(80, 60));
    source.insert(
        table(EntityKind::HarmonizedTraitEncodedValue),
        harmonized_trait_encoded_value(85, 80),
    );

    for subcohort_id in [30, 31, 32] {
        source.insert("source_dataset_subcohorts", dataset_subcohort(20, subcohort_id));
    }
    source.insert(
        "harmonized_trait_set_version_update_reason",
        FakeRow::new()
            .int("harmonized_trait_set_version_id", 60)
            .int("reason_id", 90)
            .stamped(at(1), at(1)),
    );
    source.insert(
        "component_source_trait",
        component(80, 70, "component_trait_id", 40),
    );
    source.insert(
        "component_batch_trait",
        component(80, 70, "component_trait_id", 41),
    );

    source
}
