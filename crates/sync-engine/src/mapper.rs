//! Field mapper: normalized row → [`MappedRecord`].
//!
//! Mapping is split in two. [`map_fields`] is pure and checks the row
//! against the entity's declared columns and value kinds.
//! [`ParentResolver`] then confirms every foreign key names a parent that
//! is already in the destination.

use destination_store::DestinationStore;
use std::collections::{BTreeMap, HashSet};
use sync_core::{
    EntityKind, EntityMapping, FieldMap, MappedRecord, NormalizedRow, SourcePk, SyncValue,
    ValueKind, CHANGED_COLUMN, CREATED_COLUMN,
};

use crate::error::{MappingError, SyncError};

/// Map one normalized row onto its entity type, without touching the store.
pub fn map_fields(
    mapping: &EntityMapping,
    row: &NormalizedRow,
) -> Result<MappedRecord, MappingError> {
    let kind = mapping.kind;
    let column = |name: &'static str| {
        row.get(name)
            .ok_or(MappingError::MissingColumn { kind, column: name })
    };

    let source_pk = source_key(kind.name(), mapping.source_pk, column(mapping.source_pk)?)?;
    let created_watermark = watermark(kind, source_pk, CREATED_COLUMN, column(CREATED_COLUMN)?)?;
    let changed_watermark = watermark(kind, source_pk, CHANGED_COLUMN, column(CHANGED_COLUMN)?)?;

    let mut attributes = BTreeMap::new();
    let mut parents = BTreeMap::new();
    for field in mapping.fields {
        let value = column(field.column())?;
        match *field {
            FieldMap::Verbatim {
                column,
                attribute,
                kind: value_kind,
            }
            | FieldMap::Renamed {
                column,
                attribute,
                kind: value_kind,
            } => {
                let coerced = value_kind.coerce(value.clone()).ok_or_else(|| {
                    MappingError::KindMismatch {
                        kind,
                        column,
                        expected: value_kind,
                        found: value.type_name().to_string(),
                    }
                })?;
                attributes.insert(attribute.to_string(), coerced);
            }
            FieldMap::ForeignKey {
                column, attribute, ..
            } => {
                parents.insert(attribute.to_string(), source_key(kind.name(), column, value)?);
            }
        }
    }

    Ok(MappedRecord {
        kind,
        source_pk,
        created_watermark,
        changed_watermark,
        attributes,
        parents,
    })
}

/// Read an integer key column.
pub(crate) fn source_key(
    context: &str,
    column: &'static str,
    value: &SyncValue,
) -> Result<SourcePk, MappingError> {
    value
        .as_i64()
        .map(SourcePk)
        .ok_or_else(|| MappingError::InvalidKey {
            context: context.to_string(),
            column,
            found: value.to_string(),
        })
}

fn watermark(
    kind: EntityKind,
    pk: SourcePk,
    column: &'static str,
    value: &SyncValue,
) -> Result<chrono::DateTime<chrono::Utc>, MappingError> {
    match ValueKind::DateTime.coerce(value.clone()) {
        Some(SyncValue::DateTime(dt)) => Ok(dt),
        Some(_) => Err(MappingError::MissingWatermark { kind, pk, column }),
        None => Err(MappingError::KindMismatch {
            kind,
            column,
            expected: ValueKind::DateTime,
            found: value.type_name().to_string(),
        }),
    }
}

/// Confirms foreign keys against the destination, remembering parents
/// already seen during the batch.
pub struct ParentResolver<'a, S: ?Sized> {
    store: &'a S,
    known: HashSet<(EntityKind, SourcePk)>,
}

impl<'a, S: DestinationStore + ?Sized> ParentResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            known: HashSet::new(),
        }
    }

    /// Fail with [`SyncError::DanglingReference`] on the first parent that
    /// does not exist.
    pub async fn check(
        &mut self,
        mapping: &EntityMapping,
        record: &MappedRecord,
    ) -> Result<(), SyncError> {
        for field in mapping.fields {
            let FieldMap::ForeignKey {
                column,
                parent,
                attribute,
            } = *field
            else {
                continue;
            };
            let parent_pk = record
                .parents
                .get(attribute)
                .copied()
                .ok_or(MappingError::MissingColumn {
                    kind: mapping.kind,
                    column,
                })?;
            if self.known.contains(&(parent, parent_pk)) {
                continue;
            }
            let exists = self
                .store
                .contains(parent, parent_pk)
                .await
                .map_err(SyncError::Store)?;
            if !exists {
                return Err(SyncError::DanglingReference {
                    kind: mapping.kind,
                    pk: record.source_pk,
                    attribute,
                    parent,
                    parent_pk,
                });
            }
            self.known.insert((parent, parent_pk));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn study_row() -> NormalizedRow {
        let mut row = NormalizedRow::new();
        row.insert("accession", SyncValue::Int(286));
        row.insert("study_name", SyncValue::from("Framingham"));
        row.insert("global_study_id", SyncValue::Int(1));
        row.insert(
            "date_added",
            SyncValue::DateTime(Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap()),
        );
        row.insert(
            "date_changed",
            SyncValue::DateTime(Utc.with_ymd_and_hms(2016, 2, 1, 0, 0, 0).unwrap()),
        );
        row
    }

    #[test]
    fn test_map_study() {
        let mapped = map_fields(EntityKind::Study.mapping(), &study_row()).unwrap();
        assert_eq!(mapped.source_pk, SourcePk(286));
        assert_eq!(
            mapped.attributes.get("i_study_name"),
            Some(&SyncValue::from("Framingham"))
        );
        assert_eq!(mapped.parents.get("global_study"), Some(&SourcePk(1)));
        assert_eq!(
            mapped.changed_watermark,
            Utc.with_ymd_and_hms(2016, 2, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_renamed_column() {
        let mut row = NormalizedRow::new();
        row.insert("harmonized_trait_id", SyncValue::Int(9));
        row.insert("trait_name", SyncValue::from("bmi"));
        row.insert("description", SyncValue::from("Body mass index"));
        row.insert("data_type", SyncValue::from("decimal"));
        row.insert("unit", SyncValue::from("kg/m2"));
        row.insert("is_unique_key", SyncValue::Int(0));
        row.insert("has_batch", SyncValue::Int(1));
        row.insert("harmonized_trait_set_version_id", SyncValue::Int(4));
        let at = SyncValue::DateTime(Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap());
        row.insert("date_added", at.clone());
        row.insert("date_changed", at);

        let mapped = map_fields(EntityKind::HarmonizedTrait.mapping(), &row).unwrap();
        assert_eq!(
            mapped.attributes.get("i_description"),
            Some(&SyncValue::from("Body mass index"))
        );
        assert_eq!(mapped.attributes.get("i_has_batch"), Some(&SyncValue::Bool(true)));
        assert_eq!(
            mapped.attributes.get("i_is_unique_key"),
            Some(&SyncValue::Bool(false))
        );
    }

    #[test]
    fn test_missing_column() {
        let full = study_row();
        let row: NormalizedRow = full
            .columns()
            .filter(|c| *c != "study_name")
            .map(|c| (c.to_string(), full.get(c).cloned().unwrap()))
            .collect();
        let err = map_fields(EntityKind::Study.mapping(), &row).unwrap_err();
        assert!(matches!(
            err,
            MappingError::MissingColumn {
                column: "study_name",
                ..
            }
        ));
    }

    #[test]
    fn test_kind_mismatch() {
        let mut row = study_row();
        row.insert("study_name", SyncValue::Int(5));
        let err = map_fields(EntityKind::Study.mapping(), &row).unwrap_err();
        assert!(matches!(err, MappingError::KindMismatch { .. }));
    }

    #[test]
    fn test_null_watermark() {
        let mut row = study_row();
        row.insert("date_changed", SyncValue::Null);
        let err = map_fields(EntityKind::Study.mapping(), &row).unwrap_err();
        assert!(matches!(err, MappingError::MissingWatermark { .. }));
    }

    #[tokio::test]
    async fn test_dangling_parent() {
        let store = destination_store::MemoryStore::new();
        let mapping = EntityKind::Study.mapping();
        let mapped = map_fields(mapping, &study_row()).unwrap();

        let err = ParentResolver::new(&store)
            .check(mapping, &mapped)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::DanglingReference {
                parent: EntityKind::GlobalStudy,
                parent_pk: SourcePk(1),
                ..
            }
        ));
    }
}
