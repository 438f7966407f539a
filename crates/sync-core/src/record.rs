//! Destination-side records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::entity::{EntityKind, SourcePk};
use crate::values::SyncValue;

/// A source row after normalization and field mapping, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecord {
    pub kind: EntityKind,
    pub source_pk: SourcePk,
    pub created_watermark: DateTime<Utc>,
    pub changed_watermark: DateTime<Utc>,
    pub attributes: BTreeMap<String, SyncValue>,
    /// Foreign-key attribute name to the parent's source primary key.
    pub parents: BTreeMap<String, SourcePk>,
}

impl MappedRecord {
    /// See [`DestinationRecord::value`].
    pub fn value(&self, attribute: &str) -> Result<Option<&SyncValue>, UndeclaredAttribute> {
        lookup(self.kind, &self.attributes, attribute)
    }

    /// Build the record to create, stamping local timestamps with `now`.
    pub fn into_new_record(self, now: DateTime<Utc>) -> DestinationRecord {
        DestinationRecord {
            kind: self.kind,
            source_pk: self.source_pk,
            created_watermark: self.created_watermark,
            changed_watermark: self.changed_watermark,
            attributes: self.attributes,
            parents: self.parents,
            created_at: now,
            modified_at: now,
        }
    }
}

/// A synchronized record as held by the destination store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationRecord {
    pub kind: EntityKind,
    /// Immutable once the record exists.
    pub source_pk: SourcePk,
    pub created_watermark: DateTime<Utc>,
    /// Never moves backwards across passes.
    pub changed_watermark: DateTime<Utc>,
    pub attributes: BTreeMap<String, SyncValue>,
    pub parents: BTreeMap<String, SourcePk>,
    /// Local creation time, distinct from the source watermarks.
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

fn lookup<'a>(
    kind: EntityKind,
    attributes: &'a BTreeMap<String, SyncValue>,
    attribute: &str,
) -> Result<Option<&'a SyncValue>, UndeclaredAttribute> {
    if !kind.mapping().declares(attribute) {
        return Err(UndeclaredAttribute {
            kind,
            attribute: attribute.to_string(),
        });
    }
    Ok(attributes.get(attribute))
}

/// Lookup of an attribute the record's entity type never carries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} has no attribute `{attribute}`")]
pub struct UndeclaredAttribute {
    pub kind: EntityKind,
    pub attribute: String,
}

impl DestinationRecord {
    /// The value of a mapped or derived attribute, `None` if it was never set.
    ///
    /// Names the entity type does not declare are an error rather than `None`.
    pub fn value(&self, attribute: &str) -> Result<Option<&SyncValue>, UndeclaredAttribute> {
        lookup(self.kind, &self.attributes, attribute)
    }

    pub fn parent(&self, attribute: &str) -> Option<SourcePk> {
        self.parents.get(attribute).copied()
    }
}
