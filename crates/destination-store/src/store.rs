//! Destination store trait.
//!
//! The sync engine only talks to the destination through this trait. It
//! abstracts the storage backend so the same passes run against:
//! - an in-process map (`MemoryStore`), used by tests and dry runs
//! - SurrealDB v2 (`SurrealStore`)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use sync_core::{DestinationRecord, EntityKind, RelationKind, SourcePk};

/// Per-entity-type record access plus per-relation link access.
///
/// Schema concerns (tables, indexes) belong to the implementation.
#[async_trait]
pub trait DestinationStore: Send + Sync {
    /// Source primary keys of every record of `kind` already in the store.
    async fn source_pks(&self, kind: EntityKind) -> Result<BTreeSet<SourcePk>>;

    /// Highest changed watermark across the records of `kind`, if any exist.
    async fn latest_changed_watermark(&self, kind: EntityKind) -> Result<Option<DateTime<Utc>>>;

    async fn get(&self, kind: EntityKind, pk: SourcePk) -> Result<Option<DestinationRecord>>;

    async fn contains(&self, kind: EntityKind, pk: SourcePk) -> Result<bool> {
        Ok(self.get(kind, pk).await?.is_some())
    }

    /// Persist a new record. Fails if a record with the same key exists.
    async fn create(&self, record: DestinationRecord) -> Result<()>;

    /// Overwrite an existing record. Fails if it does not exist.
    async fn update(&self, record: DestinationRecord) -> Result<()>;

    /// Child source primary keys currently linked to `parent`.
    async fn linked(&self, relation: RelationKind, parent: SourcePk) -> Result<BTreeSet<SourcePk>>;

    async fn add_link(&self, relation: RelationKind, parent: SourcePk, child: SourcePk)
        -> Result<()>;

    async fn remove_link(
        &self,
        relation: RelationKind,
        parent: SourcePk,
        child: SourcePk,
    ) -> Result<()>;
}
