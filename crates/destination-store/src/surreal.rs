//! SurrealDB v2 SDK destination store.
//!
//! Each entity type lives in its own table, keyed by the numeric source
//! primary key. Each relation gets a `link_*` table with one row per
//! `(parent, child)` pair.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use surrealdb::engine::any::Any;
use surrealdb::sql::{Id, Thing};
use sync_core::{DestinationRecord, EntityKind, RelationKind, SourcePk, SyncValue};

use crate::store::DestinationStore;

/// Record layout in SurrealDB. The entity kind is implied by the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    source_pk: SourcePk,
    created_watermark: DateTime<Utc>,
    changed_watermark: DateTime<Utc>,
    attributes: BTreeMap<String, SyncValue>,
    parents: BTreeMap<String, SourcePk>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl StoredRecord {
    fn into_record(self, kind: EntityKind) -> DestinationRecord {
        DestinationRecord {
            kind,
            source_pk: self.source_pk,
            created_watermark: self.created_watermark,
            changed_watermark: self.changed_watermark,
            attributes: self.attributes,
            parents: self.parents,
            created_at: self.created_at,
            modified_at: self.modified_at,
        }
    }
}

impl From<DestinationRecord> for StoredRecord {
    fn from(record: DestinationRecord) -> Self {
        Self {
            source_pk: record.source_pk,
            created_watermark: record.created_watermark,
            changed_watermark: record.changed_watermark,
            attributes: record.attributes,
            parents: record.parents,
            created_at: record.created_at,
            modified_at: record.modified_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredLink {
    parent: SourcePk,
    child: SourcePk,
}

/// SurrealDB v2 SDK implementation of [`DestinationStore`].
pub struct SurrealStore {
    client: surrealdb::Surreal<Any>,
}

impl SurrealStore {
    pub fn new(client: surrealdb::Surreal<Any>) -> Self {
        Self { client }
    }

    fn record_thing(kind: EntityKind, pk: SourcePk) -> Thing {
        Thing::from((kind.table_name(), Id::Number(pk.0)))
    }

    fn link_thing(relation: RelationKind, parent: SourcePk, child: SourcePk) -> Thing {
        let table = relation.table_name();
        Thing::from((table.as_str(), Id::String(format!("{parent}_{child}"))))
    }
}

#[async_trait]
impl DestinationStore for SurrealStore {
    async fn source_pks(&self, kind: EntityKind) -> Result<BTreeSet<SourcePk>> {
        let mut response = self
            .client
            .query("SELECT VALUE source_pk FROM type::table($table)")
            .bind(("table", kind.table_name()))
            .await?;
        let pks: Vec<SourcePk> = response.take(0)?;
        Ok(pks.into_iter().collect())
    }

    async fn latest_changed_watermark(&self, kind: EntityKind) -> Result<Option<DateTime<Utc>>> {
        let mut response = self
            .client
            .query("SELECT VALUE changed_watermark FROM type::table($table)")
            .bind(("table", kind.table_name()))
            .await?;
        let watermarks: Vec<DateTime<Utc>> = response.take(0)?;
        Ok(watermarks.into_iter().max())
    }

    async fn get(&self, kind: EntityKind, pk: SourcePk) -> Result<Option<DestinationRecord>> {
        let mut response = self
            .client
            .query("SELECT * FROM $record_id")
            .bind(("record_id", Self::record_thing(kind, pk)))
            .await?;
        let records: Vec<StoredRecord> = response.take(0)?;
        Ok(records.into_iter().next().map(|r| r.into_record(kind)))
    }

    async fn create(&self, record: DestinationRecord) -> Result<()> {
        let (kind, pk) = (record.kind, record.source_pk);
        self.client
            .query("CREATE $record_id CONTENT $content")
            .bind(("record_id", Self::record_thing(kind, pk)))
            .bind(("content", StoredRecord::from(record)))
            .await?
            .check()
            .with_context(|| format!("Failed to create {kind} {pk}"))?;
        Ok(())
    }

    async fn update(&self, record: DestinationRecord) -> Result<()> {
        let (kind, pk) = (record.kind, record.source_pk);
        let mut response = self
            .client
            .query("UPDATE $record_id CONTENT $content")
            .bind(("record_id", Self::record_thing(kind, pk)))
            .bind(("content", StoredRecord::from(record)))
            .await?;
        let updated: Vec<StoredRecord> = response
            .take(0)
            .with_context(|| format!("Failed to update {kind} {pk}"))?;
        if updated.is_empty() {
            bail!("{kind} {pk} does not exist");
        }
        Ok(())
    }

    async fn linked(&self, relation: RelationKind, parent: SourcePk) -> Result<BTreeSet<SourcePk>> {
        let mut response = self
            .client
            .query("SELECT VALUE child FROM type::table($table) WHERE parent = $parent")
            .bind(("table", relation.table_name()))
            .bind(("parent", parent))
            .await?;
        let children: Vec<SourcePk> = response.take(0)?;
        Ok(children.into_iter().collect())
    }

    async fn add_link(
        &self,
        relation: RelationKind,
        parent: SourcePk,
        child: SourcePk,
    ) -> Result<()> {
        self.client
            .query("UPSERT $record_id CONTENT $content")
            .bind(("record_id", Self::link_thing(relation, parent, child)))
            .bind(("content", StoredLink { parent, child }))
            .await?
            .check()?;
        Ok(())
    }

    async fn remove_link(
        &self,
        relation: RelationKind,
        parent: SourcePk,
        child: SourcePk,
    ) -> Result<()> {
        self.client
            .query("DELETE $record_id")
            .bind(("record_id", Self::link_thing(relation, parent, child)))
            .await?
            .check()?;
        Ok(())
    }
}
