//! In-memory destination store.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use sync_core::{DestinationRecord, EntityKind, RelationKind, SourcePk};
use tokio::sync::RwLock;

use crate::store::DestinationStore;

#[derive(Debug, Default)]
struct State {
    records: BTreeMap<EntityKind, BTreeMap<SourcePk, DestinationRecord>>,
    links: BTreeMap<RelationKind, BTreeMap<SourcePk, BTreeSet<SourcePk>>>,
}

/// A destination store held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records of `kind`.
    pub async fn count(&self, kind: EntityKind) -> usize {
        self.state
            .read()
            .await
            .records
            .get(&kind)
            .map_or(0, BTreeMap::len)
    }

    /// Total number of records across all entity types.
    pub async fn total_records(&self) -> usize {
        self.state.read().await.records.values().map(BTreeMap::len).sum()
    }
}

#[async_trait]
impl DestinationStore for MemoryStore {
    async fn source_pks(&self, kind: EntityKind) -> Result<BTreeSet<SourcePk>> {
        let state = self.state.read().await;
        Ok(state
            .records
            .get(&kind)
            .map(|records| records.keys().copied().collect())
            .unwrap_or_default())
    }

    async fn latest_changed_watermark(&self, kind: EntityKind) -> Result<Option<DateTime<Utc>>> {
        let state = self.state.read().await;
        Ok(state
            .records
            .get(&kind)
            .and_then(|records| records.values().map(|r| r.changed_watermark).max()))
    }

    async fn get(&self, kind: EntityKind, pk: SourcePk) -> Result<Option<DestinationRecord>> {
        let state = self.state.read().await;
        Ok(state
            .records
            .get(&kind)
            .and_then(|records| records.get(&pk))
            .cloned())
    }

    async fn create(&self, record: DestinationRecord) -> Result<()> {
        let mut state = self.state.write().await;
        let records = state.records.entry(record.kind).or_default();
        if records.contains_key(&record.source_pk) {
            bail!("{} {} already exists", record.kind, record.source_pk);
        }
        records.insert(record.source_pk, record);
        Ok(())
    }

    async fn update(&self, record: DestinationRecord) -> Result<()> {
        let mut state = self.state.write().await;
        let Some(existing) = state
            .records
            .get_mut(&record.kind)
            .and_then(|records| records.get_mut(&record.source_pk))
        else {
            bail!("{} {} does not exist", record.kind, record.source_pk);
        };
        *existing = record;
        Ok(())
    }

    async fn linked(&self, relation: RelationKind, parent: SourcePk) -> Result<BTreeSet<SourcePk>> {
        let state = self.state.read().await;
        Ok(state
            .links
            .get(&relation)
            .and_then(|links| links.get(&parent))
            .cloned()
            .unwrap_or_default())
    }

    async fn add_link(
        &self,
        relation: RelationKind,
        parent: SourcePk,
        child: SourcePk,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .links
            .entry(relation)
            .or_default()
            .entry(parent)
            .or_default()
            .insert(child);
        Ok(())
    }

    async fn remove_link(
        &self,
        relation: RelationKind,
        parent: SourcePk,
        child: SourcePk,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(children) = state
            .links
            .get_mut(&relation)
            .and_then(|links| links.get_mut(&parent))
        {
            children.remove(&child);
        }
        Ok(())
    }
}
