//! Per-pass counters returned to the caller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entity::EntityKind;
use crate::relation::RelationKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub created: usize,
    pub updated: usize,
    /// Rows dropped because they failed normalization.
    #[serde(default)]
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCounts {
    pub added: usize,
    pub removed: usize,
    /// Links left for a later pass because the child is not in the destination,
    /// as of the relation's last reconciliation in the pass.
    #[serde(default)]
    pub deferred: usize,
}

/// Outcome of one pass, possibly partial if the pass aborted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub per_entity: BTreeMap<String, EntityCounts>,
    pub per_relation: BTreeMap<String, LinkCounts>,
}

impl SyncReport {
    pub fn entity_mut(&mut self, kind: EntityKind) -> &mut EntityCounts {
        self.per_entity.entry(kind.name().to_string()).or_default()
    }

    pub fn relation_mut(&mut self, kind: RelationKind) -> &mut LinkCounts {
        self.per_relation.entry(kind.name().to_string()).or_default()
    }

    pub fn entity(&self, kind: EntityKind) -> EntityCounts {
        self.per_entity.get(kind.name()).copied().unwrap_or_default()
    }

    pub fn relation(&self, kind: RelationKind) -> LinkCounts {
        self.per_relation.get(kind.name()).copied().unwrap_or_default()
    }

    /// True when the pass created, updated, linked and unlinked nothing.
    /// Skipped rows and deferred links are not changes.
    pub fn is_quiescent(&self) -> bool {
        self.per_entity
            .values()
            .all(|c| c.created == 0 && c.updated == 0)
            && self
                .per_relation
                .values()
                .all(|c| c.added == 0 && c.removed == 0)
    }
}
