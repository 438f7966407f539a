//! Dependency scheduler.
//!
//! Holds the fixed order entity types and relations are processed in. A
//! [`Schedule`] can only be built from an order that respects every foreign
//! key: a parent always comes before any child that references it, and a
//! relation only runs once both of its endpoint types are in the order.

use std::collections::{BTreeMap, BTreeSet};
use sync_core::{EntityKind, RelationKind};
use thiserror::Error;

/// Standard order for both the update and the import phase.
pub const ENTITY_ORDER: [EntityKind; 13] = [
    EntityKind::GlobalStudy,
    EntityKind::Study,
    EntityKind::SourceStudyVersion,
    EntityKind::SourceDataset,
    EntityKind::Subcohort,
    EntityKind::SourceTrait,
    EntityKind::SourceTraitEncodedValue,
    EntityKind::HarmonizedTraitSet,
    EntityKind::AllowedUpdateReason,
    EntityKind::HarmonizedTraitSetVersion,
    EntityKind::HarmonizationUnit,
    EntityKind::HarmonizedTrait,
    EntityKind::HarmonizedTraitEncodedValue,
];

/// Standard order for relation reconciliation.
pub const RELATION_ORDER: [RelationKind; 10] = [
    RelationKind::SourceDatasetSubcohorts,
    RelationKind::TraitSetVersionUpdateReasons,
    RelationKind::UnitComponentSourceTraits,
    RelationKind::UnitComponentBatchTraits,
    RelationKind::UnitComponentAgeTraits,
    RelationKind::UnitComponentTraitSetVersions,
    RelationKind::TraitComponentSourceTraits,
    RelationKind::TraitComponentBatchTraits,
    RelationKind::TraitComponentTraitSetVersions,
    RelationKind::TraitHarmonizationUnits,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("{child} is scheduled before its parent {parent}")]
    ParentAfterChild {
        child: EntityKind,
        parent: EntityKind,
    },
    #[error("{0} is scheduled more than once")]
    Duplicate(EntityKind),
    #[error("{relation} needs {missing}, which is not scheduled")]
    RelationEndpointMissing {
        relation: RelationKind,
        missing: EntityKind,
    },
    #[error("entity dependencies contain a cycle")]
    Cycle,
}

/// A validated processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    entities: Vec<EntityKind>,
    relations: Vec<RelationKind>,
}

impl Schedule {
    /// The order used by production passes.
    pub fn standard() -> Self {
        Self {
            entities: ENTITY_ORDER.to_vec(),
            relations: RELATION_ORDER.to_vec(),
        }
    }

    /// Validate a custom order, e.g. a subset used in tests.
    pub fn new(
        entities: Vec<EntityKind>,
        relations: Vec<RelationKind>,
    ) -> Result<Self, ScheduleError> {
        let mut seen = BTreeSet::new();
        for &kind in &entities {
            for parent in kind.parents() {
                if !seen.contains(&parent) && entities.contains(&parent) {
                    return Err(ScheduleError::ParentAfterChild {
                        child: kind,
                        parent,
                    });
                }
            }
            if !seen.insert(kind) {
                return Err(ScheduleError::Duplicate(kind));
            }
        }
        for &relation in &relations {
            let mapping = relation.mapping();
            for endpoint in [mapping.parent, mapping.child] {
                if !seen.contains(&endpoint) {
                    return Err(ScheduleError::RelationEndpointMissing {
                        relation,
                        missing: endpoint,
                    });
                }
            }
        }
        Ok(Self {
            entities,
            relations,
        })
    }

    pub fn entities(&self) -> &[EntityKind] {
        &self.entities
    }

    pub fn relations(&self) -> &[RelationKind] {
        &self.relations
    }
}

/// A topological order of `kinds` derived from their foreign keys (Kahn's
/// algorithm, ties broken by declaration order). Parents outside `kinds`
/// are ignored.
pub fn topological_order(kinds: &[EntityKind]) -> Result<Vec<EntityKind>, ScheduleError> {
    let included: BTreeSet<EntityKind> = kinds.iter().copied().collect();
    let mut in_degree: BTreeMap<EntityKind, usize> = BTreeMap::new();
    let mut children: BTreeMap<EntityKind, Vec<EntityKind>> = BTreeMap::new();
    for &kind in &included {
        let parents: BTreeSet<EntityKind> =
            kind.parents().filter(|p| included.contains(p)).collect();
        in_degree.insert(kind, parents.len());
        for parent in parents {
            children.entry(parent).or_default().push(kind);
        }
    }

    let mut ready: BTreeSet<EntityKind> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(&kind, _)| kind)
        .collect();
    let mut order = Vec::with_capacity(included.len());
    while let Some(kind) = ready.pop_first() {
        order.push(kind);
        for child in children.get(&kind).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(child) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(*child);
                }
            }
        }
    }

    if order.len() != included.len() {
        return Err(ScheduleError::Cycle);
    }
    Ok(order)
}
