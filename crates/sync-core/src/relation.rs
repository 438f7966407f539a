//! Many-to-many relations between entity types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::EntityKind;

/// Where the source keeps the membership of one relation.
///
/// Several relations read different column pairs of the same join table.
/// When more than one table is listed, membership is the distinct union of
/// the `(parent_column, child_column)` pairs across all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinSource {
    pub tables: &'static [&'static str],
    pub parent_column: &'static str,
    pub child_column: &'static str,
}

impl JoinSource {
    pub fn is_union(&self) -> bool {
        self.tables.len() > 1
    }
}

/// One many-to-many relation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RelationKind {
    SourceDatasetSubcohorts,
    TraitSetVersionUpdateReasons,
    UnitComponentSourceTraits,
    UnitComponentBatchTraits,
    UnitComponentAgeTraits,
    UnitComponentTraitSetVersions,
    TraitComponentSourceTraits,
    TraitComponentBatchTraits,
    TraitComponentTraitSetVersions,
    TraitHarmonizationUnits,
}

#[derive(Debug)]
pub struct RelationMapping {
    pub kind: RelationKind,
    /// `<parent table>.<attribute>`, used in reports and log lines.
    pub name: &'static str,
    pub parent: EntityKind,
    pub child: EntityKind,
    pub join: JoinSource,
    /// Whether membership changes after creation are routine. Only affects logging.
    pub changes_expected: bool,
}

impl RelationKind {
    pub const ALL: [RelationKind; 10] = [
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

    pub fn name(self) -> &'static str {
        self.mapping().name
    }

    /// Table name used by destination stores for this relation's links.
    pub fn table_name(self) -> String {
        format!("link_{}", self.name().replace('.', "__"))
    }

    pub fn mapping(self) -> &'static RelationMapping {
        match self {
            Self::SourceDatasetSubcohorts => &SOURCE_DATASET_SUBCOHORTS,
            Self::TraitSetVersionUpdateReasons => &TRAIT_SET_VERSION_UPDATE_REASONS,
            Self::UnitComponentSourceTraits => &UNIT_COMPONENT_SOURCE_TRAITS,
            Self::UnitComponentBatchTraits => &UNIT_COMPONENT_BATCH_TRAITS,
            Self::UnitComponentAgeTraits => &UNIT_COMPONENT_AGE_TRAITS,
            Self::UnitComponentTraitSetVersions => &UNIT_COMPONENT_TRAIT_SET_VERSIONS,
            Self::TraitComponentSourceTraits => &TRAIT_COMPONENT_SOURCE_TRAITS,
            Self::TraitComponentBatchTraits => &TRAIT_COMPONENT_BATCH_TRAITS,
            Self::TraitComponentTraitSetVersions => &TRAIT_COMPONENT_TRAIT_SET_VERSIONS,
            Self::TraitHarmonizationUnits => &TRAIT_HARMONIZATION_UNITS,
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static SOURCE_DATASET_SUBCOHORTS: RelationMapping = RelationMapping {
    kind: RelationKind::SourceDatasetSubcohorts,
    name: "source_dataset.subcohorts",
    parent: EntityKind::SourceDataset,
    child: EntityKind::Subcohort,
    join: JoinSource {
        tables: &["source_dataset_subcohorts"],
        parent_column: "dataset_id",
        child_column: "subcohort_id",
    },
    changes_expected: true,
};

static TRAIT_SET_VERSION_UPDATE_REASONS: RelationMapping = RelationMapping {
    kind: RelationKind::TraitSetVersionUpdateReasons,
    name: "harmonized_trait_set_version.update_reasons",
    parent: EntityKind::HarmonizedTraitSetVersion,
    child: EntityKind::AllowedUpdateReason,
    join: JoinSource {
        tables: &["harmonized_trait_set_version_update_reason"],
        parent_column: "harmonized_trait_set_version_id",
        child_column: "reason_id",
    },
    changes_expected: false,
};

static UNIT_COMPONENT_SOURCE_TRAITS: RelationMapping = RelationMapping {
    kind: RelationKind::UnitComponentSourceTraits,
    name: "harmonization_unit.component_source_traits",
    parent: EntityKind::HarmonizationUnit,
    child: EntityKind::SourceTrait,
    join: JoinSource {
        tables: &["component_source_trait"],
        parent_column: "harmonization_unit_id",
        child_column: "component_trait_id",
    },
    changes_expected: false,
};

static UNIT_COMPONENT_BATCH_TRAITS: RelationMapping = RelationMapping {
    kind: RelationKind::UnitComponentBatchTraits,
    name: "harmonization_unit.component_batch_traits",
    parent: EntityKind::HarmonizationUnit,
    child: EntityKind::SourceTrait,
    join: JoinSource {
        tables: &["component_batch_trait"],
        parent_column: "harmonization_unit_id",
        child_column: "component_trait_id",
    },
    changes_expected: false,
};

static UNIT_COMPONENT_AGE_TRAITS: RelationMapping = RelationMapping {
    kind: RelationKind::UnitComponentAgeTraits,
    name: "harmonization_unit.component_age_traits",
    parent: EntityKind::HarmonizationUnit,
    child: EntityKind::SourceTrait,
    join: JoinSource {
        tables: &["component_age_trait"],
        parent_column: "harmonization_unit_id",
        child_column: "component_trait_id",
    },
    changes_expected: false,
};

static UNIT_COMPONENT_TRAIT_SET_VERSIONS: RelationMapping = RelationMapping {
    kind: RelationKind::UnitComponentTraitSetVersions,
    name: "harmonization_unit.component_harmonized_trait_set_versions",
    parent: EntityKind::HarmonizationUnit,
    child: EntityKind::HarmonizedTraitSetVersion,
    join: JoinSource {
        tables: &["component_harmonized_trait_set"],
        parent_column: "harmonization_unit_id",
        child_column: "component_trait_set_version_id",
    },
    changes_expected: false,
};

static TRAIT_COMPONENT_SOURCE_TRAITS: RelationMapping = RelationMapping {
    kind: RelationKind::TraitComponentSourceTraits,
    name: "harmonized_trait.component_source_traits",
    parent: EntityKind::HarmonizedTrait,
    child: EntityKind::SourceTrait,
    join: JoinSource {
        tables: &["component_source_trait"],
        parent_column: "harmonized_trait_id",
        child_column: "component_trait_id",
    },
    changes_expected: false,
};

static TRAIT_COMPONENT_BATCH_TRAITS: RelationMapping = RelationMapping {
    kind: RelationKind::TraitComponentBatchTraits,
    name: "harmonized_trait.component_batch_traits",
    parent: EntityKind::HarmonizedTrait,
    child: EntityKind::SourceTrait,
    join: JoinSource {
        tables: &["component_batch_trait"],
        parent_column: "harmonized_trait_id",
        child_column: "component_trait_id",
    },
    changes_expected: false,
};

static TRAIT_COMPONENT_TRAIT_SET_VERSIONS: RelationMapping = RelationMapping {
    kind: RelationKind::TraitComponentTraitSetVersions,
    name: "harmonized_trait.component_harmonized_trait_set_versions",
    parent: EntityKind::HarmonizedTrait,
    child: EntityKind::HarmonizedTraitSetVersion,
    join: JoinSource {
        tables: &["component_harmonized_trait_set"],
        parent_column: "harmonized_trait_id",
        child_column: "component_trait_set_version_id",
    },
    changes_expected: false,
};

static TRAIT_HARMONIZATION_UNITS: RelationMapping = RelationMapping {
    kind: RelationKind::TraitHarmonizationUnits,
    name: "harmonized_trait.harmonization_units",
    parent: EntityKind::HarmonizedTrait,
    child: EntityKind::HarmonizationUnit,
    join: JoinSource {
        tables: &[
            "component_source_trait",
            "component_batch_trait",
            "component_harmonized_trait_set",
        ],
        parent_column: "harmonized_trait_id",
        child_column: "harmonization_unit_id",
    },
    changes_expected: false,
};
