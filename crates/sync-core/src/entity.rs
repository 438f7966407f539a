//! Entity types and their declarative source-to-destination mappings.
//!
//! Every synchronized entity type has one [`EntityMapping`], defined as a
//! `static` table below. Verbatim columns are declared with the
//! [`verbatim!`] macro so the `i_` attribute prefix is produced at compile
//! time; a misspelled entity or value kind is a build error.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ValueKind;

/// Source column holding the row's creation timestamp.
pub const CREATED_COLUMN: &str = "date_added";

/// Source column holding the row's last-modification timestamp.
pub const CHANGED_COLUMN: &str = "date_changed";

/// Stable identifier the source system assigned to a row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SourcePk(pub i64);

impl fmt::Display for SourcePk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One kind of synchronized record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum EntityKind {
    GlobalStudy,
    Study,
    SourceStudyVersion,
    SourceDataset,
    Subcohort,
    SourceTrait,
    SourceTraitEncodedValue,
    HarmonizedTraitSet,
    AllowedUpdateReason,
    HarmonizedTraitSetVersion,
    HarmonizationUnit,
    HarmonizedTrait,
    HarmonizedTraitEncodedValue,
}

impl EntityKind {
    pub const ALL: [EntityKind; 13] = [
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

    /// Name used in reports and log lines.
    pub fn name(self) -> &'static str {
        match self {
            Self::GlobalStudy => "GlobalStudy",
            Self::Study => "Study",
            Self::SourceStudyVersion => "SourceStudyVersion",
            Self::SourceDataset => "SourceDataset",
            Self::Subcohort => "Subcohort",
            Self::SourceTrait => "SourceTrait",
            Self::SourceTraitEncodedValue => "SourceTraitEncodedValue",
            Self::HarmonizedTraitSet => "HarmonizedTraitSet",
            Self::AllowedUpdateReason => "AllowedUpdateReason",
            Self::HarmonizedTraitSetVersion => "HarmonizedTraitSetVersion",
            Self::HarmonizationUnit => "HarmonizationUnit",
            Self::HarmonizedTrait => "HarmonizedTrait",
            Self::HarmonizedTraitEncodedValue => "HarmonizedTraitEncodedValue",
        }
    }

    /// Table name used by destination stores.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::GlobalStudy => "global_study",
            Self::Study => "study",
            Self::SourceStudyVersion => "source_study_version",
            Self::SourceDataset => "source_dataset",
            Self::Subcohort => "subcohort",
            Self::SourceTrait => "source_trait",
            Self::SourceTraitEncodedValue => "source_trait_encoded_value",
            Self::HarmonizedTraitSet => "harmonized_trait_set",
            Self::AllowedUpdateReason => "allowed_update_reason",
            Self::HarmonizedTraitSetVersion => "harmonized_trait_set_version",
            Self::HarmonizationUnit => "harmonization_unit",
            Self::HarmonizedTrait => "harmonized_trait",
            Self::HarmonizedTraitEncodedValue => "harmonized_trait_encoded_value",
        }
    }

    pub fn mapping(self) -> &'static EntityMapping {
        match self {
            Self::GlobalStudy => &GLOBAL_STUDY,
            Self::Study => &STUDY,
            Self::SourceStudyVersion => &SOURCE_STUDY_VERSION,
            Self::SourceDataset => &SOURCE_DATASET,
            Self::Subcohort => &SUBCOHORT,
            Self::SourceTrait => &SOURCE_TRAIT,
            Self::SourceTraitEncodedValue => &SOURCE_TRAIT_ENCODED_VALUE,
            Self::HarmonizedTraitSet => &HARMONIZED_TRAIT_SET,
            Self::AllowedUpdateReason => &ALLOWED_UPDATE_REASON,
            Self::HarmonizedTraitSetVersion => &HARMONIZED_TRAIT_SET_VERSION,
            Self::HarmonizationUnit => &HARMONIZATION_UNIT,
            Self::HarmonizedTrait => &HARMONIZED_TRAIT,
            Self::HarmonizedTraitEncodedValue => &HARMONIZED_TRAIT_ENCODED_VALUE,
        }
    }

    /// Entity types this one references through a foreign key.
    pub fn parents(self) -> impl Iterator<Item = EntityKind> {
        self.mapping().fields.iter().filter_map(|field| match field {
            FieldMap::ForeignKey { parent, .. } => Some(*parent),
            _ => None,
        })
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How one source column lands in the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMap {
    /// Copied as-is into the `i_`-prefixed attribute of the same name.
    Verbatim {
        column: &'static str,
        attribute: &'static str,
        kind: ValueKind,
    },
    /// Copied into a differently named attribute.
    Renamed {
        column: &'static str,
        attribute: &'static str,
        kind: ValueKind,
    },
    /// Resolved to the parent record with that source primary key.
    ForeignKey {
        column: &'static str,
        parent: EntityKind,
        attribute: &'static str,
    },
}

impl FieldMap {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Verbatim { column, .. }
            | Self::Renamed { column, .. }
            | Self::ForeignKey { column, .. } => column,
        }
    }

    pub fn attribute(&self) -> &'static str {
        match self {
            Self::Verbatim { attribute, .. }
            | Self::Renamed { attribute, .. }
            | Self::ForeignKey { attribute, .. } => attribute,
        }
    }
}

/// Declares a verbatim column; the attribute is the column name prefixed with `i_`.
#[macro_export]
macro_rules! verbatim {
    ($column:literal, $kind:ident) => {
        $crate::entity::FieldMap::Verbatim {
            column: $column,
            attribute: concat!("i_", $column),
            kind: $crate::types::ValueKind::$kind,
        }
    };
}

macro_rules! renamed {
    ($column:literal => $attribute:literal, $kind:ident) => {
        FieldMap::Renamed {
            column: $column,
            attribute: $attribute,
            kind: ValueKind::$kind,
        }
    };
}

macro_rules! foreign_key {
    ($column:literal => $parent:ident as $attribute:literal) => {
        FieldMap::ForeignKey {
            column: $column,
            parent: EntityKind::$parent,
            attribute: $attribute,
        }
    };
}

/// Declarative mapping of one source table onto one entity type.
#[derive(Debug)]
pub struct EntityMapping {
    pub kind: EntityKind,
    pub source_table: &'static str,
    /// Primary key column; its value becomes the record's [`SourcePk`].
    pub source_pk: &'static str,
    pub fields: &'static [FieldMap],
    /// Attributes computed from this record's columns and its parents.
    pub derived: &'static [DerivedField],
    /// Whether post-creation edits to this table are routine. Only affects logging.
    pub updates_expected: bool,
    /// Ignore rows whose changed watermark merely equals their created watermark.
    pub require_changed_after_created: bool,
}

impl EntityMapping {
    /// Every source column a row of this entity type must carry.
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        [self.source_pk, CREATED_COLUMN, CHANGED_COLUMN]
            .into_iter()
            .chain(self.fields.iter().map(FieldMap::column))
    }

    /// Whether records of this type carry the value attribute `attribute`,
    /// mapped or derived. Foreign keys are held as parents, not values.
    pub fn declares(&self, attribute: &str) -> bool {
        self.fields
            .iter()
            .any(|f| !matches!(f, FieldMap::ForeignKey { .. }) && f.attribute() == attribute)
            || self.derived.iter().any(|d| d.attribute() == attribute)
    }
}

/// A destination attribute computed rather than copied from a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedField {
    /// `phs000007`, from the study accession.
    Phs,
    /// Versioned dbGaP accession, e.g. `phs000007.v1.p1`.
    FullAccession,
    /// dbGaP page for the record.
    DbgapLink,
    /// Trait name suffixed with its trait set's flavor.
    TraitFlavorName,
}

impl DerivedField {
    pub fn attribute(self) -> &'static str {
        match self {
            Self::Phs => "phs",
            Self::FullAccession => "full_accession",
            Self::DbgapLink => "dbgap_link",
            Self::TraitFlavorName => "trait_flavor_name",
        }
    }
}

static GLOBAL_STUDY: EntityMapping = EntityMapping {
    kind: EntityKind::GlobalStudy,
    source_table: "global_study",
    source_pk: "id",
    fields: &[
        verbatim!("name", Text),
        verbatim!("topmed_accession", Int),
        verbatim!("topmed_abbreviation", Text),
    ],
    derived: &[],
    updates_expected: false,
    require_changed_after_created: true,
};

static STUDY: EntityMapping = EntityMapping {
    kind: EntityKind::Study,
    source_table: "study",
    source_pk: "accession",
    fields: &[
        verbatim!("study_name", Text),
        foreign_key!("global_study_id" => GlobalStudy as "global_study"),
    ],
    derived: &[DerivedField::Phs],
    updates_expected: false,
    require_changed_after_created: true,
};

static SOURCE_STUDY_VERSION: EntityMapping = EntityMapping {
    kind: EntityKind::SourceStudyVersion,
    source_table: "source_study_version",
    source_pk: "id",
    fields: &[
        verbatim!("version", Int),
        verbatim!("participant_set", Int),
        verbatim!("dbgap_date", DateTime),
        verbatim!("is_prerelease", Bool),
        verbatim!("is_deprecated", Bool),
        foreign_key!("accession" => Study as "study"),
    ],
    derived: &[DerivedField::FullAccession, DerivedField::DbgapLink],
    updates_expected: true,
    require_changed_after_created: true,
};

static SOURCE_DATASET: EntityMapping = EntityMapping {
    kind: EntityKind::SourceDataset,
    source_table: "source_dataset",
    source_pk: "id",
    fields: &[
        verbatim!("accession", Int),
        verbatim!("version", Int),
        verbatim!("is_subject_file", Bool),
        verbatim!("study_subject_column", Text),
        verbatim!("dbgap_description", Text),
        verbatim!("dbgap_date_created", DateTime),
        foreign_key!("study_version_id" => SourceStudyVersion as "source_study_version"),
    ],
    derived: &[DerivedField::FullAccession, DerivedField::DbgapLink],
    updates_expected: true,
    require_changed_after_created: true,
};

static SUBCOHORT: EntityMapping = EntityMapping {
    kind: EntityKind::Subcohort,
    source_table: "subcohort",
    source_pk: "id",
    fields: &[
        verbatim!("name", Text),
        foreign_key!("study_accession" => Study as "study"),
    ],
    derived: &[],
    updates_expected: true,
    require_changed_after_created: true,
};

static SOURCE_TRAIT: EntityMapping = EntityMapping {
    kind: EntityKind::SourceTrait,
    source_table: "source_trait",
    source_pk: "source_trait_id",
    fields: &[
        verbatim!("trait_name", Text),
        renamed!("dcc_description" => "i_description", Text),
        verbatim!("detected_type", Text),
        verbatim!("dbgap_type", Text),
        verbatim!("dbgap_variable_accession", Int),
        verbatim!("dbgap_variable_version", Int),
        verbatim!("dbgap_comment", Text),
        verbatim!("dbgap_unit", Text),
        verbatim!("n_records", Int),
        verbatim!("n_missing", Int),
        verbatim!("is_unique_key", Bool),
        verbatim!("are_values_truncated", Bool),
        foreign_key!("dataset_id" => SourceDataset as "source_dataset"),
    ],
    derived: &[DerivedField::FullAccession, DerivedField::DbgapLink],
    updates_expected: true,
    require_changed_after_created: true,
};

static SOURCE_TRAIT_ENCODED_VALUE: EntityMapping = EntityMapping {
    kind: EntityKind::SourceTraitEncodedValue,
    source_table: "source_trait_encoded_values",
    source_pk: "id",
    fields: &[
        verbatim!("category", Text),
        verbatim!("value", Text),
        foreign_key!("source_trait_id" => SourceTrait as "source_trait"),
    ],
    derived: &[],
    updates_expected: false,
    require_changed_after_created: true,
};

static HARMONIZED_TRAIT_SET: EntityMapping = EntityMapping {
    kind: EntityKind::HarmonizedTraitSet,
    source_table: "harmonized_trait_set",
    source_pk: "id",
    fields: &[
        verbatim!("trait_set_name", Text),
        verbatim!("flavor", Int),
        verbatim!("is_longitudinal", Bool),
        verbatim!("is_demographic", Bool),
    ],
    derived: &[],
    updates_expected: false,
    require_changed_after_created: true,
};

static ALLOWED_UPDATE_REASON: EntityMapping = EntityMapping {
    kind: EntityKind::AllowedUpdateReason,
    source_table: "allowed_update_reason",
    source_pk: "id",
    fields: &[
        verbatim!("abbreviation", Text),
        verbatim!("description", Text),
    ],
    derived: &[],
    updates_expected: false,
    require_changed_after_created: true,
};

static HARMONIZED_TRAIT_SET_VERSION: EntityMapping = EntityMapping {
    kind: EntityKind::HarmonizedTraitSetVersion,
    source_table: "harmonized_trait_set_version",
    source_pk: "id",
    fields: &[
        verbatim!("version", Int),
        verbatim!("git_commit_hash", Text),
        verbatim!("harmonized_by", Text),
        verbatim!("is_deprecated", Bool),
        foreign_key!("harmonized_trait_set_id" => HarmonizedTraitSet as "harmonized_trait_set"),
    ],
    derived: &[],
    updates_expected: true,
    require_changed_after_created: true,
};

static HARMONIZATION_UNIT: EntityMapping = EntityMapping {
    kind: EntityKind::HarmonizationUnit,
    source_table: "harmonization_unit",
    source_pk: "id",
    fields: &[
        verbatim!("tag", Text),
        foreign_key!(
            "harmonized_trait_set_version_id" => HarmonizedTraitSetVersion
                as "harmonized_trait_set_version"
        ),
    ],
    derived: &[],
    updates_expected: false,
    require_changed_after_created: true,
};

static HARMONIZED_TRAIT: EntityMapping = EntityMapping {
    kind: EntityKind::HarmonizedTrait,
    source_table: "harmonized_trait",
    source_pk: "harmonized_trait_id",
    fields: &[
        verbatim!("trait_name", Text),
        renamed!("description" => "i_description", Text),
        verbatim!("data_type", Text),
        verbatim!("unit", Text),
        verbatim!("is_unique_key", Bool),
        verbatim!("has_batch", Bool),
        foreign_key!(
            "harmonized_trait_set_version_id" => HarmonizedTraitSetVersion
                as "harmonized_trait_set_version"
        ),
    ],
    derived: &[DerivedField::TraitFlavorName],
    updates_expected: false,
    require_changed_after_created: true,
};

static HARMONIZED_TRAIT_ENCODED_VALUE: EntityMapping = EntityMapping {
    kind: EntityKind::HarmonizedTraitEncodedValue,
    source_table: "harmonized_trait_encoded_values",
    source_pk: "id",
    fields: &[
        verbatim!("category", Text),
        verbatim!("value", Text),
        foreign_key!("harmonized_trait_id" => HarmonizedTrait as "harmonized_trait"),
    ],
    derived: &[],
    updates_expected: false,
    require_changed_after_created: true,
};
