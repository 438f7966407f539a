//! Derived attributes.
//!
//! A few attributes are not copied from a column but built from the
//! record's own values and its parents already in the destination: the
//! study `phs`, versioned dbGaP accessions, dbGaP links and harmonized
//! trait flavor names. They are recomputed whenever a record is created or
//! updated, so an updated version or accession carries through.

use destination_store::DestinationStore;
use std::collections::HashMap;
use sync_core::{
    DerivedField, DestinationRecord, EntityKind, MappedRecord, SourcePk, SyncValue,
};
use tracing::warn;

use crate::error::{MappingError, SyncError};

const DBGAP_CGI: &str = "http://www.ncbi.nlm.nih.gov/projects/gap/cgi-bin";

/// Fills in derived attributes, remembering parent records fetched during
/// the batch.
pub struct Deriver<'a, S: ?Sized> {
    store: &'a S,
    parents: HashMap<(EntityKind, SourcePk), Option<DestinationRecord>>,
}

impl<'a, S: DestinationStore + ?Sized> Deriver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            parents: HashMap::new(),
        }
    }

    /// Set every derived attribute `record`'s entity type declares.
    ///
    /// A value whose inputs are missing is left unset with a warning.
    pub async fn derive(&mut self, record: &mut MappedRecord) -> Result<(), SyncError> {
        for &field in record.kind.mapping().derived {
            match self.compute(record, field).await? {
                Some(value) => {
                    record
                        .attributes
                        .insert(field.attribute().to_string(), SyncValue::Text(value));
                }
                None => warn!(
                    "Cannot derive {} for {} {}: an input is missing",
                    field.attribute(),
                    record.kind,
                    record.source_pk
                ),
            }
        }
        Ok(())
    }

    async fn compute(
        &mut self,
        record: &MappedRecord,
        field: DerivedField,
    ) -> Result<Option<String>, SyncError> {
        use DerivedField::*;
        use EntityKind::*;

        let value = match (record.kind, field) {
            (Study, Phs) => Some(phs(record.source_pk.0)),
            (SourceStudyVersion, FullAccession) => {
                let Some(study) = self.parent(record, "study", Study).await? else {
                    return Ok(None);
                };
                let phs = text(study.value("phs"))?;
                let version = int(record.value("i_version"))?;
                let participant_set = int(record.value("i_participant_set"))?;
                match (phs, version, participant_set) {
                    (Some(phs), Some(v), Some(p)) => Some(format!("{phs}.v{v}.p{p}")),
                    _ => None,
                }
            }
            (SourceStudyVersion, DbgapLink) => text(record.value("full_accession"))?
                .map(|accession| format!("{DBGAP_CGI}/study.cgi?study_id={accession}")),
            (SourceDataset, FullAccession) => {
                let Some(version) = self
                    .parent(record, "source_study_version", SourceStudyVersion)
                    .await?
                else {
                    return Ok(None);
                };
                let participant_set = int(version.value("i_participant_set"))?;
                let accession = int(record.value("i_accession"))?;
                let dataset_version = int(record.value("i_version"))?;
                match (accession, dataset_version, participant_set) {
                    (Some(a), Some(v), Some(p)) => Some(format!("pht{a:06}.v{v}.p{p}")),
                    _ => None,
                }
            }
            (SourceDataset, DbgapLink) => {
                let Some(version) = self
                    .parent(record, "source_study_version", SourceStudyVersion)
                    .await?
                else {
                    return Ok(None);
                };
                let study_accession = text(version.value("full_accession"))?;
                let dataset_accession = text(record.value("full_accession"))?;
                match (study_accession, dataset_accession) {
                    (Some(study), Some(dataset)) => Some(format!(
                        "{DBGAP_CGI}/dataset.cgi?study_id={study}&pht={dataset}"
                    )),
                    _ => None,
                }
            }
            (SourceTrait, FullAccession) => {
                let Some(version) = self.study_version_of_trait(record).await? else {
                    return Ok(None);
                };
                let participant_set = int(version.value("i_participant_set"))?;
                let accession = int(record.value("i_dbgap_variable_accession"))?;
                let variable_version = int(record.value("i_dbgap_variable_version"))?;
                match (accession, variable_version, participant_set) {
                    (Some(a), Some(v), Some(p)) => Some(format!("phv{a:08}.v{v}.p{p}")),
                    _ => None,
                }
            }
            (SourceTrait, DbgapLink) => {
                let Some(version) = self.study_version_of_trait(record).await? else {
                    return Ok(None);
                };
                let study_accession = text(version.value("full_accession"))?;
                let accession = int(record.value("i_dbgap_variable_accession"))?;
                match (study_accession, accession) {
                    (Some(study), Some(a)) => Some(format!(
                        "{DBGAP_CGI}/variable.cgi?study_id={study}&phv={a:08}"
                    )),
                    _ => None,
                }
            }
            (HarmonizedTrait, TraitFlavorName) => {
                let Some(set_version) = self
                    .parent(
                        record,
                        "harmonized_trait_set_version",
                        HarmonizedTraitSetVersion,
                    )
                    .await?
                else {
                    return Ok(None);
                };
                let Some(set) = self
                    .grandparent(&set_version, "harmonized_trait_set", HarmonizedTraitSet)
                    .await?
                else {
                    return Ok(None);
                };
                let flavor = int(set.value("i_flavor"))?;
                let name = text(record.value("i_trait_name"))?;
                match (name, flavor) {
                    (Some(name), Some(flavor)) => Some(format!("{name}_{flavor}")),
                    _ => None,
                }
            }
            _ => None,
        };
        Ok(value)
    }

    async fn study_version_of_trait(
        &mut self,
        record: &MappedRecord,
    ) -> Result<Option<DestinationRecord>, SyncError> {
        let Some(dataset) = self
            .parent(record, "source_dataset", EntityKind::SourceDataset)
            .await?
        else {
            return Ok(None);
        };
        self.grandparent(
            &dataset,
            "source_study_version",
            EntityKind::SourceStudyVersion,
        )
        .await
    }

    async fn parent(
        &mut self,
        record: &MappedRecord,
        attribute: &str,
        kind: EntityKind,
    ) -> Result<Option<DestinationRecord>, SyncError> {
        match record.parents.get(attribute) {
            Some(&pk) => self.fetch(kind, pk).await,
            None => Ok(None),
        }
    }

    async fn grandparent(
        &mut self,
        parent: &DestinationRecord,
        attribute: &str,
        kind: EntityKind,
    ) -> Result<Option<DestinationRecord>, SyncError> {
        match parent.parent(attribute) {
            Some(pk) => self.fetch(kind, pk).await,
            None => Ok(None),
        }
    }

    async fn fetch(
        &mut self,
        kind: EntityKind,
        pk: SourcePk,
    ) -> Result<Option<DestinationRecord>, SyncError> {
        if let Some(cached) = self.parents.get(&(kind, pk)) {
            return Ok(cached.clone());
        }
        let record = self.store.get(kind, pk).await.map_err(SyncError::Store)?;
        self.parents.insert((kind, pk), record.clone());
        Ok(record)
    }
}

/// `phs` followed by the zero-padded study accession.
pub fn phs(accession: i64) -> String {
    format!("phs{accession:06}")
}

fn int(
    value: Result<Option<&SyncValue>, sync_core::UndeclaredAttribute>,
) -> Result<Option<i64>, MappingError> {
    Ok(value?.and_then(SyncValue::as_i64))
}

fn text(
    value: Result<Option<&SyncValue>, sync_core::UndeclaredAttribute>,
) -> Result<Option<String>, MappingError> {
    Ok(value?
        .and_then(SyncValue::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string))
}
