//! Error taxonomy for a sync pass.
//!
//! Row-level normalization failures never reach this type: they are logged,
//! counted as skipped and the batch continues. Everything here ends the pass.

use sync_core::{EntityKind, SourcePk, SyncReport, UndeclaredAttribute, ValueKind};
use thiserror::Error;

/// A normalized row does not fit its entity mapping.
///
/// This points at a source schema change, so the pass stops rather than
/// writing a partially mapped record.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("{kind} row is missing column `{column}`")]
    MissingColumn {
        kind: EntityKind,
        column: &'static str,
    },
    #[error("{kind} column `{column}` should hold {expected}, found {found}")]
    KindMismatch {
        kind: EntityKind,
        column: &'static str,
        expected: ValueKind,
        found: String,
    },
    #[error("{context} column `{column}` should hold an integer key, found {found}")]
    InvalidKey {
        context: String,
        column: &'static str,
        found: String,
    },
    #[error("{kind} {pk} has no `{column}` watermark")]
    MissingWatermark {
        kind: EntityKind,
        pk: SourcePk,
        column: &'static str,
    },
    #[error(transparent)]
    Undeclared(#[from] UndeclaredAttribute),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{kind} {pk}: `{attribute}` references {parent} {parent_pk}, which is not in the destination")]
    DanglingReference {
        kind: EntityKind,
        pk: SourcePk,
        attribute: &'static str,
        parent: EntityKind,
        parent_pk: SourcePk,
    },

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("unsupported mode: {0}")]
    UnsupportedMode(String),

    #[error("backup failed: {0:#}")]
    Backup(anyhow::Error),

    #[error("could not acquire the source snapshot lock: {0:#}")]
    LockAcquisition(anyhow::Error),

    #[error("source query failed: {0:#}")]
    Source(anyhow::Error),

    #[error("destination store failed: {0:#}")]
    Store(anyhow::Error),
}

/// A pass that stopped early, with the counts it reached before stopping.
#[derive(Debug, Error)]
#[error("sync pass aborted: {error}")]
pub struct PassAborted {
    pub report: SyncReport,
    #[source]
    pub error: SyncError,
}
