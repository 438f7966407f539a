//! Core types for pheno-sync.
//!
//! This crate is database-agnostic and performs no I/O. It provides:
//!
//! - [`SyncValue`] / [`NormalizedRow`] - type-clean values produced by the row normalizer
//! - [`SourceType`] / [`ValueKind`] - declared source types and destination value kinds
//! - [`EntityKind`] / [`EntityMapping`] - the synchronized entity types and their field mappings
//! - [`RelationKind`] / [`JoinSource`] - many-to-many relations and where the source keeps them
//! - [`DestinationRecord`] - a record as the destination store holds it
//! - [`SyncReport`] - per-pass counters
//!
//! # Architecture
//!
//! ```text
//! sync-core (this crate)
//!    │
//!    ├─── mysql-types         (normalizes MySQL rows into NormalizedRow)
//!    ├─── destination-store   (persists DestinationRecord and links)
//!    └─── sync-engine         (maps, imports, updates, reconciles links)
//! ```

pub mod entity;
pub mod record;
pub mod relation;
pub mod report;
pub mod types;
pub mod values;

pub use entity::{
    DerivedField, EntityKind, EntityMapping, FieldMap, SourcePk, CHANGED_COLUMN, CREATED_COLUMN,
};
pub use record::{DestinationRecord, MappedRecord, UndeclaredAttribute};
pub use relation::{JoinSource, RelationKind, RelationMapping};
pub use report::{EntityCounts, LinkCounts, SyncReport};
pub use types::{SourceType, ValueKind};
pub use values::{NormalizedRow, SyncValue};
