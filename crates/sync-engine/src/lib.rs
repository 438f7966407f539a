//! The pheno-sync engine.
//!
//! One pass mirrors the source's study and trait metadata into the
//! destination store under a source-wide read lock:
//!
//! ```text
//! SyncOrchestrator::run
//!    ├── BackupTrigger::run_backup        (unless skipped)
//!    ├── SnapshotLock::acquire
//!    ├── update phase: update_existing(kind) per entity, then sync_links(relation)
//!    ├── import phase: import_new(kind) per entity, then sync_links(relation)
//!    └── SnapshotLock::release
//! ```
//!
//! Entity order comes from the [`scheduler`]. All per-pass state lives in a
//! [`SyncContext`].

pub mod backup;
pub mod context;
pub mod derive;
pub mod error;
pub mod importer;
pub mod links;
pub mod mapper;
pub mod orchestrator;
pub mod scheduler;
pub mod source;
pub mod testing;
pub mod updater;

pub use backup::{BackupTrigger, CommandBackup};
pub use context::{Phase, SyncContext};
pub use derive::Deriver;
pub use error::{MappingError, PassAborted, SyncError};
pub use importer::import_new;
pub use links::sync_links;
pub use orchestrator::{Phases, SyncOptions, SyncOrchestrator};
pub use scheduler::{Schedule, ScheduleError};
pub use source::{RowFilter, RowQuery, SnapshotLock, SourceConnector, SourceReader};
pub use updater::update_existing;
