//! pheno-sync
//!
//! Mirrors genomic study and trait metadata from a read-only MySQL source
//! database into a destination store. Each pass runs under a source-wide
//! read lock and is idempotent: a second pass over an unchanged source
//! changes nothing.
//!
//! The work is split across the workspace crates:
//!
//! - `sync_core` - normalized values, entity and relation mapping tables, reports
//! - `mysql_types` - raw MySQL rows and the row normalizer
//! - `destination_store` - the store trait with in-memory and SurrealDB backends
//! - `sync_engine` - mapper, importer, updater, link sync, scheduler and orchestrator
//! - `mysql_source` - the MySQL reader and snapshot lock
//!
//! This crate adds configuration loading and the wiring used by the CLI.
//!
//! # CLI Usage
//!
//! ```bash
//! # Full pass against the devel source
//! pheno-sync sync --environment devel --config pheno-sync.toml
//!
//! # Import-only pass, test environment only
//! pheno-sync sync --environment test --config pheno-sync.toml --import-only --no-backup
//!
//! # Show the processing order
//! pheno-sync schedule
//! ```

pub mod config;
pub mod sync;

pub use config::{Config, DestinationOverrides, Environment};
pub use sync::{describe_schedule, emit_report, run_pass, run_with_store, SyncRequest};
