//! Wiring for one sync pass: config → connector, store and backup →
//! orchestrator → report.

use anyhow::{Context, Result};
use destination_store::{surreal_connect, DestinationStore, MemoryStore, SurrealStore};
use mysql_source::MySqlConnector;
use std::fmt::Write as _;
use std::path::Path;
use sync_core::SyncReport;
use sync_engine::orchestrator::missing_backup;
use sync_engine::{
    BackupTrigger, CommandBackup, PassAborted, Schedule, SourceConnector, SyncError,
    SyncOptions, SyncOrchestrator,
};
use tracing::{info, warn};

use crate::config::{Config, Environment};

/// What the command line asked for.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub environment: Environment,
    pub import_only: bool,
    pub update_only: bool,
    pub skip_backup: bool,
}

impl SyncRequest {
    pub fn options(&self) -> SyncOptions {
        SyncOptions {
            import_only: self.import_only,
            update_only: self.update_only,
            skip_backup: self.skip_backup,
            test_context: self.environment == Environment::Test,
        }
    }
}

/// Run one pass as configured.
///
/// The outer error covers setup (bad config, unreachable destination); the
/// inner one is an aborted pass, which still carries a report.
pub async fn run_pass(
    config: &Config,
    request: &SyncRequest,
) -> Result<Result<SyncReport, PassAborted>> {
    let options = request.options();
    // Reject bad mode combinations and a missing backup before opening any connection.
    let early = match options.phases() {
        Err(error) => Some(error),
        Ok(_) if config.backup.is_none() && !options.skip_backup => Some(SyncError::Backup(
            missing_backup().context("add a [backup] table or pass --no-backup"),
        )),
        Ok(_) => None,
    };
    if let Some(error) = early {
        return Ok(Err(PassAborted {
            report: SyncReport::default(),
            error,
        }));
    }

    info!("Starting sync pass against the {} source", request.environment);
    let source = config.source_for(request.environment)?;
    let connector = MySqlConnector::new(&source)?;
    let backup = config
        .backup
        .as_ref()
        .map(|b| CommandBackup::new(b.program.clone(), b.args.clone()));
    let backup = backup.as_ref().map(|b| b as &dyn BackupTrigger);

    let outcome = if config.destination.is_memory() {
        warn!("Destination is in memory; results are discarded when the pass ends");
        let store = MemoryStore::new();
        run_with_store(&connector, &store, backup, options).await
    } else {
        let client = surreal_connect(&config.destination.to_opts()).await?;
        let store = SurrealStore::new(client);
        run_with_store(&connector, &store, backup, options).await
    };

    if let Err(e) = connector.disconnect().await {
        warn!("Failed to close source connections: {e:#}");
    }
    Ok(outcome)
}

/// Run one pass over an already opened connector and store.
pub async fn run_with_store<C, S>(
    connector: &C,
    store: &S,
    backup: Option<&dyn BackupTrigger>,
    options: SyncOptions,
) -> Result<SyncReport, PassAborted>
where
    C: SourceConnector,
    S: DestinationStore + ?Sized,
{
    let mut orchestrator = SyncOrchestrator::new(connector, store);
    if let Some(backup) = backup {
        orchestrator = orchestrator.with_backup(backup);
    }
    orchestrator.run(options).await
}

/// Print `report` as JSON on stdout and, if given, write it to `path`.
pub fn emit_report(report: &SyncReport, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    if let Some(path) = path {
        std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }
    Ok(())
}

/// Human-readable processing order.
pub fn describe_schedule(schedule: &Schedule) -> String {
    let mut out = String::from("Entity types:\n");
    for (i, kind) in schedule.entities().iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {} ({})", i + 1, kind, kind.mapping().source_table);
    }
    out.push_str("Relations:\n");
    for (i, relation) in schedule.relations().iter().enumerate() {
        let mapping = relation.mapping();
        let _ = writeln!(
            out,
            "  {:>2}. {} ({})",
            i + 1,
            relation,
            mapping.join.tables.join(" + ")
        );
    }
    out
}
