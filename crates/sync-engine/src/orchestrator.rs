//! Sync orchestrator: the single entry point for one pass.
//!
//! A pass runs: backup (unless skipped) → acquire snapshot lock → update phase
//! (entities, then relations) → import phase (entities, then relations) →
//! release lock. The lock is released whether or not the phases succeed.

use destination_store::DestinationStore;
use sync_core::SyncReport;
use tracing::{info, warn};

use crate::backup::BackupTrigger;
use crate::context::{Phase, SyncContext};
use crate::error::{PassAborted, SyncError};
use crate::importer::import_new;
use crate::links::sync_links;
use crate::scheduler::Schedule;
use crate::source::{SnapshotLock, SourceConnector, SourceReader};
use crate::updater::update_existing;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    pub import_only: bool,
    pub update_only: bool,
    pub skip_backup: bool,
    /// Restricted modes are only accepted in the designated test context.
    pub test_context: bool,
}

/// Which phases a pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phases {
    pub update: bool,
    pub import: bool,
}

impl SyncOptions {
    pub fn phases(&self) -> Result<Phases, SyncError> {
        if self.import_only && self.update_only {
            return Err(SyncError::UnsupportedMode(
                "import-only and update-only are mutually exclusive".to_string(),
            ));
        }
        if (self.import_only || self.update_only) && !self.test_context {
            return Err(SyncError::UnsupportedMode(
                "import-only and update-only runs are only allowed in the test context"
                    .to_string(),
            ));
        }
        Ok(Phases {
            update: !self.import_only,
            import: !self.update_only,
        })
    }
}

pub struct SyncOrchestrator<'a, C, S: ?Sized> {
    connector: &'a C,
    store: &'a S,
    backup: Option<&'a dyn BackupTrigger>,
    schedule: Schedule,
}

impl<'a, C, S> SyncOrchestrator<'a, C, S>
where
    C: SourceConnector,
    S: DestinationStore + ?Sized,
{
    pub fn new(connector: &'a C, store: &'a S) -> Self {
        Self {
            connector,
            store,
            backup: None,
            schedule: Schedule::standard(),
        }
    }

    pub fn with_backup(mut self, backup: &'a dyn BackupTrigger) -> Self {
        self.backup = Some(backup);
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Run one pass. On failure the returned [`PassAborted`] carries the
    /// counts reached before the failing step.
    pub async fn run(&self, options: SyncOptions) -> Result<SyncReport, PassAborted> {
        let aborted = |error: SyncError| PassAborted {
            report: SyncReport::default(),
            error,
        };

        let phases = options.phases().map_err(aborted)?;

        if options.skip_backup {
            info!("Skipping pre-sync backup");
        } else {
            let backup = self
                .backup
                .ok_or_else(|| aborted(SyncError::Backup(missing_backup())))?;
            backup
                .run_backup()
                .await
                .map_err(|e| aborted(SyncError::Backup(e)))?;
        }

        let mut lock = self
            .connector
            .open_lock()
            .await
            .map_err(|e| aborted(SyncError::LockAcquisition(e)))?;
        info!("Acquiring source snapshot lock");
        lock.acquire()
            .await
            .map_err(|e| aborted(SyncError::LockAcquisition(e)))?;
        info!("Source snapshot lock acquired");

        let (report, result) = self.run_locked(phases).await;

        match (result, lock.release().await) {
            (Ok(()), Ok(())) => {
                info!("Source snapshot lock released");
                info!(
                    "Sync pass finished: {} entity types, {} relations",
                    report.per_entity.len(),
                    report.per_relation.len()
                );
                Ok(report)
            }
            (Ok(()), Err(e)) => Err(PassAborted {
                report,
                error: SyncError::Source(e.context("Failed to release the source snapshot lock")),
            }),
            (Err(error), released) => {
                match released {
                    Ok(()) => info!("Source snapshot lock released"),
                    Err(e) => warn!("Failed to release the source snapshot lock: {e:#}"),
                }
                Err(PassAborted { report, error })
            }
        }
    }

    async fn run_locked(&self, phases: Phases) -> (SyncReport, Result<(), SyncError>) {
        let reader = match self.connector.open_reader().await {
            Ok(reader) => reader,
            Err(e) => return (SyncReport::default(), Err(SyncError::Source(e))),
        };
        let mut ctx = SyncContext::new(&reader, self.store);
        let result = self.run_phases(&mut ctx, phases).await;
        (ctx.into_report(), result)
    }

    async fn run_phases<R>(
        &self,
        ctx: &mut SyncContext<'_, R, S>,
        phases: Phases,
    ) -> Result<(), SyncError>
    where
        R: SourceReader + ?Sized,
    {
        if phases.update {
            info!("Starting update phase");
            ctx.phase = Phase::Update;
            for &kind in self.schedule.entities() {
                update_existing(ctx, kind).await?;
            }
            for &relation in self.schedule.relations() {
                sync_links(ctx, relation).await?;
            }
        }
        if phases.import {
            info!("Starting import phase");
            ctx.phase = Phase::Import;
            for &kind in self.schedule.entities() {
                import_new(ctx, kind).await?;
            }
            for &relation in self.schedule.relations() {
                sync_links(ctx, relation).await?;
            }
        }
        Ok(())
    }
}

/// The error for a pass that must back up first but has nothing to run.
pub fn missing_backup() -> anyhow::Error {
    anyhow::anyhow!("no backup is configured; skip the backup explicitly to run without one")
}
