//! Per-pass state threaded through every component call.

use destination_store::DestinationStore;
use sync_core::SyncReport;

use crate::source::SourceReader;

/// Which half of a pass is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    Update,
    #[default]
    Import,
}

/// Everything one pass works against: the source reader, the destination
/// store and the counts collected so far.
pub struct SyncContext<'a, R: ?Sized, S: ?Sized> {
    pub source: &'a R,
    pub store: &'a S,
    pub report: SyncReport,
    pub phase: Phase,
}

impl<'a, R, S> SyncContext<'a, R, S>
where
    R: SourceReader + ?Sized,
    S: DestinationStore + ?Sized,
{
    pub fn new(source: &'a R, store: &'a S) -> Self {
        Self {
            source,
            store,
            report: SyncReport::default(),
            phase: Phase::default(),
        }
    }

    pub fn into_report(self) -> SyncReport {
        self.report
    }
}

impl<R: ?Sized, S: ?Sized> SyncContext<'_, R, S> {
    /// Normalize a fetched batch, dropping rows that fail. Each drop is
    /// logged and counted against `kind`.
    pub(crate) fn normalize_rows(
        &mut self,
        kind: sync_core::EntityKind,
        rows: Vec<mysql_types::RawRow>,
    ) -> Vec<sync_core::NormalizedRow> {
        let mut normalized = Vec::with_capacity(rows.len());
        for raw in rows {
            match mysql_types::normalize_row(raw) {
                Ok(row) => normalized.push(row),
                Err(e) => {
                    tracing::warn!("Skipping {} row: {}", kind, e);
                    self.report.entity_mut(kind).skipped += 1;
                }
            }
        }
        normalized
    }
}
