//! Entity importer: creates destination records for source rows not yet imported.

use chrono::Utc;
use destination_store::DestinationStore;
use sync_core::EntityKind;
use tracing::{debug, info};

use crate::context::SyncContext;
use crate::derive::Deriver;
use crate::error::SyncError;
use crate::mapper::{map_fields, ParentResolver};
use crate::source::{RowFilter, RowQuery, SourceReader};

/// Import every source row of `kind` whose primary key is not yet in the
/// destination. Returns the number of records created.
///
/// The whole batch is mapped, its foreign keys checked and its derived
/// attributes filled in before the first write, so a mapping failure or
/// dangling reference leaves `kind` untouched.
pub async fn import_new<R, S>(
    ctx: &mut SyncContext<'_, R, S>,
    kind: EntityKind,
) -> Result<usize, SyncError>
where
    R: SourceReader + ?Sized,
    S: DestinationStore + ?Sized,
{
    let mapping = kind.mapping();
    let existing = ctx.store.source_pks(kind).await.map_err(SyncError::Store)?;
    let filter = if existing.is_empty() {
        RowFilter::All
    } else {
        RowFilter::ExcludingPks(existing)
    };

    debug!("Importing new {} rows from {}", kind, mapping.source_table);
    let rows = ctx
        .source
        .fetch_rows(&RowQuery::new(mapping, filter))
        .await
        .map_err(SyncError::Source)?;
    let rows = ctx.normalize_rows(kind, rows);

    let mut resolver = ParentResolver::new(ctx.store);
    let mut deriver = Deriver::new(ctx.store);
    let mut staged = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut mapped = map_fields(mapping, row)?;
        resolver.check(mapping, &mapped).await?;
        deriver.derive(&mut mapped).await?;
        staged.push(mapped);
    }

    let now = Utc::now();
    let created = staged.len();
    for mapped in staged {
        ctx.store
            .create(mapped.into_new_record(now))
            .await
            .map_err(SyncError::Store)?;
    }

    ctx.report.entity_mut(kind).created += created;
    info!("Imported {} new {} records", created, kind);
    Ok(created)
}
