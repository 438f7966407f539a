//! Many-to-many synchronizer.
//!
//! For each imported parent the destination link set is made equal to the
//! source join rows for that parent: missing links are added and extra ones
//! removed. Relations whose join tables are absent from the source are
//! skipped and keep whatever membership they already have.
//!
//! A link whose child is not in the destination (its row was skipped, or the
//! source is inconsistent) is deferred: it is logged, counted and retried on
//! the next pass.

use destination_store::DestinationStore;
use std::collections::BTreeSet;
use sync_core::{LinkCounts, RelationKind, SourcePk};
use tracing::{debug, info, warn};

use crate::context::{Phase, SyncContext};
use crate::error::{MappingError, SyncError};
use crate::mapper::source_key;
use crate::source::SourceReader;

pub async fn sync_links<R, S>(
    ctx: &mut SyncContext<'_, R, S>,
    relation: RelationKind,
) -> Result<LinkCounts, SyncError>
where
    R: SourceReader + ?Sized,
    S: DestinationStore + ?Sized,
{
    let mapping = relation.mapping();
    let exists = ctx
        .source
        .join_source_exists(&mapping.join)
        .await
        .map_err(SyncError::Source)?;
    if !exists {
        warn!(
            "Join source {:?} for {} not found in the source; leaving links untouched",
            mapping.join.tables, relation
        );
        return Ok(LinkCounts::default());
    }

    let parents = ctx
        .store
        .source_pks(mapping.parent)
        .await
        .map_err(SyncError::Store)?;

    let mut counts = LinkCounts::default();
    for parent in parents {
        let Some(wanted) = source_children(ctx, relation, parent).await? else {
            continue;
        };
        let current = ctx
            .store
            .linked(relation, parent)
            .await
            .map_err(SyncError::Store)?;

        let to_add: Vec<SourcePk> = wanted.difference(&current).copied().collect();
        let to_remove: Vec<SourcePk> = current.difference(&wanted).copied().collect();

        for child in to_add {
            let exists = ctx
                .store
                .contains(mapping.child, child)
                .await
                .map_err(SyncError::Store)?;
            if !exists {
                // An update-phase miss is usually a child the import phase has yet to create.
                if ctx.phase == Phase::Update {
                    debug!(
                        "Deferring {}: parent {} links to {} {}, not imported yet",
                        relation, parent, mapping.child, child
                    );
                } else {
                    warn!(
                        "Deferring {}: parent {} links to {} {}, which is not in the destination",
                        relation, parent, mapping.child, child
                    );
                }
                counts.deferred += 1;
                continue;
            }
            ctx.store
                .add_link(relation, parent, child)
                .await
                .map_err(SyncError::Store)?;
            log_link_change(relation, mapping.changes_expected, "Linked", parent, child);
            counts.added += 1;
        }
        for child in to_remove {
            ctx.store
                .remove_link(relation, parent, child)
                .await
                .map_err(SyncError::Store)?;
            log_link_change(relation, mapping.changes_expected, "Unlinked", parent, child);
            counts.removed += 1;
        }
    }

    let totals = ctx.report.relation_mut(relation);
    totals.added += counts.added;
    totals.removed += counts.removed;
    totals.deferred = counts.deferred;
    info!(
        "Synced {}: {} links added, {} links removed, {} deferred",
        relation, counts.added, counts.removed, counts.deferred
    );
    Ok(counts)
}

/// The child keys the source links to `parent`, or `None` if any join row
/// failed to normalize, in which case the parent is left as it is.
async fn source_children<R, S>(
    ctx: &SyncContext<'_, R, S>,
    relation: RelationKind,
    parent: SourcePk,
) -> Result<Option<BTreeSet<SourcePk>>, SyncError>
where
    R: SourceReader + ?Sized,
    S: DestinationStore + ?Sized,
{
    let join = &relation.mapping().join;
    let rows = ctx
        .source
        .fetch_links(join, parent)
        .await
        .map_err(SyncError::Source)?;

    let mut children = BTreeSet::new();
    for raw in rows {
        let row = match mysql_types::normalize_row(raw) {
            Ok(row) => row,
            Err(e) => {
                warn!(
                    "Skipping {} for parent {}: join row failed to normalize: {}",
                    relation, parent, e
                );
                return Ok(None);
            }
        };
        let value = row.get(join.child_column).ok_or_else(|| MappingError::InvalidKey {
            context: relation.name().to_string(),
            column: join.child_column,
            found: "no value".to_string(),
        })?;
        children.insert(source_key(relation.name(), join.child_column, value)?);
    }
    Ok(Some(children))
}

fn log_link_change(
    relation: RelationKind,
    expected: bool,
    action: &str,
    parent: SourcePk,
    child: SourcePk,
) {
    if expected {
        debug!("{} {}: parent {} child {}", action, relation, parent, child);
    } else {
        warn!(
            "Unexpected update: {} {}: parent {} child {}",
            action, relation, parent, child
        );
    }
}
