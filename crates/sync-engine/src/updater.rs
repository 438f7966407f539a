//! Entity updater: applies field-level changes to records already imported.

use chrono::{DateTime, Utc};
use destination_store::DestinationStore;
use sync_core::{DestinationRecord, EntityKind, MappedRecord};
use tracing::{debug, info, warn};

use crate::context::SyncContext;
use crate::derive::Deriver;
use crate::error::SyncError;
use crate::mapper::{map_fields, ParentResolver};
use crate::source::{RowFilter, RowQuery, SourceReader};

/// Re-read imported rows of `kind` whose source changed watermark is past
/// the destination's high-water mark and apply any differing fields.
///
/// Returns the number of records with at least one changed field. Whether a
/// change is logged as expected or unexpected comes from the entity mapping.
pub async fn update_existing<R, S>(
    ctx: &mut SyncContext<'_, R, S>,
    kind: EntityKind,
) -> Result<usize, SyncError>
where
    R: SourceReader + ?Sized,
    S: DestinationStore + ?Sized,
{
    let mapping = kind.mapping();
    let existing = ctx.store.source_pks(kind).await.map_err(SyncError::Store)?;
    if existing.is_empty() {
        debug!("{} has no imported records to check for updates", kind);
        return Ok(0);
    }
    let Some(since) = ctx
        .store
        .latest_changed_watermark(kind)
        .await
        .map_err(SyncError::Store)?
    else {
        return Ok(0);
    };

    debug!("Checking {} for rows changed after {}", kind, since.to_rfc3339());
    let filter = RowFilter::ChangedSince {
        pks: existing,
        since,
        require_changed_after_created: mapping.require_changed_after_created,
    };
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
    let mut updated = 0;
    for mapped in staged {
        let Some(mut record) = ctx
            .store
            .get(kind, mapped.source_pk)
            .await
            .map_err(SyncError::Store)?
        else {
            warn!(
                "{} {} was returned as changed but is not in the destination",
                kind, mapped.source_pk
            );
            continue;
        };
        let previous_watermark = record.changed_watermark;
        let changed = apply_changes(&mut record, mapped, mapping.updates_expected, now);
        if changed == 0 && record.changed_watermark == previous_watermark {
            continue;
        }
        if changed > 0 {
            updated += 1;
        }
        ctx.store.update(record).await.map_err(SyncError::Store)?;
    }

    ctx.report.entity_mut(kind).updated += updated;
    info!("Updated {} existing {} records", updated, kind);
    Ok(updated)
}

/// Copy every differing field of `mapped` onto `record` and advance the
/// changed watermark. Returns how many fields changed; the watermark itself
/// is not counted.
pub fn apply_changes(
    record: &mut DestinationRecord,
    mapped: MappedRecord,
    expected: bool,
    now: DateTime<Utc>,
) -> usize {
    let kind = record.kind;
    let pk = record.source_pk;
    let mut changed = 0;

    let mut report = |field: &str, old: String, new: String| {
        changed += 1;
        if expected {
            debug!("Updated {} {}: {} changed from {} to {}", kind, pk, field, old, new);
        } else {
            warn!(
                "Unexpected update: {} {}: {} changed from {} to {}",
                kind, pk, field, old, new
            );
        }
    };

    for (attribute, value) in mapped.attributes {
        let old = record.attributes.get(&attribute);
        if old != Some(&value) {
            let old = old.map_or_else(|| "<unset>".to_string(), ToString::to_string);
            report(&attribute, old, value.to_string());
            record.attributes.insert(attribute, value);
        }
    }

    for (attribute, parent) in mapped.parents {
        let old = record.parents.get(&attribute).copied();
        if old != Some(parent) {
            let old = old.map_or_else(|| "<unset>".to_string(), |pk| pk.to_string());
            report(&attribute, old, parent.to_string());
            record.parents.insert(attribute, parent);
        }
    }

    if record.created_watermark != mapped.created_watermark {
        report(
            "i_date_added",
            record.created_watermark.to_rfc3339(),
            mapped.created_watermark.to_rfc3339(),
        );
        record.created_watermark = mapped.created_watermark;
    }

    // Never move the watermark backwards.
    let advanced = mapped.changed_watermark > record.changed_watermark;
    if advanced {
        record.changed_watermark = mapped.changed_watermark;
    }
    if changed > 0 || advanced {
        record.modified_at = now;
    }
    changed
}
