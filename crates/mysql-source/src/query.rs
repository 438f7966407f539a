//! SQL rendering for row and link queries.
//!
//! Keys are integers and watermarks are timestamps we format ourselves, so
//! both are inlined as literals. Identifiers come from the static mapping
//! tables and are always backtick-quoted.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use sync_core::{JoinSource, SourcePk, CHANGED_COLUMN, CREATED_COLUMN};
use sync_engine::{RowFilter, RowQuery};

pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn datetime_literal(at: &DateTime<Utc>) -> String {
    format!("'{}'", at.format("%Y-%m-%d %H:%M:%S%.6f"))
}

fn pk_list(pks: &BTreeSet<SourcePk>) -> String {
    pks.iter()
        .map(|pk| pk.0.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn row_query_sql(query: &RowQuery) -> String {
    let table = quote_ident(query.table);
    let pk = quote_ident(query.pk_column);
    let condition = match &query.filter {
        RowFilter::All => None,
        RowFilter::ExcludingPks(pks) if pks.is_empty() => None,
        RowFilter::ExcludingPks(pks) => Some(format!("{pk} NOT IN ({})", pk_list(pks))),
        RowFilter::ChangedSince { pks, .. } if pks.is_empty() => Some("FALSE".to_string()),
        RowFilter::ChangedSince {
            pks,
            since,
            require_changed_after_created,
        } => {
            let changed = quote_ident(CHANGED_COLUMN);
            let mut parts = vec![
                format!("{pk} IN ({})", pk_list(pks)),
                format!("{changed} > {}", datetime_literal(since)),
            ];
            if *require_changed_after_created {
                parts.push(format!("{changed} > {}", quote_ident(CREATED_COLUMN)));
            }
            Some(parts.join(" AND "))
        }
    };
    match condition {
        Some(condition) => format!("SELECT * FROM {table} WHERE {condition} ORDER BY {pk}"),
        None => format!("SELECT * FROM {table} ORDER BY {pk}"),
    }
}

/// Distinct child keys linked to `parent`. A union source reads every
/// table and lets `UNION` drop duplicates.
pub fn link_query_sql(join: &JoinSource, parent: SourcePk) -> String {
    let select = if join.is_union() {
        "SELECT"
    } else {
        "SELECT DISTINCT"
    };
    let child = quote_ident(join.child_column);
    let parent_column = quote_ident(join.parent_column);
    join.tables
        .iter()
        .map(|table| {
            format!(
                "{select} {child} FROM {} WHERE {parent_column} = {}",
                quote_ident(table),
                parent.0
            )
        })
        .collect::<Vec<_>>()
        .join(" UNION ")
}

pub fn lock_tables_sql(tables: &[String]) -> String {
    let list = tables
        .iter()
        .map(|t| format!("{} READ", quote_ident(t)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("LOCK TABLES {list}")
}
