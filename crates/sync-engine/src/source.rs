//! Source-side collaborators.
//!
//! The engine reads the source through [`SourceReader`] and freezes it with
//! a [`SnapshotLock`]. Both come from a [`SourceConnector`], which must hand
//! them out on separate connections so locking cannot deadlock against
//! the querying side.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mysql_types::RawRow;
use std::collections::BTreeSet;
use std::sync::Arc;
use sync_core::{EntityMapping, JoinSource, SourcePk};

/// Which rows of an entity table to read.
#[derive(Debug, Clone, PartialEq)]
pub enum RowFilter {
    /// Every row.
    All,
    /// Rows not yet imported.
    ExcludingPks(BTreeSet<SourcePk>),
    /// Imported rows modified after `since`.
    ChangedSince {
        pks: BTreeSet<SourcePk>,
        since: DateTime<Utc>,
        require_changed_after_created: bool,
    },
}

#[derive(Debug, Clone)]
pub struct RowQuery {
    pub table: &'static str,
    pub pk_column: &'static str,
    pub filter: RowFilter,
}

impl RowQuery {
    pub fn new(mapping: &EntityMapping, filter: RowFilter) -> Self {
        Self {
            table: mapping.source_table,
            pk_column: mapping.source_pk,
            filter,
        }
    }
}

/// Read-only access to the source.
#[async_trait]
pub trait SourceReader: Send + Sync {
    async fn fetch_rows(&self, query: &RowQuery) -> Result<Vec<RawRow>>;

    /// Whether every table behind `join` exists in the source.
    async fn join_source_exists(&self, join: &JoinSource) -> Result<bool>;

    /// Distinct join rows for one parent. Each row carries at least
    /// `join.child_column`.
    async fn fetch_links(&self, join: &JoinSource, parent: SourcePk) -> Result<Vec<RawRow>>;
}

#[async_trait]
impl<T: SourceReader + ?Sized> SourceReader for Arc<T> {
    async fn fetch_rows(&self, query: &RowQuery) -> Result<Vec<RawRow>> {
        (**self).fetch_rows(query).await
    }

    async fn join_source_exists(&self, join: &JoinSource) -> Result<bool> {
        (**self).join_source_exists(join).await
    }

    async fn fetch_links(&self, join: &JoinSource, parent: SourcePk) -> Result<Vec<RawRow>> {
        (**self).fetch_links(join, parent).await
    }
}

/// A read lock over the whole source, held on a privileged connection.
#[async_trait]
pub trait SnapshotLock: Send {
    /// Block until the lock is held.
    async fn acquire(&mut self) -> Result<()>;

    async fn release(&mut self) -> Result<()>;
}

/// Opens the two source connections a pass needs, both pinned to UTC.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    type Reader: SourceReader;
    type Lock: SnapshotLock;

    async fn open_reader(&self) -> Result<Self::Reader>;

    async fn open_lock(&self) -> Result<Self::Lock>;
}
