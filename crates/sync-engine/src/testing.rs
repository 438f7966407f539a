//! In-memory test doubles for the source side of a pass.
//!
//! [`FakeSource`] keeps raw rows per table and evaluates [`RowFilter`]s and
//! join lookups the way a real source would. Every query, lock transition
//! and backup is appended to one event log so tests can assert ordering.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Timelike, Utc};
use mysql_async::consts::ColumnType;
use mysql_async::Value;
use mysql_types::{normalize_value, RawColumn, RawRow};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use sync_core::{JoinSource, SourcePk, SyncValue, CHANGED_COLUMN, CREATED_COLUMN};

use crate::backup::BackupTrigger;
use crate::source::{RowFilter, RowQuery, SnapshotLock, SourceConnector, SourceReader};

/// Builder for one raw source row.
#[derive(Debug, Clone, Default)]
pub struct FakeRow {
    columns: Vec<RawColumn>,
}

impl FakeRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(mut self, name: &str, column_type: ColumnType, value: Value) -> Self {
        self.columns.retain(|c| c.name != name);
        self.columns.push(RawColumn::new(name, column_type, value));
        self
    }

    pub fn int(self, name: &str, value: i64) -> Self {
        self.raw(name, ColumnType::MYSQL_TYPE_LONGLONG, Value::Int(value))
    }

    /// Text as the text protocol delivers it: a byte buffer.
    pub fn text(self, name: &str, value: &str) -> Self {
        self.raw(
            name,
            ColumnType::MYSQL_TYPE_VAR_STRING,
            Value::Bytes(value.as_bytes().to_vec()),
        )
    }

    pub fn flag(self, name: &str, value: bool) -> Self {
        self.raw(name, ColumnType::MYSQL_TYPE_TINY, Value::Int(i64::from(value)))
    }

    pub fn datetime(self, name: &str, value: DateTime<Utc>) -> Self {
        self.raw(
            name,
            ColumnType::MYSQL_TYPE_DATETIME,
            Value::Date(
                value.year() as u16,
                value.month() as u8,
                value.day() as u8,
                value.hour() as u8,
                value.minute() as u8,
                value.second() as u8,
                value.timestamp_subsec_micros(),
            ),
        )
    }

    pub fn null(self, name: &str, column_type: ColumnType) -> Self {
        self.raw(name, column_type, Value::NULL)
    }

    /// Set both watermarks.
    pub fn stamped(self, added: DateTime<Utc>, changed: DateTime<Utc>) -> Self {
        self.datetime(CREATED_COLUMN, added)
            .datetime(CHANGED_COLUMN, changed)
    }

    pub fn into_raw(self) -> RawRow {
        RawRow::new(self.columns)
    }

    fn value(&self, name: &str) -> Option<SyncValue> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .and_then(|c| normalize_value(c).ok())
    }

    fn key(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(|v| v.as_i64())
    }

    fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.value(name).and_then(|v| v.as_datetime())
    }

    fn matches(&self, pk_column: &str, filter: &RowFilter) -> bool {
        let pk = self.key(pk_column).map(SourcePk);
        match filter {
            RowFilter::All => true,
            RowFilter::ExcludingPks(pks) => pk.is_some_and(|pk| !pks.contains(&pk)),
            RowFilter::ChangedSince {
                pks,
                since,
                require_changed_after_created,
            } => {
                let (Some(pk), Some(changed)) = (pk, self.timestamp(CHANGED_COLUMN)) else {
                    return false;
                };
                let after_created = !require_changed_after_created
                    || self
                        .timestamp(CREATED_COLUMN)
                        .is_some_and(|created| changed > created);
                pks.contains(&pk) && changed > *since && after_created
            }
        }
    }
}

#[derive(Debug, Default)]
struct FakeState {
    tables: BTreeMap<String, Vec<FakeRow>>,
    events: Vec<String>,
}

/// An in-memory source database.
#[derive(Debug, Default)]
pub struct FakeSource {
    state: Mutex<FakeState>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: String) {
        self.state().events.push(event);
    }

    /// Register an empty table.
    pub fn create_table(&self, table: &str) {
        self.state().tables.entry(table.to_string()).or_default();
    }

    pub fn drop_table(&self, table: &str) {
        self.state().tables.remove(table);
    }

    pub fn insert(&self, table: &str, row: FakeRow) {
        self.state()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Replace the row whose `column` equals `key`.
    pub fn replace(&self, table: &str, column: &str, key: i64, row: FakeRow) {
        let mut state = self.state();
        let rows = state.tables.entry(table.to_string()).or_default();
        rows.retain(|r| r.key(column) != Some(key));
        rows.push(row);
    }

    /// Delete every row whose `column` equals `key`.
    pub fn delete(&self, table: &str, column: &str, key: i64) {
        if let Some(rows) = self.state().tables.get_mut(table) {
            rows.retain(|r| r.key(column) != Some(key));
        }
    }

    /// Every query, lock transition and backup so far, in order.
    pub fn events(&self) -> Vec<String> {
        self.state().events.clone()
    }

    pub fn clear_events(&self) {
        self.state().events.clear();
    }
}

#[async_trait]
impl SourceReader for FakeSource {
    async fn fetch_rows(&self, query: &RowQuery) -> Result<Vec<RawRow>> {
        self.record(format!("rows:{}", query.table));
        let state = self.state();
        let Some(rows) = state.tables.get(query.table) else {
            bail!("Table '{}' doesn't exist", query.table);
        };
        Ok(rows
            .iter()
            .filter(|row| row.matches(query.pk_column, &query.filter))
            .cloned()
            .map(FakeRow::into_raw)
            .collect())
    }

    async fn join_source_exists(&self, join: &JoinSource) -> Result<bool> {
        let state = self.state();
        Ok(join.tables.iter().all(|t| state.tables.contains_key(*t)))
    }

    async fn fetch_links(&self, join: &JoinSource, parent: SourcePk) -> Result<Vec<RawRow>> {
        self.record(format!("links:{}", join.tables.join("+")));
        let state = self.state();
        let mut seen = BTreeSet::new();
        let mut links = Vec::new();
        for table in join.tables {
            let Some(rows) = state.tables.get(*table) else {
                bail!("Table '{}' doesn't exist", table);
            };
            for row in rows {
                if row.key(join.parent_column) != Some(parent.0) {
                    continue;
                }
                let Some(child) = row.columns.iter().find(|c| c.name == join.child_column)
                else {
                    continue;
                };
                if seen.insert(format!("{:?}", child.value)) {
                    links.push(RawRow::new(vec![child.clone()]));
                }
            }
        }
        Ok(links)
    }
}

/// Snapshot lock that records its transitions in the source's event log.
pub struct FakeLock {
    source: Arc<FakeSource>,
    fail: bool,
}

#[async_trait]
impl SnapshotLock for FakeLock {
    async fn acquire(&mut self) -> Result<()> {
        if self.fail {
            self.source.record("lock:failed".to_string());
            bail!("Lock wait timeout exceeded; try restarting transaction");
        }
        self.source.record("lock:acquire".to_string());
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        self.source.record("lock:release".to_string());
        Ok(())
    }
}

/// Connector over a shared [`FakeSource`] that counts opened connections.
pub struct FakeConnector {
    source: Arc<FakeSource>,
    opened: AtomicUsize,
    fail_lock: bool,
}

impl FakeConnector {
    pub fn new(source: Arc<FakeSource>) -> Self {
        Self {
            source,
            opened: AtomicUsize::new(0),
            fail_lock: false,
        }
    }

    /// Make every lock acquisition fail.
    pub fn with_failing_lock(mut self) -> Self {
        self.fail_lock = true;
        self
    }

    pub fn connections_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceConnector for FakeConnector {
    type Reader = Arc<FakeSource>;
    type Lock = FakeLock;

    async fn open_reader(&self) -> Result<Self::Reader> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.source))
    }

    async fn open_lock(&self) -> Result<Self::Lock> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeLock {
            source: Arc::clone(&self.source),
            fail: self.fail_lock,
        })
    }
}

/// Backup trigger that records each run in the source's event log.
pub struct RecordingBackup {
    source: Arc<FakeSource>,
    runs: AtomicUsize,
    fail: bool,
}

impl RecordingBackup {
    pub fn new(source: Arc<FakeSource>) -> Self {
        Self {
            source,
            runs: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackupTrigger for RecordingBackup {
    async fn run_backup(&self) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.source.record("backup".to_string());
        if self.fail {
            bail!("backup destination is full");
        }
        Ok(())
    }
}
