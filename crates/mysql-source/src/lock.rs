//! Source-wide read lock.

use anyhow::{Context, Result};
use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::Conn;
use sync_engine::SnapshotLock;
use tracing::{debug, info, warn};

use crate::query::lock_tables_sql;

/// Holds `LOCK TABLES ... READ` over every base table of the source
/// database on its own privileged connection.
///
/// Writers block while the lock is held; readers on other connections do
/// not. `UNLOCK TABLES` on [`release`](SnapshotLock::release) ends it.
pub struct MySqlLock {
    conn: Conn,
    lock_wait_timeout: Option<u64>,
    held: bool,
}

impl MySqlLock {
    pub fn new(conn: Conn, lock_wait_timeout: Option<u64>) -> Self {
        Self {
            conn,
            lock_wait_timeout,
            held: false,
        }
    }

    async fn base_tables(&mut self) -> Result<Vec<String>> {
        let tables: Vec<String> = self
            .conn
            .query(
                "SELECT TABLE_NAME FROM information_schema.TABLES \
                 WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE' \
                 ORDER BY TABLE_NAME",
            )
            .await?;
        Ok(tables)
    }
}

#[async_trait]
impl SnapshotLock for MySqlLock {
    async fn acquire(&mut self) -> Result<()> {
        if let Some(seconds) = self.lock_wait_timeout {
            self.conn
                .query_drop(format!("SET SESSION lock_wait_timeout = {seconds}"))
                .await?;
        }
        let tables = self.base_tables().await?;
        if tables.is_empty() {
            warn!("Source database has no base tables to lock");
            return Ok(());
        }
        debug!("Locking {} source tables", tables.len());
        self.conn
            .query_drop(lock_tables_sql(&tables))
            .await
            .context("LOCK TABLES failed")?;
        self.held = true;
        info!("Locked {} source tables for reading", tables.len());
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        if !self.held {
            return Ok(());
        }
        self.conn
            .query_drop("UNLOCK TABLES")
            .await
            .context("UNLOCK TABLES failed")?;
        self.held = false;
        Ok(())
    }
}
