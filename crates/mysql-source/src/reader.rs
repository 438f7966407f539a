//! Read-only source connection.

use anyhow::{Context, Result};
use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Row};
use mysql_types::RawRow;
use sync_core::{JoinSource, SourcePk};
use sync_engine::{RowQuery, SourceReader};
use tokio::sync::Mutex;
use tracing::debug;

use crate::query::{link_query_sql, row_query_sql};

/// Runs every query of a pass on one UTC-pinned connection.
///
/// Queries go through the text protocol so string columns arrive as raw
/// bytes for the normalizer to decode.
pub struct MySqlReader {
    conn: Mutex<Conn>,
}

impl MySqlReader {
    pub fn new(conn: Conn) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    async fn query_rows(&self, sql: String) -> Result<Vec<RawRow>> {
        debug!("Source query: {}", sql);
        let mut conn = self.conn.lock().await;
        let rows: Vec<Row> = conn
            .query(sql.as_str())
            .await
            .with_context(|| format!("Source query failed: {sql}"))?;
        Ok(rows.into_iter().map(RawRow::from_mysql).collect())
    }
}

#[async_trait]
impl SourceReader for MySqlReader {
    async fn fetch_rows(&self, query: &RowQuery) -> Result<Vec<RawRow>> {
        self.query_rows(row_query_sql(query)).await
    }

    async fn join_source_exists(&self, join: &JoinSource) -> Result<bool> {
        let mut conn = self.conn.lock().await;
        for table in join.tables {
            let count: Option<u64> = conn
                .exec_first(
                    "SELECT COUNT(*) FROM information_schema.TABLES \
                     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?",
                    (*table,),
                )
                .await?;
            if count.unwrap_or(0) == 0 {
                debug!("Join table {} not found", table);
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn fetch_links(&self, join: &JoinSource, parent: SourcePk) -> Result<Vec<RawRow>> {
        self.query_rows(link_query_sql(join, parent)).await
    }
}
