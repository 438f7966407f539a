//! Opens the reader and lock connections for a pass.

use anyhow::Result;
use async_trait::async_trait;
use mysql_async::Pool;
use sync_engine::SourceConnector;
use tracing::debug;

use crate::client::{new_mysql_pool, sanitize_connection_string, utc_conn};
use crate::lock::MySqlLock;
use crate::reader::MySqlReader;

/// Connection settings for one source environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOpts {
    /// Read-only account used for every query.
    pub readonly_uri: String,
    /// Account with the LOCK TABLES privilege.
    pub lock_uri: String,
    /// Seconds to wait for the table lock before giving up. Server default if unset.
    pub lock_wait_timeout: Option<u64>,
}

pub struct MySqlConnector {
    readonly: Pool,
    privileged: Pool,
    lock_wait_timeout: Option<u64>,
}

impl MySqlConnector {
    pub fn new(opts: &SourceOpts) -> Result<Self> {
        debug!(
            "Source connections: read-only {}, lock {}",
            sanitize_connection_string(&opts.readonly_uri),
            sanitize_connection_string(&opts.lock_uri)
        );
        Ok(Self {
            readonly: new_mysql_pool(&opts.readonly_uri)?,
            privileged: new_mysql_pool(&opts.lock_uri)?,
            lock_wait_timeout: opts.lock_wait_timeout,
        })
    }

    /// Close both pools. Connections still held by a reader or lock are
    /// closed when those are dropped.
    pub async fn disconnect(self) -> Result<()> {
        self.readonly.disconnect().await?;
        self.privileged.disconnect().await?;
        Ok(())
    }
}

#[async_trait]
impl SourceConnector for MySqlConnector {
    type Reader = MySqlReader;
    type Lock = MySqlLock;

    async fn open_reader(&self) -> Result<MySqlReader> {
        Ok(MySqlReader::new(utc_conn(&self.readonly).await?))
    }

    async fn open_lock(&self) -> Result<MySqlLock> {
        Ok(MySqlLock::new(
            utc_conn(&self.privileged).await?,
            self.lock_wait_timeout,
        ))
    }
}
