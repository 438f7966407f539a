//! MySQL side of pheno-sync.
//!
//! A pass needs two connections to the source database:
//! - a read-only one, wrapped in [`MySqlReader`], for every query
//! - a privileged one, wrapped in [`MySqlLock`], that holds
//!   `LOCK TABLES ... READ` over every base table for the length of the pass
//!
//! [`MySqlConnector`] opens both from a [`SourceOpts`].

pub mod client;
pub mod connector;
pub mod lock;
pub mod query;
pub mod reader;

pub use client::{new_mysql_pool, sanitize_connection_string};
pub use connector::{MySqlConnector, SourceOpts};
pub use lock::MySqlLock;
pub use reader::MySqlReader;
