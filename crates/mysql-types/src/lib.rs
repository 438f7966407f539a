//! MySQL row normalization for pheno-sync.
//!
//! The engine never sees `mysql_async` values directly. A query result is
//! captured as a [`RawRow`] (column name, declared column type, flags and
//! raw value) and then turned into a [`sync_core::NormalizedRow`] by
//! [`normalize_row`]:
//!
//! - byte buffers are decoded to text or parsed according to the declared type
//! - NULL becomes `""` for textual columns and stays NULL elsewhere
//! - timestamps are pinned to UTC, the offset both source connections use
//!
//! # Example
//!
//! ```rust,ignore
//! use mysql_types::{normalize_row, RawRow};
//!
//! let rows: Vec<mysql_async::Row> = conn.query("SELECT * FROM study").await?;
//! for row in rows {
//!     let normalized = normalize_row(RawRow::from_mysql(row))?;
//! }
//! ```

pub mod normalize;
pub mod row;

pub use normalize::{classify, normalize_row, normalize_value, NormalizationError};
pub use row::{RawColumn, RawRow};
