//! Raw rows captured from a MySQL result set.

use mysql_async::consts::{ColumnFlags, ColumnType};
use mysql_async::{Row, Value};

/// One column of a raw row: the value plus the schema needed to interpret it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub flags: ColumnFlags,
    pub value: Value,
}

impl RawColumn {
    pub fn new(name: impl Into<String>, column_type: ColumnType, value: Value) -> Self {
        Self {
            name: name.into(),
            column_type,
            flags: ColumnFlags::empty(),
            value,
        }
    }

    pub fn with_flags(mut self, flags: ColumnFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// A source row before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub columns: Vec<RawColumn>,
}

impl RawRow {
    pub fn new(columns: Vec<RawColumn>) -> Self {
        Self { columns }
    }

    /// Capture a `mysql_async` row together with its column metadata.
    pub fn from_mysql(row: Row) -> Self {
        let metadata = row.columns();
        let values = row.unwrap_raw();
        let columns = metadata
            .iter()
            .zip(values)
            .map(|(column, value)| RawColumn {
                name: column.name_str().into_owned(),
                column_type: column.column_type(),
                flags: column.flags(),
                value: value.unwrap_or(Value::NULL),
            })
            .collect();
        Self { columns }
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn push(&mut self, column: RawColumn) {
        self.columns.push(column);
    }
}
