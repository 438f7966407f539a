//! Declared source column types and destination value kinds.

use chrono::{NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::values::SyncValue;

/// Declared type of a source column, as reported by the query that produced it.
///
/// Only the distinctions the normalizer cares about are kept; the
/// per-database crates decide which native types fall into each class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Integer,
    Float,
    Decimal,
    /// Character and text columns, including ENUM/SET/JSON
    Textual,
    Date,
    Time,
    DateTime,
    Bit,
}

impl SourceType {
    /// Textual columns are the only ones whose NULLs become empty strings.
    pub fn is_textual(self) -> bool {
        matches!(self, Self::Textual)
    }
}

/// The kind of value a destination attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Decimal,
    Text,
    Date,
    DateTime,
}

impl ValueKind {
    /// Coerce a normalized value into this kind.
    ///
    /// NULL is accepted for every kind. Integer flags (0/1) become booleans,
    /// integers widen to float and decimal, and dates are promoted to
    /// midnight UTC for timestamp attributes. Anything else is a mismatch and
    /// returns `None`.
    pub fn coerce(self, value: SyncValue) -> Option<SyncValue> {
        match (self, value) {
            (_, SyncValue::Null) => Some(SyncValue::Null),
            (Self::Bool, SyncValue::Bool(b)) => Some(SyncValue::Bool(b)),
            (Self::Bool, SyncValue::Int(0)) => Some(SyncValue::Bool(false)),
            (Self::Bool, SyncValue::Int(1)) => Some(SyncValue::Bool(true)),
            (Self::Int, SyncValue::Int(i)) => Some(SyncValue::Int(i)),
            (Self::Int, SyncValue::Bool(b)) => Some(SyncValue::Int(i64::from(b))),
            (Self::Float, SyncValue::Float(f)) => Some(SyncValue::Float(f)),
            (Self::Float, SyncValue::Int(i)) => Some(SyncValue::Float(i as f64)),
            (Self::Float, SyncValue::Decimal(s)) => s.parse().ok().map(SyncValue::Float),
            (Self::Decimal, SyncValue::Decimal(s)) => Some(SyncValue::Decimal(s)),
            (Self::Decimal, SyncValue::Int(i)) => Some(SyncValue::Decimal(i.to_string())),
            (Self::Text, SyncValue::Text(s)) => Some(SyncValue::Text(s)),
            (Self::Date, SyncValue::Date(d)) => Some(SyncValue::Date(d)),
            (Self::Date, SyncValue::DateTime(dt)) => Some(SyncValue::Date(dt.date_naive())),
            (Self::DateTime, SyncValue::DateTime(dt)) => Some(SyncValue::DateTime(dt)),
            (Self::DateTime, SyncValue::Date(d)) => Some(SyncValue::DateTime(
                Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)),
            )),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Text => "text",
            Self::Date => "date",
            Self::DateTime => "datetime",
        };
        f.write_str(name)
    }
}
