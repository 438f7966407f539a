//! MySQL values → `SyncValue`.
//!
//! Query results arrive over the text protocol, so numbers and dates are
//! usually byte buffers; the declared column type decides how each buffer
//! is read. Binary-protocol values (`Value::Int`, `Value::Date`, ...) are
//! accepted as well.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use mysql_async::consts::{ColumnFlags, ColumnType};
use mysql_async::Value;
use sync_core::{NormalizedRow, SourceType, SyncValue};
use thiserror::Error;

use crate::row::{RawColumn, RawRow};

/// A single row could not be normalized. The row is dropped; the batch goes on.
#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("column `{column}` has unrecognized MySQL type {column_type:?}")]
    UnrecognizedType {
        column: String,
        column_type: ColumnType,
    },
    #[error("column `{column}` holds invalid UTF-8: {source}")]
    InvalidText {
        column: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("column `{column}` value {value:?} is not a valid {expected}")]
    InvalidValue {
        column: String,
        expected: &'static str,
        value: Value,
    },
}

/// Classify a MySQL column type. `None` means the type is not recognized.
pub fn classify(column_type: ColumnType, _flags: ColumnFlags) -> Option<SourceType> {
    use ColumnType::*;

    let source_type = match column_type {
        MYSQL_TYPE_TINY | MYSQL_TYPE_SHORT | MYSQL_TYPE_INT24 | MYSQL_TYPE_LONG
        | MYSQL_TYPE_LONGLONG | MYSQL_TYPE_YEAR => SourceType::Integer,
        MYSQL_TYPE_FLOAT | MYSQL_TYPE_DOUBLE => SourceType::Float,
        MYSQL_TYPE_DECIMAL | MYSQL_TYPE_NEWDECIMAL => SourceType::Decimal,
        // BINARY-flagged blobs are still decoded: the source stores text in them.
        MYSQL_TYPE_STRING
        | MYSQL_TYPE_VAR_STRING
        | MYSQL_TYPE_VARCHAR
        | MYSQL_TYPE_TINY_BLOB
        | MYSQL_TYPE_MEDIUM_BLOB
        | MYSQL_TYPE_BLOB
        | MYSQL_TYPE_LONG_BLOB
        | MYSQL_TYPE_ENUM
        | MYSQL_TYPE_SET
        | MYSQL_TYPE_JSON => SourceType::Textual,
        MYSQL_TYPE_DATE | MYSQL_TYPE_NEWDATE => SourceType::Date,
        MYSQL_TYPE_TIME | MYSQL_TYPE_TIME2 => SourceType::Time,
        MYSQL_TYPE_DATETIME
        | MYSQL_TYPE_DATETIME2
        | MYSQL_TYPE_TIMESTAMP
        | MYSQL_TYPE_TIMESTAMP2 => SourceType::DateTime,
        MYSQL_TYPE_BIT => SourceType::Bit,
        _ => return None,
    };
    Some(source_type)
}

/// Normalize every column of a row.
pub fn normalize_row(row: RawRow) -> Result<NormalizedRow, NormalizationError> {
    row.columns
        .iter()
        .map(|column| Ok((column.name.clone(), normalize_value(column)?)))
        .collect()
}

/// Normalize one column value according to its declared type.
pub fn normalize_value(column: &RawColumn) -> Result<SyncValue, NormalizationError> {
    let source_type =
        classify(column.column_type, column.flags).ok_or_else(|| {
            NormalizationError::UnrecognizedType {
                column: column.name.clone(),
                column_type: column.column_type,
            }
        })?;

    if matches!(column.value, Value::NULL) {
        return Ok(if source_type.is_textual() {
            SyncValue::Text(String::new())
        } else {
            SyncValue::Null
        });
    }

    let extractor = Extractor { column };
    match source_type {
        SourceType::Integer => extractor.int().map(SyncValue::Int),
        SourceType::Float => extractor.float().map(SyncValue::Float),
        SourceType::Decimal => extractor.string().map(SyncValue::Decimal),
        SourceType::Textual => extractor.string().map(SyncValue::Text),
        SourceType::Date => extractor.date().map(SyncValue::Date),
        SourceType::Time => extractor.time().map(SyncValue::Time),
        SourceType::DateTime => extractor.datetime().map(SyncValue::DateTime),
        SourceType::Bit => extractor.bit(),
    }
}

struct Extractor<'a> {
    column: &'a RawColumn,
}

impl Extractor<'_> {
    fn invalid(&self, expected: &'static str) -> NormalizationError {
        NormalizationError::InvalidValue {
            column: self.column.name.clone(),
            expected,
            value: self.column.value.clone(),
        }
    }

    fn text(&self, bytes: &[u8]) -> Result<String, NormalizationError> {
        String::from_utf8(bytes.to_vec()).map_err(|source| NormalizationError::InvalidText {
            column: self.column.name.clone(),
            source,
        })
    }

    fn int(&self) -> Result<i64, NormalizationError> {
        match &self.column.value {
            Value::Int(i) => Ok(*i),
            Value::UInt(u) => i64::try_from(*u).map_err(|_| self.invalid("integer")),
            Value::Bytes(b) => self
                .text(b)?
                .trim()
                .parse()
                .map_err(|_| self.invalid("integer")),
            _ => Err(self.invalid("integer")),
        }
    }

    fn float(&self) -> Result<f64, NormalizationError> {
        match &self.column.value {
            Value::Float(f) => Ok(f64::from(*f)),
            Value::Double(d) => Ok(*d),
            Value::Int(i) => Ok(*i as f64),
            Value::UInt(u) => Ok(*u as f64),
            Value::Bytes(b) => self
                .text(b)?
                .trim()
                .parse()
                .map_err(|_| self.invalid("float")),
            _ => Err(self.invalid("float")),
        }
    }

    fn string(&self) -> Result<String, NormalizationError> {
        match &self.column.value {
            Value::Bytes(b) => self.text(b),
            Value::Int(i) => Ok(i.to_string()),
            Value::UInt(u) => Ok(u.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Double(d) => Ok(d.to_string()),
            _ => Err(self.invalid("string")),
        }
    }

    fn date(&self) -> Result<NaiveDate, NormalizationError> {
        match &self.column.value {
            Value::Date(year, month, day, _, _, _, _) => {
                NaiveDate::from_ymd_opt(i32::from(*year), u32::from(*month), u32::from(*day))
                    .ok_or_else(|| self.invalid("date"))
            }
            Value::Bytes(b) => NaiveDate::parse_from_str(self.text(b)?.trim(), "%Y-%m-%d")
                .map_err(|_| self.invalid("date")),
            _ => Err(self.invalid("date")),
        }
    }

    fn time(&self) -> Result<NaiveTime, NormalizationError> {
        match &self.column.value {
            Value::Time(false, 0, hour, min, sec, micro) => NaiveTime::from_hms_micro_opt(
                u32::from(*hour),
                u32::from(*min),
                u32::from(*sec),
                *micro,
            )
            .ok_or_else(|| self.invalid("time of day")),
            Value::Bytes(b) => {
                let s = self.text(b)?;
                NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f")
                    .map_err(|_| self.invalid("time of day"))
            }
            _ => Err(self.invalid("time of day")),
        }
    }

    fn datetime(&self) -> Result<DateTime<Utc>, NormalizationError> {
        match &self.column.value {
            Value::Date(year, month, day, hour, min, sec, micro) => {
                let date = NaiveDate::from_ymd_opt(
                    i32::from(*year),
                    u32::from(*month),
                    u32::from(*day),
                )
                .ok_or_else(|| self.invalid("datetime"))?;
                let time = NaiveTime::from_hms_micro_opt(
                    u32::from(*hour),
                    u32::from(*min),
                    u32::from(*sec),
                    *micro,
                )
                .ok_or_else(|| self.invalid("datetime"))?;
                Ok(Utc.from_utc_datetime(&NaiveDateTime::new(date, time)))
            }
            Value::Bytes(b) => {
                let s = self.text(b)?;
                let s = s.trim();
                if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                    return Ok(dt.with_timezone(&Utc));
                }
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                    .map(|naive| Utc.from_utc_datetime(&naive))
                    .map_err(|_| self.invalid("datetime"))
            }
            _ => Err(self.invalid("datetime")),
        }
    }

    /// BIT(1) is a flag; wider BIT columns are read as a big-endian integer.
    fn bit(&self) -> Result<SyncValue, NormalizationError> {
        match &self.column.value {
            Value::Bytes(b) if b.len() == 1 && b[0] <= 1 => Ok(SyncValue::Bool(b[0] == 1)),
            Value::Bytes(b) if b.len() <= 8 => Ok(SyncValue::Int(
                b.iter().fold(0i64, |acc, byte| (acc << 8) | i64::from(*byte)),
            )),
            Value::Int(i) => Ok(SyncValue::Int(*i)),
            Value::UInt(u) => i64::try_from(*u)
                .map(SyncValue::Int)
                .map_err(|_| self.invalid("bit field")),
            _ => Err(self.invalid("bit field")),
        }
    }
}
