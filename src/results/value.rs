use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;

use crate::error::NamedSqlError;
use crate::types::SqlValue;

use super::row::Row;

/// Column addressing for [`Row::try_get`]: a name or a 0-based index.
pub trait ColumnIndex {
    fn index_in(&self, row: &Row) -> Option<usize>;
    fn describe(&self) -> String;
}

impl ColumnIndex for &str {
    fn index_in(&self, row: &Row) -> Option<usize> {
        row.column_position(self)
    }

    fn describe(&self) -> String {
        format!("`{self}`")
    }
}

impl ColumnIndex for &String {
    fn index_in(&self, row: &Row) -> Option<usize> {
        row.column_position(self)
    }

    fn describe(&self) -> String {
        format!("`{self}`")
    }
}

impl ColumnIndex for usize {
    fn index_in(&self, row: &Row) -> Option<usize> {
        (*self < row.len()).then_some(*self)
    }

    fn describe(&self) -> String {
        format!("#{self}")
    }
}

/// Conversion from a column value into a Rust type.
pub trait FromSqlValue: Sized {
    /// # Errors
    /// Returns [`NamedSqlError::MappingError`] when the value has an incompatible kind.
    fn from_sql_value(value: &SqlValue) -> Result<Self, NamedSqlError>;
}

fn mismatch<T>(expected: &str, value: &SqlValue) -> Result<T, NamedSqlError> {
    Err(NamedSqlError::MappingError(format!(
        "expected {expected}, found {}",
        value.kind()
    )))
}

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d"];

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS[..2]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| parse_tz(text).map(|dt| dt.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(text, NAIVE_FORMATS[2])
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_tz(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `"42"` or `"42.000"`; anything with a non-zero fraction is rejected.
fn integral_decimal(text: &str) -> Option<i64> {
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    if !fraction.bytes().all(|b| b == b'0') {
        return None;
    }
    whole.parse().ok()
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: &SqlValue) -> Result<Self, NamedSqlError> {
        Ok(value.clone())
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: &SqlValue) -> Result<Self, NamedSqlError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_sql_value(value).map(Some)
        }
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: &SqlValue) -> Result<Self, NamedSqlError> {
        match value {
            SqlValue::Int(i) => Ok(*i),
            SqlValue::Bool(b) => Ok(i64::from(*b)),
            SqlValue::Decimal(d) => integral_decimal(d).map_or_else(
                || {
                    Err(NamedSqlError::MappingError(format!(
                        "decimal `{d}` is not an integer in range"
                    )))
                },
                Ok,
            ),
            other => mismatch("integer", other),
        }
    }
}

impl FromSqlValue for i32 {
    fn from_sql_value(value: &SqlValue) -> Result<Self, NamedSqlError> {
        let wide = i64::from_sql_value(value)?;
        i32::try_from(wide)
            .map_err(|e| NamedSqlError::MappingError(format!("integer {wide} out of range: {e}")))
    }
}

impl FromSqlValue for f64 {
    fn from_sql_value(value: &SqlValue) -> Result<Self, NamedSqlError> {
        match value {
            SqlValue::Float(f) => Ok(*f),
            #[allow(clippy::cast_precision_loss)]
            SqlValue::Int(i) => Ok(*i as f64),
            SqlValue::Decimal(d) => d.parse::<f64>().map_err(|e| {
                NamedSqlError::MappingError(format!("cannot parse decimal `{d}` as float: {e}"))
            }),
            other => mismatch("float", other),
        }
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: &SqlValue) -> Result<Self, NamedSqlError> {
        value
            .as_bool()
            .map_or_else(|| mismatch("bool", value), Ok)
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: &SqlValue) -> Result<Self, NamedSqlError> {
        match value {
            SqlValue::Text(s) | SqlValue::Enum(s) | SqlValue::Decimal(s) => Ok(s.clone()),
            SqlValue::Json(j) => Ok(j.to_string()),
            other => mismatch("text", other),
        }
    }
}

impl FromSqlValue for NaiveDateTime {
    fn from_sql_value(value: &SqlValue) -> Result<Self, NamedSqlError> {
        match value {
            SqlValue::Timestamp(ts) => Ok(*ts),
            SqlValue::TimestampTz(ts) => Ok(ts.naive_utc()),
            SqlValue::Text(s) => parse_naive(s).map_or_else(
                || {
                    Err(NamedSqlError::MappingError(format!(
                        "cannot parse `{s}` as a timestamp"
                    )))
                },
                Ok,
            ),
            other => mismatch("timestamp", other),
        }
    }
}

impl FromSqlValue for DateTime<Utc> {
    fn from_sql_value(value: &SqlValue) -> Result<Self, NamedSqlError> {
        match value {
            SqlValue::TimestampTz(ts) => Ok(*ts),
            SqlValue::Timestamp(ts) => Ok(ts.and_utc()),
            SqlValue::Text(s) => parse_tz(s)
                .or_else(|| parse_naive(s).map(|ts| ts.and_utc()))
                .map_or_else(
                    || {
                        Err(NamedSqlError::MappingError(format!(
                            "cannot parse `{s}` as a timestamp"
                        )))
                    },
                    Ok,
                ),
            other => mismatch("timestamptz", other),
        }
    }
}

impl FromSqlValue for NaiveDate {
    fn from_sql_value(value: &SqlValue) -> Result<Self, NamedSqlError> {
        match value {
            SqlValue::Date(d) => Ok(*d),
            SqlValue::Timestamp(ts) => Ok(ts.date()),
            SqlValue::Text(s) => NaiveDate::parse_from_str(s, NAIVE_FORMATS[2]).map_err(|e| {
                NamedSqlError::MappingError(format!("cannot parse `{s}` as a date: {e}"))
            }),
            other => mismatch("date", other),
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: &SqlValue) -> Result<Self, NamedSqlError> {
        match value {
            SqlValue::Blob(b) => Ok(b.clone()),
            SqlValue::Text(s) => Ok(s.clone().into_bytes()),
            other => mismatch("blob", other),
        }
    }
}

impl FromSqlValue for JsonValue {
    fn from_sql_value(value: &SqlValue) -> Result<Self, NamedSqlError> {
        match value {
            SqlValue::Json(j) => Ok(j.clone()),
            SqlValue::Text(s) => serde_json::from_str(s)
                .map_err(|e| NamedSqlError::MappingError(format!("invalid json: {e}"))),
            other => mismatch("json", other),
        }
    }
}
