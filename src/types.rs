use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Values that can be bound as statement parameters or read back from a row.
///
/// The same enum is used for every backend so callers never branch on driver types:
/// ```rust
/// use named_sql::prelude::*;
///
/// let params = named_params! {
///     "id" => 1,
///     "name" => "alice",
///     "active" => true,
/// };
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Typed SQL NULL; the driver infers the column type from the statement.
    Null,
    Bool(bool),
    /// Integer value (64-bit); narrowed to the declared column width when binding.
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Exact decimal in its text form, e.g. `"12.50"`. Postgres `NUMERIC` columns read back as
    /// this, and it binds to `NUMERIC` without going through `f64`.
    Decimal(String),
    Text(String),
    /// Timestamp without time zone
    Timestamp(NaiveDateTime),
    /// Timestamp with time zone, normalised to UTC
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
    /// Binary data
    Blob(Vec<u8>),
    Json(JsonValue),
    /// Label of an enumerated / custom domain type. The SQL text supplies any cast it needs
    /// (`:mood::mood_type`, `CAST(:mood AS mood_type)`).
    Enum(String),
}

impl SqlValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// An exact decimal given by its text form.
    pub fn decimal(text: impl Into<String>) -> Self {
        SqlValue::Decimal(text.into())
    }

    /// Bind an enumerated domain value by its label.
    pub fn from_enum<E: SqlEnum + ?Sized>(value: &E) -> Self {
        SqlValue::Enum(value.sql_label().into_owned())
    }

    /// Short name of the variant, used in mapping error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::Int(_) => "int",
            SqlValue::Float(_) => "float",
            SqlValue::Decimal(_) => "decimal",
            SqlValue::Text(_) => "text",
            SqlValue::Timestamp(_) => "timestamp",
            SqlValue::TimestampTz(_) => "timestamptz",
            SqlValue::Date(_) => "date",
            SqlValue::Blob(_) => "blob",
            SqlValue::Json(_) => "json",
            SqlValue::Enum(_) => "enum",
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let SqlValue::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(value) | SqlValue::Enum(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(value) => Some(*value),
            SqlValue::Int(1) => Some(true),
            SqlValue::Int(0) => Some(false),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let SqlValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let SqlValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

/// Extension point for enumerated or custom domain types.
///
/// The label is bound as text; implementors that persist an ordinal can return its decimal
/// form instead.
///
/// ```rust
/// use std::borrow::Cow;
/// use named_sql::prelude::*;
///
/// enum Mood { Happy, Sad }
///
/// impl SqlEnum for Mood {
///     fn sql_label(&self) -> Cow<'_, str> {
///         match self {
///             Mood::Happy => "happy".into(),
///             Mood::Sad => "sad".into(),
///         }
///     }
/// }
///
/// assert_eq!(SqlValue::from(&Mood::Sad), SqlValue::Enum("sad".into()));
/// ```
pub trait SqlEnum {
    fn sql_label(&self) -> Cow<'_, str>;
}

impl<E: SqlEnum> From<&E> for SqlValue {
    fn from(value: &E) -> Self {
        SqlValue::from_enum(value)
    }
}

macro_rules! from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::Int(i64::from(value))
                }
            }
        )*
    };
}

from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for SqlValue {
    fn from(value: f32) -> Self {
        SqlValue::Float(f64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&String> for SqlValue {
    fn from(value: &String) -> Self {
        SqlValue::Text(value.clone())
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::TimestampTz(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Blob(value)
    }
}

impl From<&[u8]> for SqlValue {
    fn from(value: &[u8]) -> Self {
        SqlValue::Blob(value.to_vec())
    }
}

impl From<JsonValue> for SqlValue {
    fn from(value: JsonValue) -> Self {
        SqlValue::Json(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// The database kinds a [`Database`](crate::Database) can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// `PostgreSQL` database
    #[cfg(feature = "postgres")]
    Postgres,
    /// `SQLite` database
    #[cfg(feature = "sqlite")]
    Sqlite,
}
