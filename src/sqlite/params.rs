use rusqlite::types::Value;

use crate::types::SqlValue;

/// Convert a `SqlValue` into the `rusqlite` value it binds as.
///
/// Booleans become 0/1, timestamps and dates become ISO-8601 text, JSON is serialised and enum
/// labels and decimals bind as text.
#[must_use]
pub fn sql_value_to_sqlite(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
        SqlValue::Int(i) => Value::Integer(*i),
        SqlValue::Float(f) => Value::Real(*f),
        SqlValue::Text(s) | SqlValue::Enum(s) | SqlValue::Decimal(s) => Value::Text(s.clone()),
        SqlValue::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        SqlValue::TimestampTz(dt) => Value::Text(dt.format("%F %T%.f%:z").to_string()),
        SqlValue::Date(d) => Value::Text(d.format("%F").to_string()),
        SqlValue::Blob(bytes) => Value::Blob(bytes.clone()),
        SqlValue::Json(json) => Value::Text(json.to_string()),
    }
}

pub(crate) fn convert_params(params: &[SqlValue]) -> Vec<Value> {
    params.iter().map(sql_value_to_sqlite).collect()
}
