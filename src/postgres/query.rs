use std::error::Error;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tokio_postgres::Statement;
use tokio_postgres::types::{FromSql, Kind, Type};

use crate::error::NamedSqlError;
use crate::results::ResultSet;
use crate::types::SqlValue;

use super::numeric::NumericText;

/// Wire bytes of a column type with no dedicated mapping.
struct RawBytes(Vec<u8>);

impl<'a> FromSql<'a> for RawBytes {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(RawBytes(raw.to_vec()))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// Raw label of a Postgres enum value.
struct EnumLabel(String);

impl<'a> FromSql<'a> for EnumLabel {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(EnumLabel(std::str::from_utf8(raw)?.to_owned()))
    }

    fn accepts(ty: &Type) -> bool {
        matches!(ty.kind(), Kind::Enum(_))
    }
}

fn get<'a, T, F>(row: &'a tokio_postgres::Row, idx: usize, wrap: F) -> Result<SqlValue, NamedSqlError>
where
    T: FromSql<'a>,
    F: FnOnce(T) -> SqlValue,
{
    let val: Option<T> = row.try_get(idx)?;
    Ok(val.map_or(SqlValue::Null, wrap))
}

/// Extracts a `SqlValue` from a `tokio_postgres` Row at the given index.
///
/// # Errors
/// Returns `NamedSqlError` if a mapped column type fails to decode. Types without a mapping
/// (uuid, inet, arrays, ...) come back as [`SqlValue::Blob`] holding their binary wire form.
pub fn postgres_extract_value(
    row: &tokio_postgres::Row,
    idx: usize,
) -> Result<SqlValue, NamedSqlError> {
    let type_info = row.columns()[idx].type_();

    match *type_info {
        Type::BOOL => get(row, idx, SqlValue::Bool),
        Type::INT2 => get(row, idx, |v: i16| SqlValue::Int(i64::from(v))),
        Type::INT4 => get(row, idx, |v: i32| SqlValue::Int(i64::from(v))),
        Type::INT8 => get(row, idx, SqlValue::Int),
        Type::OID => get(row, idx, |v: u32| SqlValue::Int(i64::from(v))),
        Type::FLOAT4 => get(row, idx, |v: f32| SqlValue::Float(f64::from(v))),
        Type::FLOAT8 => get(row, idx, SqlValue::Float),
        Type::TIMESTAMP => get::<NaiveDateTime, _>(row, idx, SqlValue::Timestamp),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>, _>(row, idx, SqlValue::TimestampTz),
        Type::DATE => get::<NaiveDate, _>(row, idx, SqlValue::Date),
        Type::JSON | Type::JSONB => get::<Value, _>(row, idx, SqlValue::Json),
        Type::BYTEA => get::<Vec<u8>, _>(row, idx, SqlValue::Blob),
        Type::NUMERIC => get(row, idx, |v: NumericText| SqlValue::Decimal(v.0)),
        _ if matches!(type_info.kind(), Kind::Enum(_)) => {
            get(row, idx, |v: EnumLabel| SqlValue::Enum(v.0))
        }
        _ if <String as FromSql>::accepts(type_info) => get(row, idx, SqlValue::Text),
        _ => get(row, idx, |v: RawBytes| SqlValue::Blob(v.0)),
    }
}

/// Build a result set using statement metadata for column names.
///
/// # Errors
/// Returns errors from row value extraction.
pub fn build_result_set_from_statement(
    stmt: &Statement,
    rows: &[tokio_postgres::Row],
) -> Result<ResultSet, NamedSqlError> {
    let column_names: Vec<String> = stmt
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    let column_count = column_names.len();

    let mut result_set = ResultSet::with_columns(column_names, rows.len());
    for row in rows {
        let mut row_values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            row_values.push(postgres_extract_value(row, idx)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}
