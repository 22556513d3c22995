use std::error::Error;

use tokio_postgres::types::{IsNull, Kind, ToSql, Type, to_sql_checked};
use tokio_util::bytes;

use crate::types::SqlValue;

use super::numeric;

/// Borrowed Postgres parameter list over a slice of `SqlValue`s.
pub struct Params<'a> {
    references: Vec<&'a (dyn ToSql + Sync)>,
}

impl<'a> Params<'a> {
    #[must_use]
    pub fn convert(params: &'a [SqlValue]) -> Params<'a> {
        let references = params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        Params { references }
    }

    /// Get a reference to the underlying parameter array
    #[must_use]
    pub fn as_refs(&self) -> &[&(dyn ToSql + Sync)] {
        &self.references
    }
}

fn is_enum(ty: &Type) -> bool {
    matches!(ty.kind(), Kind::Enum(_))
}

/// Numbers and decimal text bind to `NUMERIC` through its binary form, never via `f64`.
fn numeric_to_sql(
    value: &SqlValue,
    out: &mut bytes::BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    match value {
        SqlValue::Null => return Ok(IsNull::Yes),
        SqlValue::Int(i) => numeric::encode(&i.to_string(), out)?,
        SqlValue::Float(f) => numeric::encode(&numeric::float_text(*f), out)?,
        SqlValue::Decimal(text) | SqlValue::Text(text) => numeric::encode(text, out)?,
        other => return Err(format!("cannot bind {} to numeric", other.kind()).into()),
    }
    Ok(IsNull::No)
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        if *ty == Type::NUMERIC {
            return numeric_to_sql(self, out);
        }
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(b) => b.to_sql_checked(ty, out),
            SqlValue::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                _ => i.to_sql_checked(ty, out),
            },
            SqlValue::Float(f) => match *ty {
                #[allow(clippy::cast_possible_truncation)]
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                _ => f.to_sql_checked(ty, out),
            },
            // enum labels travel in their text form for both text and enum-typed parameters
            SqlValue::Text(s) | SqlValue::Enum(s) => {
                if is_enum(ty) {
                    out.extend_from_slice(s.as_bytes());
                    Ok(IsNull::No)
                } else {
                    s.to_sql_checked(ty, out)
                }
            }
            SqlValue::Timestamp(dt) => match *ty {
                Type::TIMESTAMPTZ => dt.and_utc().to_sql(ty, out),
                Type::DATE => dt.date().to_sql(ty, out),
                _ => dt.to_sql_checked(ty, out),
            },
            SqlValue::TimestampTz(dt) => match *ty {
                Type::TIMESTAMP => dt.naive_utc().to_sql(ty, out),
                _ => dt.to_sql_checked(ty, out),
            },
            SqlValue::Date(d) => d.to_sql_checked(ty, out),
            SqlValue::Blob(blob) => blob.to_sql_checked(ty, out),
            SqlValue::Json(json) => json.to_sql_checked(ty, out),
            SqlValue::Decimal(d) => match *ty {
                Type::INT8 => d.parse::<i64>()?.to_sql(ty, out),
                Type::FLOAT8 => d.parse::<f64>()?.to_sql(ty, out),
                Type::FLOAT4 => d.parse::<f32>()?.to_sql(ty, out),
                _ => d.to_sql_checked(ty, out),
            },
        }
    }

    // Per-variant checks happen in `to_sql`; NULL must bind to any parameter type.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}
