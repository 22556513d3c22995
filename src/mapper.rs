//! Row mapping.
//!
//! A mapper turns one [`Row`] into a caller-chosen value. Any `FnMut(&Row) -> Result<T>` closure
//! is a mapper; the executor never reads columns itself.

use std::marker::PhantomData;

use crate::error::NamedSqlError;
use crate::results::{ColumnIndex, FromSqlValue, Row};

pub trait RowMapper<T> {
    /// # Errors
    /// Any error is propagated unchanged as the failure of the enclosing query.
    fn map_row(&mut self, row: &Row) -> Result<T, NamedSqlError>;
}

impl<T, F> RowMapper<T> for F
where
    F: FnMut(&Row) -> Result<T, NamedSqlError>,
{
    fn map_row(&mut self, row: &Row) -> Result<T, NamedSqlError> {
        self(row)
    }
}

/// Mapper that reads a single column, typically a generated key or an aggregate.
///
/// ```rust
/// use named_sql::mapper::{RowMapper, column};
/// use named_sql::prelude::*;
///
/// let row = Row::new(vec!["id".into()], vec![SqlValue::Int(42)]);
/// let mut by_index = column::<i64, _>(0_usize);
/// assert_eq!(by_index.map_row(&row)?, 42);
/// # Ok::<(), NamedSqlError>(())
/// ```
#[must_use]
pub fn column<T, C>(column: C) -> Column<T, C>
where
    T: FromSqlValue,
    C: ColumnIndex + Copy,
{
    Column {
        column,
        _marker: PhantomData,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column<T, C> {
    column: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C> RowMapper<T> for Column<T, C>
where
    T: FromSqlValue,
    C: ColumnIndex + Copy,
{
    fn map_row(&mut self, row: &Row) -> Result<T, NamedSqlError> {
        row.try_get(self.column)
    }
}

pub(crate) fn map_rows<T, M>(rows: &[Row], mapper: &mut M) -> Result<Vec<T>, NamedSqlError>
where
    M: RowMapper<T> + ?Sized,
{
    rows.iter().map(|row| mapper.map_row(row)).collect()
}
