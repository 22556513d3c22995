use std::collections::HashMap;
use std::sync::Arc;

use crate::error::NamedSqlError;
use crate::types::SqlValue;

use super::value::{ColumnIndex, FromSqlValue};

/// A single row from a query result or generated-keys cursor.
///
/// Column names are shared across every row of the same result.
#[derive(Debug, Clone)]
pub struct Row {
    column_names: Arc<Vec<String>>,
    values: Vec<SqlValue>,
    // name → index lookup, shared across the result set
    column_index: Arc<HashMap<String, usize>>,
}

impl Row {
    /// Build a standalone row, mostly useful for exercising mappers in tests.
    #[must_use]
    pub fn new(column_names: Vec<String>, values: Vec<SqlValue>) -> Self {
        let column_names = Arc::new(column_names);
        let column_index = Arc::new(index_columns(&column_names));
        Self::from_parts(column_names, column_index, values)
    }

    pub(crate) fn from_parts(
        column_names: Arc<Vec<String>>,
        column_index: Arc<HashMap<String, usize>>,
        values: Vec<SqlValue>,
    ) -> Self {
        Self {
            column_names,
            values,
            column_index,
        }
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Get the 0-based index of a column by name
    #[must_use]
    pub fn column_position(&self, column_name: &str) -> Option<usize> {
        self.column_index.get(column_name).copied()
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&SqlValue> {
        self.column_position(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the row by 0-based column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read and convert a column by name or 0-based index.
    ///
    /// ```rust
    /// use named_sql::prelude::*;
    ///
    /// let row = Row::new(
    ///     vec!["id".into(), "nickname".into()],
    ///     vec![SqlValue::Int(3), SqlValue::Null],
    /// );
    /// let id: i64 = row.try_get("id")?;
    /// let nickname: Option<String> = row.try_get(1_usize)?;
    /// assert_eq!((id, nickname), (3, None));
    /// # Ok::<(), NamedSqlError>(())
    /// ```
    ///
    /// # Errors
    /// Returns [`NamedSqlError::MappingError`] if the column does not exist or the value cannot
    /// be converted to `T`.
    pub fn try_get<T: FromSqlValue>(&self, column: impl ColumnIndex) -> Result<T, NamedSqlError> {
        let idx = column.index_in(self).ok_or_else(|| {
            NamedSqlError::MappingError(format!("no column {} in result row", column.describe()))
        })?;
        let value = self.values.get(idx).ok_or_else(|| {
            NamedSqlError::MappingError(format!("column index {idx} is out of range"))
        })?;
        T::from_sql_value(value).map_err(|e| match e {
            NamedSqlError::MappingError(msg) => {
                NamedSqlError::MappingError(format!("column {}: {msg}", column.describe()))
            }
            other => other,
        })
    }
}

pub(crate) fn index_columns(column_names: &[String]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(column_names.len());
    for (i, name) in column_names.iter().enumerate() {
        // duplicate names resolve to the first occurrence
        index.entry(name.clone()).or_insert(i);
    }
    index
}
