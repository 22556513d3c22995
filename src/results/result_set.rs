use std::collections::HashMap;
use std::sync::Arc;

use crate::types::SqlValue;

use super::row::{Row, index_columns};

/// A fully materialised result from a query or generated-keys request.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    rows: Vec<Row>,
    column_names: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
}

impl ResultSet {
    /// Create an empty result set with the given columns and a capacity hint.
    #[must_use]
    pub fn with_columns(column_names: Vec<String>, capacity: usize) -> Self {
        let column_index = Arc::new(index_columns(&column_names));
        Self {
            rows: Vec::with_capacity(capacity),
            column_names: Arc::new(column_names),
            column_index,
        }
    }

    /// Append one row of values in column order.
    pub fn add_row_values(&mut self, values: Vec<SqlValue>) {
        self.rows.push(Row::from_parts(
            Arc::clone(&self.column_names),
            Arc::clone(&self.column_index),
            values,
        ));
    }

    /// Append every row of `other`, adopting its columns if this set has none yet.
    pub fn extend(&mut self, other: ResultSet) {
        if self.column_names.is_empty() {
            self.column_names = other.column_names;
            self.column_index = other.column_index;
        }
        self.rows.extend(other.rows);
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Forward-only cursor over the rows.
    #[must_use]
    pub fn into_cursor(self) -> ResultCursor {
        ResultCursor {
            rows: self.rows.into_iter(),
            consumed: 0,
        }
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// Forward-only cursor handed to single-value mappers.
///
/// The mapper advances it itself; returning `None` from the mapper means "no row".
#[derive(Debug)]
pub struct ResultCursor {
    rows: std::vec::IntoIter<Row>,
    consumed: usize,
}

impl ResultCursor {
    /// Number of rows already taken from the cursor.
    #[must_use]
    pub fn position(&self) -> usize {
        self.consumed
    }

    /// Rows not yet taken.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl Iterator for ResultCursor {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        let row = self.rows.next()?;
        self.consumed += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}
