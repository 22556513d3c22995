//! Scoped executor: prepare, bind, execute and map, with every resource released on return.
//!
//! - `statement`: prepared statements with positional and named binding
//! - `connection_ops`: the executor operations on a checked-out [`Connection`](crate::Connection)
//! - `scoped`: the same operations on [`Database`](crate::Database), acquiring a connection per call
//! - `dispatch`: backend selection for prepare and execute

mod connection_ops;
mod dispatch;
mod scoped;
mod statement;

pub use statement::{NamedStatement, Statement};
pub(crate) use dispatch::Prepared;

use crate::results::ResultSet;

/// How a statement reports generated keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyMode {
    None,
    /// The statement returns rows (an explicit or appended `RETURNING` clause).
    Returning,
    /// `SQLite` without `RETURNING`: report `last_insert_rowid()` after each execution.
    LastInsertRowid,
}

/// Result of one execution: the affected-row count and any generated keys.
#[derive(Debug)]
pub(crate) struct ExecOutcome {
    pub(crate) count: i64,
    pub(crate) keys: Option<ResultSet>,
}

/// Per-entry counts of a batch and the generated keys of all entries, in entry order.
#[derive(Debug)]
pub(crate) struct BatchOutcome {
    pub(crate) counts: Vec<i64>,
    pub(crate) keys: Option<ResultSet>,
}

impl BatchOutcome {
    pub(crate) fn with_capacity(entries: usize, keys: KeyMode) -> Self {
        Self {
            counts: Vec::with_capacity(entries),
            keys: (keys != KeyMode::None).then(ResultSet::default),
        }
    }

    pub(crate) fn push(&mut self, outcome: ExecOutcome) {
        self.counts.push(outcome.count);
        if let Some(rows) = outcome.keys {
            match &mut self.keys {
                Some(keys) => keys.extend(rows),
                None => self.keys = Some(rows),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SqlValue;

    fn key_rows(ids: &[i64]) -> ResultSet {
        let mut rows = ResultSet::with_columns(vec!["id".into()], ids.len());
        for id in ids {
            rows.add_row_values(vec![SqlValue::Int(*id)]);
        }
        rows
    }

    #[test]
    fn batch_keys_concatenate_in_entry_order() {
        let mut outcome = BatchOutcome::with_capacity(2, KeyMode::Returning);
        outcome.push(ExecOutcome { count: 1, keys: Some(key_rows(&[10])) });
        outcome.push(ExecOutcome { count: 2, keys: Some(key_rows(&[11, 12])) });

        assert_eq!(outcome.counts, vec![1, 2]);
        let keys = outcome.keys.unwrap();
        assert_eq!(keys.column_names(), ["id".to_string()]);
        let ids: Vec<i64> = keys.rows().iter().map(|r| r.try_get("id").unwrap()).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }

    #[test]
    fn empty_batch_has_empty_keys_only_when_requested() {
        assert!(BatchOutcome::with_capacity(0, KeyMode::None).keys.is_none());
        let requested = BatchOutcome::with_capacity(0, KeyMode::LastInsertRowid);
        assert!(requested.keys.unwrap().is_empty());
    }
}
