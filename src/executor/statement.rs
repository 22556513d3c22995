use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::binding::{NamedParams, ParamSlots};
use crate::error::NamedSqlError;
use crate::pool::Connection;
use crate::results::ResultSet;
use crate::translation::ParsedSql;
use crate::types::SqlValue;

use super::Prepared;

/// A prepared statement bound to one checked-out connection.
///
/// Positions are 1-based, matching the `?` markers in the SQL. Values stay bound across
/// executions until replaced or cleared.
pub struct Statement<'c> {
    conn: &'c mut Connection,
    prepared: Prepared,
    slots: ParamSlots,
    batch: Vec<Vec<SqlValue>>,
    generated: Option<ResultSet>,
}

impl<'c> Statement<'c> {
    pub(crate) async fn prepare(
        conn: &'c mut Connection,
        sql: &str,
        generated_keys: bool,
    ) -> Result<Statement<'c>, NamedSqlError> {
        let prepared = conn.prepare_backend(sql, generated_keys).await?;
        Ok(Self {
            slots: ParamSlots::new(prepared.parameter_count),
            conn,
            prepared,
            batch: Vec::new(),
            generated: None,
        })
    }

    /// SQL text as prepared by the driver.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.prepared.sql
    }

    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.slots.parameter_count()
    }

    /// Bind one value at a 1-based position. `SqlValue::Null` binds a typed SQL NULL.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::ParameterError`] when the position is out of range.
    pub fn bind(&mut self, position: usize, value: impl Into<SqlValue>) -> Result<(), NamedSqlError> {
        self.slots.bind(position, value.into())
    }

    /// Bind an ordered list of values starting at position 1.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::ParameterError`] when there are more values than markers.
    pub fn bind_all_positional(&mut self, values: &[SqlValue]) -> Result<(), NamedSqlError> {
        self.slots.bind_positional(values)
    }

    pub fn clear_parameters(&mut self) {
        self.slots.clear();
    }

    /// Execute with the bound values and return the affected-row count as the driver reports it.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::ParameterError`] if any position is unbound, otherwise any driver
    /// error.
    pub async fn execute_update(&mut self) -> Result<i64, NamedSqlError> {
        let values = self.slots.values()?;
        tracing::trace!(sql = %self.prepared.sql, bound = values.len(), "executing update");
        let outcome = self.conn.run_execute(&self.prepared, &values).await?;
        self.generated = outcome.keys;
        Ok(outcome.count)
    }

    /// Execute as a query and materialise every row.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::ParameterError`] if any position is unbound, otherwise any driver
    /// error.
    pub async fn execute_query(&mut self) -> Result<ResultSet, NamedSqlError> {
        let values = self.slots.values()?;
        tracing::trace!(sql = %self.prepared.sql, bound = values.len(), "executing query");
        self.conn.run_query(&self.prepared, &values).await
    }

    /// Queue the currently bound values as one batch entry.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::ParameterError`] if any position is unbound.
    pub fn add_batch(&mut self) -> Result<(), NamedSqlError> {
        self.batch.push(self.slots.values()?);
        Ok(())
    }

    #[must_use]
    pub fn batch_len(&self) -> usize {
        self.batch.len()
    }

    /// Execute every queued entry in order and return their affected-row counts.
    ///
    /// The queue is emptied whether or not execution succeeds. An empty queue is a no-op.
    ///
    /// # Errors
    /// Returns the first driver error. No entry is kept on Postgres, or on `SQLite` in autocommit
    /// mode.
    pub async fn execute_batch(&mut self) -> Result<Vec<i64>, NamedSqlError> {
        let batch = std::mem::take(&mut self.batch);
        tracing::trace!(sql = %self.prepared.sql, entries = batch.len(), "executing batch");
        let outcome = self.conn.run_batch(&self.prepared, &batch).await?;
        self.generated = outcome.keys;
        Ok(outcome.counts)
    }

    /// Generated keys of the most recent execution, if keys were requested at prepare time.
    #[must_use]
    pub fn generated_keys(&self) -> Option<&ResultSet> {
        self.generated.as_ref()
    }

    /// Take the generated keys of the most recent execution, leaving none behind.
    pub fn take_generated_keys(&mut self) -> ResultSet {
        self.generated.take().unwrap_or_default()
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("prepared", &self.prepared)
            .field("batch_len", &self.batch.len())
            .finish_non_exhaustive()
    }
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        tracing::debug!(sql = %self.prepared.sql, "releasing statement");
    }
}

/// A prepared statement whose SQL was written with `:name` placeholders.
///
/// Dereferences to [`Statement`] for execution and positional access.
///
/// ```rust,no_run
/// use named_sql::prelude::*;
///
/// # async fn demo(conn: &mut Connection) -> Result<(), NamedSqlError> {
/// let mut stmt = conn
///     .prepare_named("SELECT name FROM users WHERE id = :id OR parent = :id")
///     .await?;
/// stmt.bind_named("id", 7)?;
/// let rows = stmt.execute_query().await?;
/// # let _ = rows;
/// # Ok(()) }
/// ```
pub struct NamedStatement<'c> {
    statement: Statement<'c>,
    parsed: Arc<ParsedSql>,
}

impl<'c> NamedStatement<'c> {
    pub(crate) async fn prepare(
        conn: &'c mut Connection,
        sql: &str,
        generated_keys: bool,
    ) -> Result<NamedStatement<'c>, NamedSqlError> {
        let parsed = conn.translate(sql);
        let statement = Statement::prepare(conn, parsed.sql(), generated_keys).await?;
        Ok(Self { statement, parsed })
    }

    /// The translation this statement was prepared from.
    #[must_use]
    pub fn parsed(&self) -> &ParsedSql {
        &self.parsed
    }

    /// Bind `value` at every position `name` occupies.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::UnknownParameter`] when the SQL has no `:name` placeholder.
    pub fn bind_named(&mut self, name: &str, value: impl Into<SqlValue>) -> Result<(), NamedSqlError> {
        self.statement
            .slots
            .bind_named(self.parsed.params(), name, value.into())
    }

    /// Bind every placeholder from `values`; names the SQL does not use are ignored.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::MissingParameter`] when a placeholder has no value in `values`.
    pub fn bind_all(&mut self, values: &NamedParams) -> Result<(), NamedSqlError> {
        tracing::trace!(names = self.parsed.params().len(), supplied = values.len(), "binding named values");
        self.statement.slots.bind_all(self.parsed.params(), values)
    }
}

impl<'c> Deref for NamedStatement<'c> {
    type Target = Statement<'c>;

    fn deref(&self) -> &Self::Target {
        &self.statement
    }
}

impl DerefMut for NamedStatement<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.statement
    }
}

impl std::fmt::Debug for NamedStatement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedStatement")
            .field("statement", &self.statement)
            .field("parsed", &self.parsed)
            .finish()
    }
}
