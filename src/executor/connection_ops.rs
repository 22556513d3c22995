use crate::binding::NamedParams;
use crate::error::NamedSqlError;
use crate::mapper::{RowMapper, map_rows};
use crate::pool::Connection;
use crate::results::{ResultCursor, ResultSet};
use crate::types::SqlValue;

use super::statement::{NamedStatement, Statement};

impl Connection {
    /// Prepare SQL written with positional `?` markers (`?N` also accepted).
    ///
    /// # Errors
    /// Returns any driver error raised while preparing.
    pub async fn prepare(&mut self, sql: &str) -> Result<Statement<'_>, NamedSqlError> {
        Statement::prepare(self, sql, false).await
    }

    /// Prepare positional SQL so executions also report generated keys.
    ///
    /// # Errors
    /// Returns any driver error raised while preparing.
    pub async fn prepare_with_generated_keys(
        &mut self,
        sql: &str,
    ) -> Result<Statement<'_>, NamedSqlError> {
        Statement::prepare(self, sql, true).await
    }

    /// Translate `:name` placeholders and prepare the result.
    ///
    /// # Errors
    /// Returns any driver error raised while preparing.
    pub async fn prepare_named(&mut self, sql: &str) -> Result<NamedStatement<'_>, NamedSqlError> {
        NamedStatement::prepare(self, sql, false).await
    }

    /// Translate `:name` placeholders and prepare the result, reporting generated keys.
    ///
    /// # Errors
    /// Returns any driver error raised while preparing.
    pub async fn prepare_named_with_generated_keys(
        &mut self,
        sql: &str,
    ) -> Result<NamedStatement<'_>, NamedSqlError> {
        NamedStatement::prepare(self, sql, true).await
    }

    /// Run `body` against a positional statement, releasing it when `body` returns.
    ///
    /// # Errors
    /// Returns preparation errors, or whatever `body` returns.
    pub async fn use_prepared_statement<R, F>(&mut self, sql: &str, body: F) -> Result<R, NamedSqlError>
    where
        F: AsyncFnOnce(&mut Statement<'_>) -> Result<R, NamedSqlError>,
    {
        let mut stmt = self.prepare(sql).await?;
        body(&mut stmt).await
    }

    /// Run `body` against a named-parameter statement, releasing it when `body` returns.
    ///
    /// # Errors
    /// Returns preparation errors, or whatever `body` returns.
    pub async fn use_named_prepared_statement<R, F>(
        &mut self,
        sql: &str,
        body: F,
    ) -> Result<R, NamedSqlError>
    where
        F: AsyncFnOnce(&mut NamedStatement<'_>) -> Result<R, NamedSqlError>,
    {
        let mut stmt = self.prepare_named(sql).await?;
        body(&mut stmt).await
    }

    async fn bound_named(
        &mut self,
        sql: &str,
        params: &NamedParams,
        generated_keys: bool,
    ) -> Result<NamedStatement<'_>, NamedSqlError> {
        let mut stmt = NamedStatement::prepare(self, sql, generated_keys).await?;
        stmt.bind_all(params)?;
        Ok(stmt)
    }

    async fn bound_positional(
        &mut self,
        sql: &str,
        values: &[SqlValue],
        generated_keys: bool,
    ) -> Result<Statement<'_>, NamedSqlError> {
        let mut stmt = Statement::prepare(self, sql, generated_keys).await?;
        stmt.bind_all_positional(values)?;
        Ok(stmt)
    }

    /// Execute named-parameter DML and return the affected-row count as the driver reports it.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::MissingParameter`] before execution when a placeholder has no
    /// value, otherwise any driver error.
    pub async fn execute_update(&mut self, sql: &str, params: &NamedParams) -> Result<i64, NamedSqlError> {
        self.bound_named(sql, params, false)
            .await?
            .execute_update()
            .await
    }

    /// Positional form of [`execute_update`](Self::execute_update).
    ///
    /// # Errors
    /// Returns binding or driver errors.
    pub async fn execute_update_positional(
        &mut self,
        sql: &str,
        values: &[SqlValue],
    ) -> Result<i64, NamedSqlError> {
        self.bound_positional(sql, values, false)
            .await?
            .execute_update()
            .await
    }

    /// Run a query and hand its cursor to `mapper`, which reads as many rows as it needs.
    ///
    /// Meant for single-value reads such as aggregates; `Ok(None)` from the mapper means "no row".
    ///
    /// # Errors
    /// Returns binding, driver or mapper errors.
    pub async fn execute_query<T, F>(
        &mut self,
        sql: &str,
        params: &NamedParams,
        mapper: F,
    ) -> Result<Option<T>, NamedSqlError>
    where
        F: FnOnce(&mut ResultCursor) -> Result<Option<T>, NamedSqlError>,
    {
        let rows = self
            .bound_named(sql, params, false)
            .await?
            .execute_query()
            .await?;
        mapper(&mut rows.into_cursor())
    }

    /// Positional form of [`execute_query`](Self::execute_query).
    ///
    /// # Errors
    /// Returns binding, driver or mapper errors.
    pub async fn execute_query_positional<T, F>(
        &mut self,
        sql: &str,
        values: &[SqlValue],
        mapper: F,
    ) -> Result<Option<T>, NamedSqlError>
    where
        F: FnOnce(&mut ResultCursor) -> Result<Option<T>, NamedSqlError>,
    {
        let rows = self
            .bound_positional(sql, values, false)
            .await?
            .execute_query()
            .await?;
        mapper(&mut rows.into_cursor())
    }

    /// Run a query and map every row in cursor order. No rows yields an empty vector.
    ///
    /// # Errors
    /// Returns binding or driver errors, or the first mapper error.
    pub async fn find_all<T, M>(
        &mut self,
        sql: &str,
        params: &NamedParams,
        mut mapper: M,
    ) -> Result<Vec<T>, NamedSqlError>
    where
        M: RowMapper<T>,
    {
        let rows = self
            .bound_named(sql, params, false)
            .await?
            .execute_query()
            .await?;
        map_rows(rows.rows(), &mut mapper)
    }

    /// Positional form of [`find_all`](Self::find_all).
    ///
    /// # Errors
    /// Returns binding or driver errors, or the first mapper error.
    pub async fn find_all_positional<T, M>(
        &mut self,
        sql: &str,
        values: &[SqlValue],
        mut mapper: M,
    ) -> Result<Vec<T>, NamedSqlError>
    where
        M: RowMapper<T>,
    {
        let rows = self
            .bound_positional(sql, values, false)
            .await?
            .execute_query()
            .await?;
        map_rows(rows.rows(), &mut mapper)
    }

    /// Execute an insert and map each generated-key row in driver order.
    ///
    /// # Errors
    /// Returns binding or driver errors, or the first mapper error.
    pub async fn execute_with_generated_keys<T, M>(
        &mut self,
        sql: &str,
        params: &NamedParams,
        mut key_mapper: M,
    ) -> Result<Vec<T>, NamedSqlError>
    where
        M: RowMapper<T>,
    {
        let keys = {
            let mut stmt = self.bound_named(sql, params, true).await?;
            stmt.execute_update().await?;
            stmt.take_generated_keys()
        };
        map_keys(&keys, &mut key_mapper)
    }

    /// Positional form of [`execute_with_generated_keys`](Self::execute_with_generated_keys).
    ///
    /// # Errors
    /// Returns binding or driver errors, or the first mapper error.
    pub async fn execute_with_generated_keys_positional<T, M>(
        &mut self,
        sql: &str,
        values: &[SqlValue],
        mut key_mapper: M,
    ) -> Result<Vec<T>, NamedSqlError>
    where
        M: RowMapper<T>,
    {
        let keys = {
            let mut stmt = self.bound_positional(sql, values, true).await?;
            stmt.execute_update().await?;
            stmt.take_generated_keys()
        };
        map_keys(&keys, &mut key_mapper)
    }

    /// Bind each element against one prepared statement and run them as a single batch.
    ///
    /// Returns one affected-row count per element, in element order.
    ///
    /// # Errors
    /// Returns the first binding error before anything executes, otherwise any driver error.
    pub async fn execute_batch(
        &mut self,
        sql: &str,
        elements: &[NamedParams],
    ) -> Result<Vec<i64>, NamedSqlError> {
        let mut stmt = self.prepare_named(sql).await?;
        queue_named(&mut stmt, elements)?;
        stmt.execute_batch().await
    }

    /// Positional form of [`execute_batch`](Self::execute_batch).
    ///
    /// # Errors
    /// Returns the first binding error before anything executes, otherwise any driver error.
    pub async fn execute_batch_positional(
        &mut self,
        sql: &str,
        elements: &[Vec<SqlValue>],
    ) -> Result<Vec<i64>, NamedSqlError> {
        let mut stmt = self.prepare(sql).await?;
        queue_positional(&mut stmt, elements)?;
        stmt.execute_batch().await
    }

    /// Run a batch and map the generated keys of all elements, concatenated in element order.
    ///
    /// # Errors
    /// Returns binding or driver errors, or the first mapper error.
    pub async fn execute_batch_with_generated_keys<T, M>(
        &mut self,
        sql: &str,
        elements: &[NamedParams],
        mut key_mapper: M,
    ) -> Result<Vec<T>, NamedSqlError>
    where
        M: RowMapper<T>,
    {
        let keys = {
            let mut stmt = self.prepare_named_with_generated_keys(sql).await?;
            queue_named(&mut stmt, elements)?;
            stmt.execute_batch().await?;
            stmt.take_generated_keys()
        };
        map_keys(&keys, &mut key_mapper)
    }

    /// Positional form of
    /// [`execute_batch_with_generated_keys`](Self::execute_batch_with_generated_keys).
    ///
    /// # Errors
    /// Returns binding or driver errors, or the first mapper error.
    pub async fn execute_batch_with_generated_keys_positional<T, M>(
        &mut self,
        sql: &str,
        elements: &[Vec<SqlValue>],
        mut key_mapper: M,
    ) -> Result<Vec<T>, NamedSqlError>
    where
        M: RowMapper<T>,
    {
        let keys = {
            let mut stmt = self.prepare_with_generated_keys(sql).await?;
            queue_positional(&mut stmt, elements)?;
            stmt.execute_batch().await?;
            stmt.take_generated_keys()
        };
        map_keys(&keys, &mut key_mapper)
    }
}

fn queue_named(stmt: &mut NamedStatement<'_>, elements: &[NamedParams]) -> Result<(), NamedSqlError> {
    for element in elements {
        stmt.bind_all(element)?;
        stmt.add_batch()?;
    }
    Ok(())
}

fn queue_positional(stmt: &mut Statement<'_>, elements: &[Vec<SqlValue>]) -> Result<(), NamedSqlError> {
    for element in elements {
        stmt.clear_parameters();
        stmt.bind_all_positional(element)?;
        stmt.add_batch()?;
    }
    Ok(())
}

fn map_keys<T, M>(keys: &ResultSet, key_mapper: &mut M) -> Result<Vec<T>, NamedSqlError>
where
    M: RowMapper<T>,
{
    tracing::trace!(keys = keys.len(), "mapping generated keys");
    map_rows(keys.rows(), key_mapper)
}
