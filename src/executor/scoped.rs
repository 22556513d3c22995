//! Executor operations on [`Database`]: each call checks out a connection, runs the matching
//! [`Connection`] operation, and returns the connection to the pool before completing.

use crate::binding::NamedParams;
use crate::error::NamedSqlError;
use crate::mapper::RowMapper;
use crate::pool::{Connection, Database};
use crate::results::ResultCursor;
use crate::types::SqlValue;

use super::statement::{NamedStatement, Statement};

impl Database {
    /// Run `body` with a checked-out connection, returning it to the pool afterwards.
    ///
    /// ```rust,no_run
    /// use named_sql::prelude::*;
    ///
    /// # async fn demo(db: &Database) -> Result<(), NamedSqlError> {
    /// let total = db
    ///     .use_connection(async |conn| {
    ///         conn.execute_update("DELETE FROM audit WHERE done = :done", &named_params! { "done" => true })
    ///             .await?;
    ///         conn.execute_query_positional("SELECT COUNT(*) FROM audit", &[], |rows| {
    ///             rows.next().map(|row| row.try_get::<i64>(0_usize)).transpose()
    ///         })
    ///         .await
    ///     })
    ///     .await?;
    /// # let _ = total;
    /// # Ok(()) }
    /// ```
    ///
    /// # Errors
    /// Returns pool errors, or whatever `body` returns.
    pub async fn use_connection<R, F>(&self, body: F) -> Result<R, NamedSqlError>
    where
        F: AsyncFnOnce(&mut Connection) -> Result<R, NamedSqlError>,
    {
        let mut conn = self.get_connection().await?;
        body(&mut conn).await
    }

    /// See [`Connection::use_prepared_statement`].
    ///
    /// # Errors
    /// Returns pool or preparation errors, or whatever `body` returns.
    pub async fn use_prepared_statement<R, F>(&self, sql: &str, body: F) -> Result<R, NamedSqlError>
    where
        F: AsyncFnOnce(&mut Statement<'_>) -> Result<R, NamedSqlError>,
    {
        let mut conn = self.get_connection().await?;
        conn.use_prepared_statement(sql, body).await
    }

    /// See [`Connection::use_named_prepared_statement`].
    ///
    /// # Errors
    /// Returns pool or preparation errors, or whatever `body` returns.
    pub async fn use_named_prepared_statement<R, F>(
        &self,
        sql: &str,
        body: F,
    ) -> Result<R, NamedSqlError>
    where
        F: AsyncFnOnce(&mut NamedStatement<'_>) -> Result<R, NamedSqlError>,
    {
        let mut conn = self.get_connection().await?;
        conn.use_named_prepared_statement(sql, body).await
    }

    /// See [`Connection::execute_update`].
    ///
    /// # Errors
    /// Returns pool, binding or driver errors.
    pub async fn execute_update(&self, sql: &str, params: &NamedParams) -> Result<i64, NamedSqlError> {
        let mut conn = self.get_connection().await?;
        conn.execute_update(sql, params).await
    }

    /// See [`Connection::execute_update_positional`].
    ///
    /// # Errors
    /// Returns pool, binding or driver errors.
    pub async fn execute_update_positional(
        &self,
        sql: &str,
        values: &[SqlValue],
    ) -> Result<i64, NamedSqlError> {
        let mut conn = self.get_connection().await?;
        conn.execute_update_positional(sql, values).await
    }

    /// See [`Connection::execute_query`].
    ///
    /// # Errors
    /// Returns pool, binding, driver or mapper errors.
    pub async fn execute_query<T, F>(
        &self,
        sql: &str,
        params: &NamedParams,
        mapper: F,
    ) -> Result<Option<T>, NamedSqlError>
    where
        F: FnOnce(&mut ResultCursor) -> Result<Option<T>, NamedSqlError>,
    {
        let mut conn = self.get_connection().await?;
        conn.execute_query(sql, params, mapper).await
    }

    /// See [`Connection::execute_query_positional`].
    ///
    /// # Errors
    /// Returns pool, binding, driver or mapper errors.
    pub async fn execute_query_positional<T, F>(
        &self,
        sql: &str,
        values: &[SqlValue],
        mapper: F,
    ) -> Result<Option<T>, NamedSqlError>
    where
        F: FnOnce(&mut ResultCursor) -> Result<Option<T>, NamedSqlError>,
    {
        let mut conn = self.get_connection().await?;
        conn.execute_query_positional(sql, values, mapper).await
    }

    /// See [`Connection::find_all`].
    ///
    /// # Errors
    /// Returns pool, binding, driver or mapper errors.
    pub async fn find_all<T, M>(
        &self,
        sql: &str,
        params: &NamedParams,
        mapper: M,
    ) -> Result<Vec<T>, NamedSqlError>
    where
        M: RowMapper<T>,
    {
        let mut conn = self.get_connection().await?;
        conn.find_all(sql, params, mapper).await
    }

    /// See [`Connection::find_all_positional`].
    ///
    /// # Errors
    /// Returns pool, binding, driver or mapper errors.
    pub async fn find_all_positional<T, M>(
        &self,
        sql: &str,
        values: &[SqlValue],
        mapper: M,
    ) -> Result<Vec<T>, NamedSqlError>
    where
        M: RowMapper<T>,
    {
        let mut conn = self.get_connection().await?;
        conn.find_all_positional(sql, values, mapper).await
    }

    /// See [`Connection::execute_with_generated_keys`].
    ///
    /// # Errors
    /// Returns pool, binding, driver or mapper errors.
    pub async fn execute_with_generated_keys<T, M>(
        &self,
        sql: &str,
        params: &NamedParams,
        key_mapper: M,
    ) -> Result<Vec<T>, NamedSqlError>
    where
        M: RowMapper<T>,
    {
        let mut conn = self.get_connection().await?;
        conn.execute_with_generated_keys(sql, params, key_mapper).await
    }

    /// See [`Connection::execute_with_generated_keys_positional`].
    ///
    /// # Errors
    /// Returns pool, binding, driver or mapper errors.
    pub async fn execute_with_generated_keys_positional<T, M>(
        &self,
        sql: &str,
        values: &[SqlValue],
        key_mapper: M,
    ) -> Result<Vec<T>, NamedSqlError>
    where
        M: RowMapper<T>,
    {
        let mut conn = self.get_connection().await?;
        conn.execute_with_generated_keys_positional(sql, values, key_mapper)
            .await
    }

    /// See [`Connection::execute_batch`].
    ///
    /// # Errors
    /// Returns pool, binding or driver errors.
    pub async fn execute_batch(
        &self,
        sql: &str,
        elements: &[NamedParams],
    ) -> Result<Vec<i64>, NamedSqlError> {
        let mut conn = self.get_connection().await?;
        conn.execute_batch(sql, elements).await
    }

    /// See [`Connection::execute_batch_positional`].
    ///
    /// # Errors
    /// Returns pool, binding or driver errors.
    pub async fn execute_batch_positional(
        &self,
        sql: &str,
        elements: &[Vec<SqlValue>],
    ) -> Result<Vec<i64>, NamedSqlError> {
        let mut conn = self.get_connection().await?;
        conn.execute_batch_positional(sql, elements).await
    }

    /// See [`Connection::execute_batch_with_generated_keys`].
    ///
    /// # Errors
    /// Returns pool, binding, driver or mapper errors.
    pub async fn execute_batch_with_generated_keys<T, M>(
        &self,
        sql: &str,
        elements: &[NamedParams],
        key_mapper: M,
    ) -> Result<Vec<T>, NamedSqlError>
    where
        M: RowMapper<T>,
    {
        let mut conn = self.get_connection().await?;
        conn.execute_batch_with_generated_keys(sql, elements, key_mapper)
            .await
    }

    /// See [`Connection::execute_batch_with_generated_keys_positional`].
    ///
    /// # Errors
    /// Returns pool, binding, driver or mapper errors.
    pub async fn execute_batch_with_generated_keys_positional<T, M>(
        &self,
        sql: &str,
        elements: &[Vec<SqlValue>],
        key_mapper: M,
    ) -> Result<Vec<T>, NamedSqlError>
    where
        M: RowMapper<T>,
    {
        let mut conn = self.get_connection().await?;
        conn.execute_batch_with_generated_keys_positional(sql, elements, key_mapper)
            .await
    }
}
