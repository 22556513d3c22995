use std::fmt;
use std::sync::Arc;

use bb8::{Pool, PooledConnection};
use rusqlite::ToSql;
use rusqlite::types::Value;

use crate::error::NamedSqlError;
use crate::executor::{BatchOutcome, ExecOutcome, KeyMode};
use crate::results::ResultSet;
use crate::types::SqlValue;

use super::config::{SharedSqliteConnection, SqliteManager};
use super::query::build_result_set;

/// Column name `SQLite` reports for rowid-based generated keys.
pub const LAST_INSERT_ROWID: &str = "last_insert_rowid()";

/// Connection wrapper backed by a bb8 pooled `SQLite` connection.
pub struct SqliteConnection {
    conn: PooledConnection<'static, SqliteManager>,
}

impl SqliteConnection {
    pub(crate) async fn checkout(pool: &Pool<SqliteManager>) -> Result<Self, NamedSqlError> {
        let conn = pool.get_owned().await.map_err(|e| {
            NamedSqlError::ConnectionError(format!("sqlite checkout error: {e}"))
        })?;
        Ok(Self { conn })
    }

    /// Run synchronous work against the raw `rusqlite::Connection` on a blocking thread.
    ///
    /// # Errors
    /// Propagates whatever `func` returns, or an `ExecutionError` if the blocking task panics.
    pub async fn with_connection<F, R>(&self, func: F) -> Result<R, NamedSqlError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, NamedSqlError> + Send + 'static,
        R: Send + 'static,
    {
        run_blocking(self.conn_handle(), func).await
    }

    pub(crate) fn conn_handle(&self) -> SharedSqliteConnection {
        Arc::clone(&*self.conn)
    }

    /// Prepare (and cache) a statement, returning its parameter count.
    pub(crate) async fn prepare(&self, sql: Arc<str>) -> Result<usize, NamedSqlError> {
        run_blocking(self.conn_handle(), move |guard| {
            let stmt = guard.prepare_cached(&sql)?;
            Ok(stmt.parameter_count())
        })
        .await
    }

    pub(crate) async fn query(
        &self,
        sql: Arc<str>,
        params: Vec<Value>,
    ) -> Result<ResultSet, NamedSqlError> {
        run_blocking(self.conn_handle(), move |guard| {
            let mut stmt = guard.prepare_cached(&sql)?;
            build_result_set(&mut stmt, &params)
        })
        .await
    }

    pub(crate) async fn execute(
        &self,
        sql: Arc<str>,
        params: Vec<Value>,
        keys: KeyMode,
    ) -> Result<ExecOutcome, NamedSqlError> {
        run_blocking(self.conn_handle(), move |guard| {
            execute_one(guard, &sql, &params, keys)
        })
        .await
    }

    /// Execute every batch entry against one cached statement.
    ///
    /// Runs inside a transaction when the connection is in autocommit mode, so a failing entry
    /// leaves no partial batch behind.
    pub(crate) async fn execute_batch(
        &self,
        sql: Arc<str>,
        batch: Vec<Vec<Value>>,
        keys: KeyMode,
    ) -> Result<BatchOutcome, NamedSqlError> {
        run_blocking(self.conn_handle(), move |guard| {
            if guard.is_autocommit() {
                let tx = guard.transaction()?;
                let outcome = execute_entries(&tx, &sql, &batch, keys)?;
                tx.commit()?;
                Ok(outcome)
            } else {
                execute_entries(guard, &sql, &batch, keys)
            }
        })
        .await
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection").finish_non_exhaustive()
    }
}

fn execute_entries(
    conn: &rusqlite::Connection,
    sql: &str,
    batch: &[Vec<Value>],
    keys: KeyMode,
) -> Result<BatchOutcome, NamedSqlError> {
    let mut outcome = BatchOutcome::with_capacity(batch.len(), keys);
    for params in batch {
        outcome.push(execute_one(conn, sql, params, keys)?);
    }
    Ok(outcome)
}

fn execute_one(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[Value],
    keys: KeyMode,
) -> Result<ExecOutcome, NamedSqlError> {
    let mut stmt = conn.prepare_cached(sql)?;
    match keys {
        KeyMode::Returning => {
            let rows = build_result_set(&mut stmt, params)?;
            Ok(ExecOutcome {
                count: row_count(rows.len())?,
                keys: Some(rows),
            })
        }
        KeyMode::None | KeyMode::LastInsertRowid => {
            let refs: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
            let affected = stmt.execute(&refs[..])?;
            let generated = (keys == KeyMode::LastInsertRowid)
                .then(|| last_insert_rowid(conn, affected));
            Ok(ExecOutcome {
                count: row_count(affected)?,
                keys: generated,
            })
        }
    }
}

fn last_insert_rowid(conn: &rusqlite::Connection, affected: usize) -> ResultSet {
    let mut rows = ResultSet::with_columns(vec![LAST_INSERT_ROWID.to_string()], 1);
    if affected > 0 {
        rows.add_row_values(vec![SqlValue::Int(conn.last_insert_rowid())]);
    }
    rows
}

fn row_count(count: usize) -> Result<i64, NamedSqlError> {
    i64::try_from(count).map_err(|e| {
        NamedSqlError::ExecutionError(format!("sqlite affected rows conversion error: {e}"))
    })
}

pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, NamedSqlError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, NamedSqlError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| NamedSqlError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}
