#[cfg(feature = "postgres")]
use bb8::PooledConnection;

use crate::error::NamedSqlError;
#[cfg(feature = "postgres")]
use crate::postgres::PgManager;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteConnection;
use crate::translation::{ParsedSql, TranslationCache};
use crate::types::DatabaseType;

pub(crate) enum ConnectionKind {
    #[cfg(feature = "postgres")]
    Postgres(PooledConnection<'static, PgManager>),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteConnection),
}

/// A pooled connection, exclusively owned by one caller until dropped.
///
/// Statements prepared from it borrow it mutably, so they are always released first.
pub struct Connection {
    pub(crate) inner: ConnectionKind,
    cache: TranslationCache,
}

// Manual Debug implementation because pooled clients do not expose `Debug`
impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("db_type", &self.db_type())
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub(crate) fn new(inner: ConnectionKind, cache: TranslationCache) -> Self {
        Self { inner, cache }
    }

    #[must_use]
    pub fn db_type(&self) -> DatabaseType {
        match &self.inner {
            #[cfg(feature = "postgres")]
            ConnectionKind::Postgres(_) => DatabaseType::Postgres,
            #[cfg(feature = "sqlite")]
            ConnectionKind::Sqlite(_) => DatabaseType::Sqlite,
        }
    }

    pub(crate) fn translate(&self, sql: &str) -> std::sync::Arc<ParsedSql> {
        self.cache.translate(sql)
    }

    /// Borrow the underlying `tokio-postgres` client.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::Unimplemented`] when the connection is not Postgres.
    #[cfg(feature = "postgres")]
    pub fn postgres_client(&self) -> Result<&tokio_postgres::Client, NamedSqlError> {
        match &self.inner {
            ConnectionKind::Postgres(client) => Ok(&**client),
            #[cfg(feature = "sqlite")]
            ConnectionKind::Sqlite(_) => Err(NamedSqlError::Unimplemented(
                "postgres_client called on a non-postgres connection".into(),
            )),
        }
    }

    /// Run synchronous work against the raw `rusqlite::Connection` on a blocking thread.
    ///
    /// Useful for schema setup, pragmas that return rows, or anything else the executor does not
    /// cover. The closure must do all its work before returning.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::Unimplemented`] when the connection is not `SQLite`, otherwise
    /// whatever `func` returns.
    ///
    /// # Examples
    /// ```rust,no_run
    /// use named_sql::prelude::*;
    ///
    /// # async fn demo() -> Result<(), NamedSqlError> {
    /// let db = Database::connect(DbConfig::sqlite("app.db")).await?;
    /// let conn = db.get_connection().await?;
    /// conn.with_blocking_sqlite(|raw| {
    ///     raw.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);")?;
    ///     Ok(())
    /// })
    /// .await?;
    /// # Ok(()) }
    /// ```
    #[cfg(feature = "sqlite")]
    pub async fn with_blocking_sqlite<F, R>(&self, func: F) -> Result<R, NamedSqlError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, NamedSqlError> + Send + 'static,
        R: Send + 'static,
    {
        match &self.inner {
            ConnectionKind::Sqlite(conn) => conn.with_connection(func).await,
            #[cfg(feature = "postgres")]
            ConnectionKind::Postgres(_) => Err(NamedSqlError::Unimplemented(
                "with_blocking_sqlite called on a non-sqlite connection".into(),
            )),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        tracing::debug!(db_type = ?self.db_type(), "releasing connection");
    }
}
