use std::sync::Arc;

use crate::error::NamedSqlError;
use crate::pool::{Connection, ConnectionKind};
use crate::results::ResultSet;
#[cfg(feature = "postgres")]
use crate::postgres;
#[cfg(feature = "sqlite")]
use crate::sqlite::params::convert_params;
use crate::translation::has_returning_clause;
#[cfg(feature = "postgres")]
use crate::translation::{PlaceholderStyle, render_positional, trim_statement_end};
use crate::types::SqlValue;

use super::{BatchOutcome, ExecOutcome, KeyMode};

/// A statement prepared on one backend.
pub(crate) struct Prepared {
    /// SQL text as sent to the driver.
    pub(crate) sql: Arc<str>,
    pub(crate) keys: KeyMode,
    pub(crate) parameter_count: usize,
    handle: Handle,
}

enum Handle {
    #[cfg(feature = "postgres")]
    Postgres(tokio_postgres::Statement),
    /// `SQLite` statements live in the connection's statement cache, keyed by `Prepared::sql`.
    #[cfg(feature = "sqlite")]
    Sqlite,
}

impl std::fmt::Debug for Prepared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prepared")
            .field("sql", &self.sql)
            .field("keys", &self.keys)
            .field("parameter_count", &self.parameter_count)
            .finish_non_exhaustive()
    }
}

/// Ask Postgres for the inserted rows, ending the clause before any trailing comment.
#[cfg(feature = "postgres")]
fn append_returning(sql: &str) -> String {
    format!("{} RETURNING *", trim_statement_end(sql))
}

fn mismatched_backend() -> NamedSqlError {
    NamedSqlError::ExecutionError("statement was prepared on a different backend".into())
}

impl Connection {
    /// Prepare `?`-style SQL on this connection's backend.
    pub(crate) async fn prepare_backend(
        &self,
        sql: &str,
        generated_keys: bool,
    ) -> Result<Prepared, NamedSqlError> {
        let explicit_returning = generated_keys && has_returning_clause(sql);
        let prepared = match &self.inner {
            #[cfg(feature = "postgres")]
            ConnectionKind::Postgres(client) => {
                let rendered = render_positional(sql, PlaceholderStyle::Postgres);
                let text = if generated_keys && !explicit_returning {
                    append_returning(&rendered)
                } else {
                    rendered.into_owned()
                };
                let stmt = postgres::executor::prepare(client, &text).await?;
                Prepared {
                    sql: Arc::from(text),
                    keys: if generated_keys { KeyMode::Returning } else { KeyMode::None },
                    parameter_count: stmt.params().len(),
                    handle: Handle::Postgres(stmt),
                }
            }
            #[cfg(feature = "sqlite")]
            ConnectionKind::Sqlite(conn) => {
                let text: Arc<str> = Arc::from(sql);
                let parameter_count = conn.prepare(Arc::clone(&text)).await?;
                let keys = match (generated_keys, explicit_returning) {
                    (false, _) => KeyMode::None,
                    (true, true) => KeyMode::Returning,
                    (true, false) => KeyMode::LastInsertRowid,
                };
                Prepared {
                    sql: text,
                    keys,
                    parameter_count,
                    handle: Handle::Sqlite,
                }
            }
        };
        tracing::debug!(
            sql = %prepared.sql,
            parameters = prepared.parameter_count,
            keys = ?prepared.keys,
            "prepared statement"
        );
        Ok(prepared)
    }

    pub(crate) async fn run_execute(
        &self,
        prepared: &Prepared,
        params: &[SqlValue],
    ) -> Result<ExecOutcome, NamedSqlError> {
        match (&self.inner, &prepared.handle) {
            #[cfg(feature = "postgres")]
            (ConnectionKind::Postgres(client), Handle::Postgres(stmt)) => {
                postgres::executor::execute(&**client, stmt, params, prepared.keys).await
            }
            #[cfg(feature = "sqlite")]
            (ConnectionKind::Sqlite(conn), Handle::Sqlite) => {
                conn.execute(Arc::clone(&prepared.sql), convert_params(params), prepared.keys)
                    .await
            }
            #[allow(unreachable_patterns)]
            _ => Err(mismatched_backend()),
        }
    }

    pub(crate) async fn run_query(
        &self,
        prepared: &Prepared,
        params: &[SqlValue],
    ) -> Result<ResultSet, NamedSqlError> {
        match (&self.inner, &prepared.handle) {
            #[cfg(feature = "postgres")]
            (ConnectionKind::Postgres(client), Handle::Postgres(stmt)) => {
                postgres::executor::query(&**client, stmt, params).await
            }
            #[cfg(feature = "sqlite")]
            (ConnectionKind::Sqlite(conn), Handle::Sqlite) => {
                conn.query(Arc::clone(&prepared.sql), convert_params(params)).await
            }
            #[allow(unreachable_patterns)]
            _ => Err(mismatched_backend()),
        }
    }

    pub(crate) async fn run_batch(
        &mut self,
        prepared: &Prepared,
        batch: &[Vec<SqlValue>],
    ) -> Result<BatchOutcome, NamedSqlError> {
        match (&mut self.inner, &prepared.handle) {
            #[cfg(feature = "postgres")]
            (ConnectionKind::Postgres(client), Handle::Postgres(stmt)) => {
                postgres::executor::execute_batch(&mut **client, stmt, batch, prepared.keys).await
            }
            #[cfg(feature = "sqlite")]
            (ConnectionKind::Sqlite(conn), Handle::Sqlite) => {
                let converted = batch.iter().map(|entry| convert_params(entry)).collect();
                conn.execute_batch(Arc::clone(&prepared.sql), converted, prepared.keys)
                    .await
            }
            #[allow(unreachable_patterns)]
            _ => Err(mismatched_backend()),
        }
    }
}

#[cfg(all(test, feature = "postgres"))]
mod tests {
    use super::append_returning;
    use crate::translation::{
        PlaceholderStyle, has_returning_clause, render_positional, translate_named,
    };

    fn postgres_text(named: &str) -> String {
        let parsed = translate_named(named);
        render_positional(parsed.sql(), PlaceholderStyle::Postgres).into_owned()
    }

    #[test]
    fn returning_replaces_trailing_semicolon() {
        assert_eq!(
            append_returning("INSERT INTO t (a) VALUES ($1);  "),
            "INSERT INTO t (a) VALUES ($1) RETURNING *"
        );
    }

    #[test]
    fn returning_lands_before_trailing_comment() {
        let sql = append_returning("INSERT INTO t (a) VALUES ($1) -- audit row");
        assert_eq!(sql, "INSERT INTO t (a) VALUES ($1) RETURNING *");
        assert!(has_returning_clause(&sql));

        let sql = append_returning("INSERT INTO t (a) VALUES ($1); /* done */\n");
        assert_eq!(sql, "INSERT INTO t (a) VALUES ($1) RETURNING *");
    }

    #[test]
    fn named_sql_renders_for_postgres() {
        let sql = postgres_text(
            "INSERT INTO moods (id, mood, note) VALUES (:id, :mood::named_sql_mood, ':keep') -- :id",
        );
        assert_eq!(
            sql,
            "INSERT INTO moods (id, mood, note) VALUES ($1, $2::named_sql_mood, ':keep') -- :id"
        );
        assert_eq!(
            append_returning(&sql),
            "INSERT INTO moods (id, mood, note) VALUES ($1, $2::named_sql_mood, ':keep') RETURNING *"
        );
    }

    #[test]
    fn explicit_returning_is_detected_after_rendering() {
        let sql = postgres_text("INSERT INTO t (a) VALUES (:a) RETURNING id; -- note");
        assert_eq!(sql, "INSERT INTO t (a) VALUES ($1) RETURNING id; -- note");
        assert!(has_returning_clause(&sql));
    }
}
