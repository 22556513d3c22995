use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bb8::{ManageConnection, Pool};
use rusqlite::OpenFlags;
use tokio::sync::Mutex;

use crate::config::DbConfig;
use crate::error::NamedSqlError;

/// A `rusqlite` connection shared between the pool and the blocking worker that runs statements.
pub type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

pub(crate) const KNOWN_EXTRAS: [&str; 4] = [
    "pool_max_size",
    "translation_cache_size",
    "busy_timeout_ms",
    "journal_mode",
];

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// bb8 manager for `SQLite` connections.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    path: String,
    busy_timeout: Duration,
    journal_mode: Option<String>,
}

impl SqliteManager {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            journal_mode: None,
        }
    }

    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_journal_mode(mut self, mode: impl Into<String>) -> Self {
        self.journal_mode = Some(mode.into());
        self
    }

    fn open(&self) -> Result<rusqlite::Connection, rusqlite::Error> {
        let conn = rusqlite::Connection::open_with_flags(&self.path, OpenFlags::default())?;
        conn.busy_timeout(self.busy_timeout)?;
        if let Some(mode) = &self.journal_mode {
            // journal_mode returns a row, so it is read rather than executed
            let _: String = conn.query_row(&format!("PRAGMA journal_mode = {mode}"), [], |row| {
                row.get(0)
            })?;
        }
        Ok(conn)
    }
}

impl ManageConnection for SqliteManager {
    type Connection = SharedSqliteConnection;
    type Error = rusqlite::Error;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let opened = self.open();
        async move {
            let conn = opened?;
            tracing::debug!("sqlite connection opened");
            Ok(Arc::new(Mutex::new(conn)))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move {
            let guard = conn.lock().await;
            guard.query_row("SELECT 1", [], |_| Ok(()))
        }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

/// Build a `SQLite` pool from a configuration and check one connection out as a smoke test.
///
/// # Errors
/// Returns `NamedSqlError::ConfigError` for an empty path or bad extras, and
/// `NamedSqlError::ConnectionError` if the database cannot be opened.
pub async fn build_pool(config: &DbConfig) -> Result<Pool<SqliteManager>, NamedSqlError> {
    if config.database.trim().is_empty() {
        return Err(NamedSqlError::ConfigError(
            "database path is required".to_string(),
        ));
    }
    config.warn_unknown_extras(&KNOWN_EXTRAS);

    let mut manager = SqliteManager::new(config.database.clone());
    if let Some(ms) = config.parsed_extra::<u64>("busy_timeout_ms")? {
        manager = manager.with_busy_timeout(Duration::from_millis(ms));
    }
    if let Some(mode) = config.extra("journal_mode") {
        if !mode.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(NamedSqlError::ConfigError(format!(
                "journal_mode `{mode}` is not a valid mode name"
            )));
        }
        manager = manager.with_journal_mode(mode);
    }

    let mut builder = Pool::builder();
    if let Some(max) = config.parsed_extra::<u32>("pool_max_size")? {
        builder = builder.max_size(max);
    }
    let pool = builder.build(manager).await.map_err(|e| {
        NamedSqlError::ConnectionError(format!("Failed to create SQLite pool: {e}"))
    })?;

    {
        let _smoke = pool.get().await.map_err(|e| {
            NamedSqlError::ConnectionError(format!("sqlite checkout error: {e}"))
        })?;
    }
    tracing::debug!(path = %config.database, "sqlite pool ready");
    Ok(pool)
}
