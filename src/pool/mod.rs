//! Connection factory: one pool per [`Database`], checked out as [`Connection`]s.

mod connection;

use bb8::Pool;

pub use connection::Connection;
pub(crate) use connection::ConnectionKind;

use crate::config::DbConfig;
use crate::error::NamedSqlError;
#[cfg(feature = "postgres")]
use crate::postgres::PgManager;
#[cfg(feature = "sqlite")]
use crate::sqlite::{SqliteConnection, SqliteManager};
use crate::translation::{DEFAULT_TRANSLATION_CACHE_SIZE, TranslationCache};
use crate::types::DatabaseType;

/// Connection pool for one database engine.
#[derive(Clone)]
pub enum DbPool {
    #[cfg(feature = "postgres")]
    Postgres(Pool<PgManager>),
    #[cfg(feature = "sqlite")]
    Sqlite(Pool<SqliteManager>),
}

// Manual Debug implementation; the managers carry credentials
impl std::fmt::Debug for DbPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(pool) => f.debug_tuple("Postgres").field(&pool.state()).finish(),
            #[cfg(feature = "sqlite")]
            Self::Sqlite(pool) => f.debug_tuple("Sqlite").field(&pool.state()).finish(),
        }
    }
}

/// Handle to a configured database.
///
/// Cloning is cheap: clones share the pool and the translation cache. Every executor operation on
/// `Database` checks out its own connection and returns it before the call completes.
///
/// ```rust,no_run
/// use named_sql::prelude::*;
///
/// # async fn demo() -> Result<(), NamedSqlError> {
/// let db = Database::connect(DbConfig::sqlite("app.db")).await?;
/// let updated = db
///     .execute_update("UPDATE users SET active = :active", &named_params! { "active" => true })
///     .await?;
/// # let _ = updated;
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct Database {
    pool: DbPool,
    db_type: DatabaseType,
    cache: TranslationCache,
}

impl Database {
    /// Validate `config`, build the pool and prove it can hand out a connection.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::ConfigError`] for invalid settings, or the driver/pool error
    /// raised while opening the first connection.
    pub async fn connect(config: DbConfig) -> Result<Self, NamedSqlError> {
        let cache_size = config
            .parsed_extra::<usize>("translation_cache_size")?
            .unwrap_or(DEFAULT_TRANSLATION_CACHE_SIZE);
        let pool = match config.db_type {
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => DbPool::Postgres(crate::postgres::config::build_pool(&config).await?),
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => DbPool::Sqlite(crate::sqlite::config::build_pool(&config).await?),
        };
        tracing::debug!(db_type = ?config.db_type, database = %config.database, "connection pool ready");
        Ok(Self {
            pool,
            db_type: config.db_type,
            cache: TranslationCache::with_capacity(cache_size),
        })
    }

    #[must_use]
    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    #[must_use]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Translations of named-parameter SQL shared by every connection from this handle.
    #[must_use]
    pub fn translation_cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Check a connection out of the pool. It returns to the pool when dropped.
    ///
    /// # Errors
    /// Returns a pool error when no connection can be obtained.
    pub async fn get_connection(&self) -> Result<Connection, NamedSqlError> {
        let inner = match &self.pool {
            #[cfg(feature = "postgres")]
            DbPool::Postgres(pool) => ConnectionKind::Postgres(
                pool.get_owned()
                    .await
                    .map_err(NamedSqlError::PoolErrorPostgres)?,
            ),
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(pool) => ConnectionKind::Sqlite(SqliteConnection::checkout(pool).await?),
        };
        tracing::debug!(db_type = ?self.db_type, "acquired connection");
        Ok(Connection::new(inner, self.cache.clone()))
    }
}
