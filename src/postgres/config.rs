use std::future::Future;
use std::time::Duration;

use bb8::{ManageConnection, Pool};
use tokio_postgres::{Client, NoTls};

use crate::config::DbConfig;
use crate::error::NamedSqlError;

pub(crate) const KNOWN_EXTRAS: [&str; 5] = [
    "pool_max_size",
    "translation_cache_size",
    "application_name",
    "connect_timeout_secs",
    "options",
];

/// bb8 manager for Postgres clients.
#[derive(Debug, Clone)]
pub struct PgManager {
    pub(crate) config: tokio_postgres::Config,
}

impl PgManager {
    #[must_use]
    pub fn new(config: tokio_postgres::Config) -> Self {
        Self { config }
    }

    /// Translate a [`DbConfig`] into driver settings.
    ///
    /// # Errors
    /// Returns `NamedSqlError::ConfigError` if a required field is missing or an extra is invalid.
    pub fn from_config(config: &DbConfig) -> Result<Self, NamedSqlError> {
        let host = DbConfig::require(&config.host, "host")?;
        let port = config
            .port
            .ok_or_else(|| NamedSqlError::ConfigError("port is required".to_string()))?;
        let user = DbConfig::require(&config.username, "username")?;
        if config.database.trim().is_empty() {
            return Err(NamedSqlError::ConfigError(
                "database is required".to_string(),
            ));
        }
        config.warn_unknown_extras(&KNOWN_EXTRAS);

        let mut pg = tokio_postgres::Config::new();
        pg.host(host).port(port).user(user).dbname(&config.database);
        if let Some(password) = &config.password {
            pg.password(password);
        }
        if let Some(name) = config.extra("application_name") {
            pg.application_name(name);
        }
        if let Some(secs) = config.parsed_extra::<u64>("connect_timeout_secs")? {
            pg.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(options) = config.extra("options") {
            pg.options(options);
        }
        Ok(Self::new(pg))
    }

    /// Build a pool from this manager.
    ///
    /// # Errors
    /// Returns `NamedSqlError` if pool creation fails.
    pub async fn build_pool(self, max_size: Option<u32>) -> Result<Pool<PgManager>, NamedSqlError> {
        let mut builder = Pool::builder();
        if let Some(max) = max_size {
            builder = builder.max_size(max);
        }
        builder
            .build(self)
            .await
            .map_err(|e| NamedSqlError::ConnectionError(format!("postgres pool error: {e}")))
    }
}

impl ManageConnection for PgManager {
    type Connection = Client;
    type Error = tokio_postgres::Error;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let cfg = self.config.clone();
        async move {
            tracing::debug!(
                hosts = ?cfg.get_hosts(),
                db = ?cfg.get_dbname(),
                user = ?cfg.get_user(),
                "postgres connect start"
            );
            let (client, connection) = cfg.connect(NoTls).await?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::warn!(error = %e, "postgres connection closed with error");
                }
            });
            Ok(client)
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move { conn.simple_query("SELECT 1").await.map(|_| ()) }
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        conn.is_closed()
    }
}

/// Build a Postgres pool from a configuration and check one connection out as a smoke test.
///
/// # Errors
/// Returns `NamedSqlError::ConfigError` for missing fields, or `PoolErrorPostgres` if the first
/// connection cannot be opened.
pub async fn build_pool(config: &DbConfig) -> Result<Pool<PgManager>, NamedSqlError> {
    let manager = PgManager::from_config(config)?;
    let max_size = config.parsed_extra::<u32>("pool_max_size")?;
    let pool = manager.build_pool(max_size).await?;
    {
        let _smoke = pool.get().await?;
    }
    tracing::debug!(database = %config.database, "postgres pool ready");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_maps_fields_and_extras() {
        let cfg = DbConfig::postgres("db.internal", 6543, "app", "pw", "orders")
            .with_extra("application_name", "billing")
            .with_extra("connect_timeout_secs", "3");
        let manager = PgManager::from_config(&cfg).unwrap();
        assert_eq!(manager.config.get_ports(), &[6543]);
        assert_eq!(manager.config.get_user(), Some("app"));
        assert_eq!(manager.config.get_dbname(), Some("orders"));
        assert_eq!(manager.config.get_application_name(), Some("billing"));
        assert_eq!(
            manager.config.get_connect_timeout(),
            Some(&Duration::from_secs(3))
        );
    }

    #[test]
    fn missing_username_is_config_error() {
        let mut cfg = DbConfig::postgres("localhost", 5432, "u", "p", "db");
        cfg.username = None;
        let err = PgManager::from_config(&cfg).unwrap_err();
        assert!(matches!(err, NamedSqlError::ConfigError(msg) if msg.contains("username")));
    }
}
