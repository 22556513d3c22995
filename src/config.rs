use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NamedSqlError;
use crate::types::DatabaseType;

/// Connection settings for one database.
///
/// Built once by the caller and consumed by [`Database::connect`](crate::Database::connect).
/// For `SQLite`, `database` is the file path (or a `file:` URI) and the network fields are
/// ignored.
///
/// ```rust
/// use named_sql::prelude::*;
///
/// let cfg = DbConfig::from_json(r#"{
///     "db_type": "postgres",
///     "host": "localhost",
///     "port": 5432,
///     "username": "app",
///     "password": "secret",
///     "database": "orders",
///     "extras": { "application_name": "billing" }
/// }"#)?;
/// assert_eq!(cfg.port, Some(5432));
/// # Ok::<(), NamedSqlError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    pub db_type: DatabaseType,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    pub database: String,
    /// Driver-specific settings such as `pool_max_size`, `translation_cache_size` or
    /// `busy_timeout_ms`.
    #[serde(default)]
    pub extras: BTreeMap<String, String>,
}

impl DbConfig {
    #[cfg(feature = "postgres")]
    #[must_use]
    pub fn postgres(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            db_type: DatabaseType::Postgres,
            host: Some(host.into()),
            port: Some(port),
            username: Some(username.into()),
            password: Some(password.into()),
            database: database.into(),
            extras: BTreeMap::new(),
        }
    }

    #[cfg(feature = "sqlite")]
    #[must_use]
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            db_type: DatabaseType::Sqlite,
            host: None,
            port: None,
            username: None,
            password: None,
            database: path.into(),
            extras: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    /// Parse a configuration from JSON.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::ConfigError`] if the document is not a valid configuration.
    pub fn from_json(json: &str) -> Result<Self, NamedSqlError> {
        serde_json::from_str(json)
            .map_err(|e| NamedSqlError::ConfigError(format!("invalid configuration: {e}")))
    }

    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras.get(key).map(String::as_str)
    }

    /// Parse a numeric extra, if present.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::ConfigError`] when the value does not parse as `T`.
    pub fn parsed_extra<T: FromStr>(&self, key: &str) -> Result<Option<T>, NamedSqlError>
    where
        T::Err: std::fmt::Display,
    {
        self.extra(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|e| {
                    NamedSqlError::ConfigError(format!("extra `{key}` = `{raw}` is invalid: {e}"))
                })
            })
            .transpose()
    }

    pub(crate) fn require<'a>(
        field: &'a Option<String>,
        name: &str,
    ) -> Result<&'a str, NamedSqlError> {
        field
            .as_deref()
            .ok_or_else(|| NamedSqlError::ConfigError(format!("{name} is required")))
    }

    /// Warn about extras the selected driver does not understand.
    pub(crate) fn warn_unknown_extras(&self, known: &[&str]) {
        for key in self.extras.keys() {
            if !known.contains(&key.as_str()) {
                tracing::warn!(extra = %key, db_type = ?self.db_type, "ignoring unrecognised configuration extra");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "sqlite")]
    #[test]
    fn parsed_extra_reports_bad_numbers() {
        let cfg = DbConfig::sqlite("x.db")
            .with_extra("pool_max_size", "four")
            .with_extra("busy_timeout_ms", "250");
        assert!(matches!(
            cfg.parsed_extra::<u32>("pool_max_size"),
            Err(NamedSqlError::ConfigError(_))
        ));
        assert_eq!(cfg.parsed_extra::<u64>("busy_timeout_ms").unwrap(), Some(250));
        assert_eq!(cfg.parsed_extra::<u64>("absent").unwrap(), None);
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_json_needs_only_path() {
        let cfg = DbConfig::from_json(r#"{"db_type":"sqlite","database":"app.db"}"#).unwrap();
        assert_eq!(cfg, DbConfig::sqlite("app.db"));
    }

    #[test]
    fn rejects_unknown_driver_kind() {
        let err = DbConfig::from_json(r#"{"db_type":"oracle","database":"x"}"#).unwrap_err();
        assert!(matches!(err, NamedSqlError::ConfigError(_)));
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn require_names_the_missing_field() {
        let mut cfg = DbConfig::postgres("localhost", 5432, "u", "p", "db");
        cfg.host = None;
        let err = DbConfig::require(&cfg.host, "host").unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: host is required");
    }
}
