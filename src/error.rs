use thiserror::Error;

#[derive(Debug, Error)]
pub enum NamedSqlError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PoolErrorPostgres(#[from] bb8::RunError<tokio_postgres::Error>),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("no value supplied for named parameter `{0}`")]
    MissingParameter(String),

    #[error("named parameter `{0}` does not appear in the statement")]
    UnknownParameter(String),

    #[error("Parameter binding error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Row mapping error: {0}")]
    MappingError(String),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),
}

impl NamedSqlError {
    /// Wrap any displayable failure raised inside a row or key mapper.
    pub fn mapping(err: impl std::fmt::Display) -> Self {
        NamedSqlError::MappingError(err.to_string())
    }

    /// True for failures raised while binding values, before anything reached the driver.
    #[must_use]
    pub fn is_binding_error(&self) -> bool {
        matches!(
            self,
            NamedSqlError::MissingParameter(_)
                | NamedSqlError::UnknownParameter(_)
                | NamedSqlError::ParameterError(_)
        )
    }

    /// True for failures reported by the underlying driver or its pool.
    #[must_use]
    pub fn is_driver_error(&self) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            NamedSqlError::PostgresError(_) | NamedSqlError::PoolErrorPostgres(_) => true,
            #[cfg(feature = "sqlite")]
            NamedSqlError::SqliteError(_) => true,
            NamedSqlError::ConnectionError(_) | NamedSqlError::ExecutionError(_) => true,
            _ => false,
        }
    }

    #[must_use]
    pub fn is_mapping_error(&self) -> bool {
        matches!(self, NamedSqlError::MappingError(_))
    }
}

pub type Result<T, E = NamedSqlError> = std::result::Result<T, E>;
