//! Named-parameter SQL for Postgres and `SQLite`.
//!
//! SQL is written with `:name` placeholders, translated once into positional markers, bound from a
//! [`NamedParams`] map, and executed through scoped operations that always release the statement
//! and then the connection, whatever the outcome.
//!
//! ```rust,no_run
//! use named_sql::prelude::*;
//!
//! # async fn demo() -> Result<(), NamedSqlError> {
//! let db = Database::connect(DbConfig::sqlite("app.db")).await?;
//! let ids = db
//!     .execute_with_generated_keys(
//!         "INSERT INTO users (name, active) VALUES (:name, :active)",
//!         &named_params! { "name" => "alice", "active" => true },
//!         column::<i64, _>(0_usize),
//!     )
//!     .await?;
//! let names = db
//!     .find_all(
//!         "SELECT name FROM users WHERE id = :id",
//!         &named_params! { "id" => ids[0] },
//!         |row: &Row| row.try_get::<String>("name"),
//!     )
//!     .await?;
//! # let _ = names;
//! # Ok(()) }
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod executor;
pub mod mapper;
pub mod pool;
pub mod prelude;
pub mod results;
pub mod translation;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use binding::{NamedParams, ParamSlots};
pub use config::DbConfig;
pub use error::{NamedSqlError, Result};
pub use executor::{NamedStatement, Statement};
pub use mapper::RowMapper;
pub use pool::{Connection, Database, DbPool};
pub use results::{ResultCursor, ResultSet, Row};
pub use translation::{ParsedSql, translate_named};
pub use types::{DatabaseType, SqlEnum, SqlValue};
