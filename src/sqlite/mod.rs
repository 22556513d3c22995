// SQLite backend
//
// - config: bb8 connection manager and pool construction
// - params: binding `SqlValue`s as rusqlite values
// - query: result extraction
// - connection: blocking execution on a pooled connection

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use config::{SharedSqliteConnection, SqliteManager};
pub use connection::SqliteConnection;
pub use params::sql_value_to_sqlite;
pub use query::build_result_set;
