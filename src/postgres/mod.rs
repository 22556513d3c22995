// PostgreSQL backend
//
// - config: bb8 connection manager and pool construction
// - params: `ToSql` for `SqlValue`
// - numeric: binary `NUMERIC` codec
// - query: result extraction
// - executor: prepared execution on a pooled client

pub mod config;
pub mod executor;
mod numeric;
pub mod params;
pub mod query;

pub use config::PgManager;
pub use params::Params;
pub use query::{build_result_set_from_statement, postgres_extract_value};
