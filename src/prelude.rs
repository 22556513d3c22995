//! Convenient imports for common functionality.

pub use crate::binding::NamedParams;
pub use crate::config::DbConfig;
pub use crate::error::NamedSqlError;
pub use crate::executor::{NamedStatement, Statement};
pub use crate::mapper::{RowMapper, column};
pub use crate::named_params;
pub use crate::pool::{Connection, Database};
pub use crate::results::{ColumnIndex, FromSqlValue, ResultCursor, ResultSet, Row};
pub use crate::translation::{ParsedSql, PlaceholderStyle, translate_named};
pub use crate::types::{DatabaseType, SqlEnum, SqlValue};
