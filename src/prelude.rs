//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::config::{DEFAULT_BATCH_SIZE, DaoConfig};
pub use crate::dao::{BatchReport, Dao, DaoConn};
pub use crate::dialect::{Dialect, GenericDialect, SqliteDialect};
pub use crate::error::DaoError;
pub use crate::expand::expand;
pub use crate::pool::{ConnectionProvider, SqliteProvider};
pub use crate::results::{MaterializeOptions, Record, ResultSet, materialize, materialize_first};
pub use crate::types::{CasePolicy, ParamValue, SortDirection};
