//! Dynamic SQL statement building and result materialization.
//!
//! Turns ad-hoc SQL templates with positional (`?`) or named (`:name`)
//! placeholders plus loosely structured parameter values into executable
//! parameterized statements, and turns result tables back into generic
//! ordered records. Sequence-valued parameters fan out into matching runs
//! of placeholders (`id in (?)` with three values becomes
//! `id in (?, ?, ?)`); large binary columns spool to caller-owned temp
//! files; the execution shell wraps units of work with connection,
//! transaction, and batch handling.

pub mod bind;
pub mod config;
pub mod dao;
pub mod dialect;
pub mod error;
pub mod expand;
pub mod pool;
pub mod prelude;
pub mod results;
pub mod types;

pub use config::{DEFAULT_BATCH_SIZE, DaoConfig};
pub use dao::{BatchReport, Dao, DaoConn};
pub use dialect::{Dialect, GenericDialect, SqliteDialect};
pub use error::DaoError;
pub use expand::expand;
pub use pool::{ConnectionProvider, SqliteProvider};
pub use results::{Record, ResultSet};
pub use types::{CasePolicy, ParamValue, SortDirection};
