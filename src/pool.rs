use std::path::PathBuf;

use rusqlite::Connection;

use crate::error::DaoError;

/// Hands a connection to each unit of work.
///
/// Pooling policy lives entirely behind this boundary; the shell acquires
/// one connection per unit of work and owns it exclusively until release.
pub trait ConnectionProvider {
    /// Acquire a connection.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError::ConnectionError`] if no connection can be opened.
    fn acquire(&self) -> Result<Connection, DaoError>;
}

/// Provider opening a fresh SQLite connection per acquire.
///
/// In-memory databases are private to their connection; use a file path
/// (or a `file::memory:?cache=shared` URI) when separate units of work must
/// see the same data.
#[derive(Debug, Clone)]
pub enum SqliteProvider {
    Memory,
    File(PathBuf),
}

impl SqliteProvider {
    #[must_use]
    pub fn memory() -> Self {
        SqliteProvider::Memory
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        SqliteProvider::File(path.into())
    }
}

impl ConnectionProvider for SqliteProvider {
    fn acquire(&self) -> Result<Connection, DaoError> {
        let opened = match self {
            SqliteProvider::Memory => Connection::open_in_memory(),
            SqliteProvider::File(path) => Connection::open(path),
        };
        opened.map_err(|e| DaoError::ConnectionError(format!("cannot open SQLite database: {e}")))
    }
}
