use thiserror::Error;

/// Errors surfaced by the statement-building and execution layer.
///
/// Driver failures are wrapped with enough context (failing SQL text, slot
/// index) to diagnose without a debugger.
#[derive(Debug, Error)]
pub enum DaoError {
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Binding parameter {index} failed: {source}")]
    BindingError {
        /// 1-based slot index of the parameter that failed to bind.
        index: usize,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Execution failed for `{sql}`: {source}")]
    ExecutionError {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Commit failed: {0}")]
    CommitError(#[source] rusqlite::Error),

    #[error("Rollback failed: {source} (while handling: {cause})")]
    RollbackError {
        #[source]
        source: rusqlite::Error,
        /// The error that triggered the rollback attempt.
        cause: Box<DaoError>,
    },

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Large value spool error: {0}")]
    SpoolError(#[from] std::io::Error),
}

impl DaoError {
    pub(crate) fn execution(sql: &str, source: rusqlite::Error) -> Self {
        DaoError::ExecutionError {
            sql: sql.to_string(),
            source,
        }
    }
}
