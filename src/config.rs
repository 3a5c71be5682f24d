use std::path::PathBuf;
use std::sync::Arc;

use crate::dialect::{Dialect, GenericDialect};
use crate::types::CasePolicy;

/// Default number of queued batch entries beyond which a flush happens.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Explicit configuration for the execution shell.
///
/// Held by [`Dao`](crate::dao::Dao) and passed down to expansion and
/// materialization; defaults are supplied at construction rather than read
/// from ambient global state.
#[derive(Debug, Clone)]
pub struct DaoConfig {
    /// Casing applied to materialized column names.
    pub case_policy: CasePolicy,
    /// Queued-entry threshold for batch flushes.
    pub batch_size: usize,
    /// Directory for spooled large-binary values; the process temp
    /// directory when `None`. Spooled files are owned by the caller.
    pub spool_dir: Option<PathBuf>,
    /// Active dialect strategy.
    pub dialect: Arc<dyn Dialect>,
}

impl Default for DaoConfig {
    fn default() -> Self {
        Self {
            case_policy: CasePolicy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            spool_dir: None,
            dialect: Arc::new(GenericDialect),
        }
    }
}

impl DaoConfig {
    #[must_use]
    pub fn with_case_policy(mut self, case_policy: CasePolicy) -> Self {
        self.case_policy = case_policy;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_spool_dir(mut self, spool_dir: impl Into<PathBuf>) -> Self {
        self.spool_dir = Some(spool_dir.into());
        self
    }

    #[must_use]
    pub fn with_dialect(mut self, dialect: Arc<dyn Dialect>) -> Self {
        self.dialect = dialect;
        self
    }
}
