//! Execution and transaction shell: acquires a connection, runs a unit of
//! work, and guarantees resource release on every exit path.

use std::ops::Range;

use serde::Serialize;

use crate::bind;
use crate::config::DaoConfig;
use crate::error::DaoError;
use crate::expand::expand;
use crate::pool::ConnectionProvider;
use crate::results::{self, MaterializeOptions, Record, ResultSet};
use crate::types::{CasePolicy, ParamValue, SortDirection};

/// Outcome of a parameterized batch execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Tuples queued across the whole run.
    pub rows: usize,
    /// Flush operations performed (threshold flushes plus the final one).
    pub flushes: usize,
    /// Total rows affected as reported by the driver.
    pub rows_affected: usize,
}

/// Entry point for callers: a connection provider plus configuration.
///
/// Every operation acquires one connection, runs to completion on the
/// calling thread, and releases the connection before returning. The
/// closure forms (`with_connection`, `with_transaction`) run several
/// operations against one shared connection.
pub struct Dao<P: ConnectionProvider> {
    provider: P,
    config: DaoConfig,
}

impl<P: ConnectionProvider> Dao<P> {
    /// Create a shell with default configuration (upper-case column
    /// folding, batch size 1024, generic dialect).
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: DaoConfig::default(),
        }
    }

    pub fn with_config(provider: P, config: DaoConfig) -> Self {
        Self { provider, config }
    }

    #[must_use]
    pub fn config(&self) -> &DaoConfig {
        &self.config
    }

    fn acquire(&self) -> Result<DaoConn<'_>, DaoError> {
        Ok(DaoConn {
            conn: self.provider.acquire()?,
            config: &self.config,
        })
    }

    /// Run a unit of work against one connection, without transaction
    /// semantics; the connection's default commit behavior applies.
    ///
    /// # Errors
    ///
    /// Returns the unit of work's error. Connection release failures are
    /// logged, never raised.
    pub fn with_connection<T>(
        &self,
        work: impl FnOnce(&DaoConn<'_>) -> Result<T, DaoError>,
    ) -> Result<T, DaoError> {
        let conn = self.acquire()?;
        let result = work(&conn);
        conn.release();
        result
    }

    /// Run a unit of work inside one transaction: commit on success, roll
    /// back on failure.
    ///
    /// # Errors
    ///
    /// Returns the unit of work's error after a successful rollback. If the
    /// rollback itself fails, that failure supersedes the unit's error,
    /// which stays attached as the cause.
    pub fn with_transaction<T>(
        &self,
        work: impl FnOnce(&DaoConn<'_>) -> Result<T, DaoError>,
    ) -> Result<T, DaoError> {
        let conn = self.acquire()?;
        let result = conn.begin().and_then(|()| match work(&conn) {
            Ok(value) => conn.commit().map(|()| value),
            Err(cause) => Err(match conn.rollback() {
                Ok(()) => cause,
                Err(DaoError::SqliteError(source)) => DaoError::RollbackError {
                    source,
                    cause: Box::new(cause),
                },
                Err(other) => other,
            }),
        });
        conn.release();
        result
    }

    /// Query the first column of the first row, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if expansion, binding, or execution fails.
    pub fn find_scalar(
        &self,
        sql: &str,
        params: &[ParamValue],
    ) -> Result<Option<ParamValue>, DaoError> {
        self.with_connection(|conn| conn.find_scalar(sql, params))
    }

    /// Query the first column of every row.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if expansion, binding, or execution fails.
    pub fn find_scalar_list(
        &self,
        sql: &str,
        params: &[ParamValue],
    ) -> Result<Vec<ParamValue>, DaoError> {
        self.with_connection(|conn| conn.find_scalar_list(sql, params))
    }

    /// Query the first row, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if expansion, binding, or execution fails.
    pub fn find_record(
        &self,
        sql: &str,
        params: &[ParamValue],
    ) -> Result<Option<Record>, DaoError> {
        self.with_connection(|conn| conn.find_record(sql, params))
    }

    /// Query all rows.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if expansion, binding, or execution fails.
    pub fn find_records(&self, sql: &str, params: &[ParamValue]) -> Result<ResultSet, DaoError> {
        self.with_connection(|conn| conn.find_records(sql, params))
    }

    /// Query one page of rows, the SELECT rewritten by the dialect.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if the order column is not a plain identifier
    /// or if expansion, binding, or execution fails.
    pub fn find_records_page(
        &self,
        order_col: &str,
        direction: SortDirection,
        start: u64,
        limit: u64,
        sql: &str,
        params: &[ParamValue],
    ) -> Result<ResultSet, DaoError> {
        self.with_connection(|conn| {
            conn.find_records_page(order_col, direction, start, limit, sql, params)
        })
    }

    /// Run one DML statement, returning rows affected.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if expansion, binding, or execution fails.
    pub fn update(&self, sql: &str, params: &[ParamValue]) -> Result<usize, DaoError> {
        self.with_connection(|conn| conn.update(sql, params))
    }

    /// Run raw SQL (possibly several statements) without parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError::ExecutionError`] if the driver rejects the SQL.
    pub fn execute_raw(&self, sql: &str) -> Result<(), DaoError> {
        self.with_connection(|conn| conn.execute_raw(sql))
    }

    /// Insert one record through the dialect strategy.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if the table name is not a plain identifier or
    /// execution fails.
    pub fn insert(&self, table: &str, fields: &[(String, ParamValue)]) -> Result<bool, DaoError> {
        self.with_connection(|conn| conn.insert(table, fields))
    }

    /// Insert several records inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if any insert fails; the transaction is rolled
    /// back as a whole.
    pub fn insert_many(
        &self,
        table: &str,
        records: &[Vec<(String, ParamValue)>],
    ) -> Result<(), DaoError> {
        self.with_transaction(|conn| conn.insert_many(table, records))
    }

    /// Update rows matching the equality conditions, returning rows
    /// affected.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if the table name is not a plain identifier or
    /// execution fails.
    pub fn update_table(
        &self,
        table: &str,
        fields: &[(String, ParamValue)],
        conditions: &[(String, ParamValue)],
    ) -> Result<usize, DaoError> {
        self.with_connection(|conn| conn.update_table(table, fields, conditions))
    }

    /// Count rows in a table.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if the table name is not a plain identifier or
    /// execution fails.
    pub fn count(&self, table: &str) -> Result<i64, DaoError> {
        self.with_connection(|conn| conn.count(table))
    }

    /// Run one parameterized template over many value tuples inside one
    /// transaction, flushing per the configured batch size.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if any tuple fails; the transaction is rolled
    /// back as a whole and no partial result is reported.
    pub fn batch_update(
        &self,
        sql: &str,
        rows: &[Vec<ParamValue>],
    ) -> Result<BatchReport, DaoError> {
        self.with_transaction(|conn| conn.batch_update(sql, rows))
    }

    /// Run a list of literal SQL statements inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if any statement fails; the transaction is
    /// rolled back as a whole.
    pub fn batch_statements(&self, statements: &[String]) -> Result<(), DaoError> {
        self.with_transaction(|conn| conn.batch_statements(statements))
    }
}

/// One acquired connection plus the shell configuration.
///
/// All statement and cursor handles live in the scopes of the methods that
/// create them, so they release in order (cursor, then statement) on every
/// exit path; the connection releases when the unit of work ends.
pub struct DaoConn<'a> {
    conn: rusqlite::Connection,
    config: &'a DaoConfig,
}

impl DaoConn<'_> {
    /// Access the underlying driver connection.
    #[must_use]
    pub fn raw(&self) -> &rusqlite::Connection {
        &self.conn
    }

    fn mat_options(&self, case: CasePolicy) -> MaterializeOptions<'_> {
        MaterializeOptions {
            case,
            row_number_column: self.config.dialect.row_number_column(),
            spool_dir: self.config.spool_dir.as_deref(),
        }
    }

    /// Query all rows with an explicit case policy.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if expansion, binding, or execution fails.
    pub fn find_records_as(
        &self,
        case: CasePolicy,
        sql: &str,
        params: &[ParamValue],
    ) -> Result<ResultSet, DaoError> {
        let (sql, flat) = expand(sql, params)?;
        tracing::debug!("query [{}]", sql);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| DaoError::execution(&sql, e))?;
        results::materialize(&mut stmt, &flat, &self.mat_options(case))
    }

    /// Query all rows under the configured case policy.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if expansion, binding, or execution fails.
    pub fn find_records(&self, sql: &str, params: &[ParamValue]) -> Result<ResultSet, DaoError> {
        self.find_records_as(self.config.case_policy, sql, params)
    }

    /// Query the first row with an explicit case policy; the cursor is not
    /// read past the first row.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if expansion, binding, or execution fails.
    pub fn find_record_as(
        &self,
        case: CasePolicy,
        sql: &str,
        params: &[ParamValue],
    ) -> Result<Option<Record>, DaoError> {
        let (sql, flat) = expand(sql, params)?;
        tracing::debug!("query [{}]", sql);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| DaoError::execution(&sql, e))?;
        results::materialize_first(&mut stmt, &flat, &self.mat_options(case))
    }

    /// Query the first row under the configured case policy.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if expansion, binding, or execution fails.
    pub fn find_record(
        &self,
        sql: &str,
        params: &[ParamValue],
    ) -> Result<Option<Record>, DaoError> {
        self.find_record_as(self.config.case_policy, sql, params)
    }

    /// Query the first column of the first row, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if expansion, binding, or execution fails.
    pub fn find_scalar(
        &self,
        sql: &str,
        params: &[ParamValue],
    ) -> Result<Option<ParamValue>, DaoError> {
        Ok(self
            .find_record(sql, params)?
            .and_then(|record| record.values.into_iter().next()))
    }

    /// Query the first column of every row.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if expansion, binding, or execution fails.
    pub fn find_scalar_list(
        &self,
        sql: &str,
        params: &[ParamValue],
    ) -> Result<Vec<ParamValue>, DaoError> {
        let result_set = self.find_records(sql, params)?;
        Ok(result_set
            .results
            .into_iter()
            .filter_map(|record| record.values.into_iter().next())
            .collect())
    }

    /// Query one page of rows, the SELECT rewritten by the dialect.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if the order column is not a plain identifier
    /// or if expansion, binding, or execution fails.
    pub fn find_records_page(
        &self,
        order_col: &str,
        direction: SortDirection,
        start: u64,
        limit: u64,
        sql: &str,
        params: &[ParamValue],
    ) -> Result<ResultSet, DaoError> {
        ensure_identifier(order_col)?;
        let paged = self
            .config
            .dialect
            .page_sql(order_col, direction, start, limit, sql);
        self.find_records(&paged, params)
    }

    /// Run one DML statement, returning rows affected.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if expansion, binding, or execution fails.
    pub fn update(&self, sql: &str, params: &[ParamValue]) -> Result<usize, DaoError> {
        let (sql, flat) = expand(sql, params)?;
        tracing::debug!("update [{}]", sql);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| DaoError::execution(&sql, e))?;
        bind::bind_values(&mut stmt, &flat)?;
        stmt.raw_execute().map_err(|e| DaoError::execution(&sql, e))
    }

    /// Run raw SQL (possibly several statements) without parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError::ExecutionError`] if the driver rejects the SQL.
    pub fn execute_raw(&self, sql: &str) -> Result<(), DaoError> {
        tracing::debug!("execute [{}]", sql);
        self.conn
            .execute_batch(sql)
            .map_err(|e| DaoError::execution(sql, e))
    }

    /// Insert one record through the dialect strategy; `true` when a row
    /// was inserted.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if the table name is not a plain identifier or
    /// execution fails.
    pub fn insert(&self, table: &str, fields: &[(String, ParamValue)]) -> Result<bool, DaoError> {
        ensure_identifier(table)?;
        let mut values = Vec::new();
        let sql = self.config.dialect.insert_sql(table, fields, &mut values);
        tracing::debug!("insert [{}]", sql);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| DaoError::execution(&sql, e))?;
        bind::bind_values(&mut stmt, &values)?;
        let affected = stmt.raw_execute().map_err(|e| DaoError::execution(&sql, e))?;
        Ok(affected > 0)
    }

    /// Insert several records; transaction semantics are the caller's.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] on the first failing insert.
    pub fn insert_many(
        &self,
        table: &str,
        records: &[Vec<(String, ParamValue)>],
    ) -> Result<(), DaoError> {
        for fields in records {
            self.insert(table, fields)?;
        }
        Ok(())
    }

    /// Update rows matching the equality conditions, returning rows
    /// affected.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if the table name is not a plain identifier or
    /// execution fails.
    pub fn update_table(
        &self,
        table: &str,
        fields: &[(String, ParamValue)],
        conditions: &[(String, ParamValue)],
    ) -> Result<usize, DaoError> {
        ensure_identifier(table)?;
        let dialect = &self.config.dialect;
        let mut values = Vec::new();
        let head = dialect.update_set_sql(table, fields, &mut values);
        let cond = dialect.where_eq_and(conditions, &mut values);
        let sql = format!("{head} where {cond}");
        tracing::debug!("update table [{}]", sql);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| DaoError::execution(&sql, e))?;
        bind::bind_values(&mut stmt, &values)?;
        stmt.raw_execute().map_err(|e| DaoError::execution(&sql, e))
    }

    /// Count rows in a table.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] if the table name is not a plain identifier or
    /// execution fails.
    pub fn count(&self, table: &str) -> Result<i64, DaoError> {
        ensure_identifier(table)?;
        let sql = format!("select count(1) from {table}");
        match self.find_scalar(&sql, &[])? {
            Some(ParamValue::Int(n)) => Ok(n),
            _ => Ok(0),
        }
    }

    /// Run one parameterized template over many value tuples, flushing per
    /// the configured batch size. Transaction semantics are the caller's;
    /// [`Dao::batch_update`] wraps this in a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError`] on the first failing tuple, including a
    /// template error when a tuple's length does not match the statement's
    /// placeholder count.
    pub fn batch_update(
        &self,
        sql: &str,
        rows: &[Vec<ParamValue>],
    ) -> Result<BatchReport, DaoError> {
        tracing::debug!("execute batch [{}]", sql);
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| DaoError::execution(sql, e))?;
        let expected = stmt.parameter_count();

        let spans = flush_spans(rows.len(), self.config.batch_size);
        let flushes = spans.len();
        let mut rows_affected = 0;
        for span in spans {
            let chunk = &rows[span.start..span.end];
            for row in chunk {
                if row.len() != expected {
                    return Err(DaoError::TemplateError(format!(
                        "batch tuple has {} values but the statement has {expected} placeholders",
                        row.len()
                    )));
                }
                bind::bind_values(&mut stmt, row)?;
                rows_affected += stmt.raw_execute().map_err(|e| DaoError::execution(sql, e))?;
            }
            tracing::debug!("batch flush [{} rows]", chunk.len());
        }

        Ok(BatchReport {
            rows: rows.len(),
            flushes,
            rows_affected,
        })
    }

    /// Run a list of literal SQL statements, flushing per the configured
    /// batch size. Transaction semantics are the caller's.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError::ExecutionError`] on the first failing statement.
    pub fn batch_statements(&self, statements: &[String]) -> Result<(), DaoError> {
        for span in flush_spans(statements.len(), self.config.batch_size) {
            let chunk = &statements[span.start..span.end];
            for sql in chunk {
                self.execute_raw(sql)?;
            }
            tracing::debug!("batch flush [{} statements]", chunk.len());
        }
        Ok(())
    }

    /// Begin a transaction on this connection.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError::SqliteError`] if the driver refuses.
    pub fn begin(&self) -> Result<(), DaoError> {
        self.conn
            .execute_batch("BEGIN")
            .map_err(DaoError::SqliteError)
    }

    /// Commit the open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError::CommitError`] if the commit fails.
    pub fn commit(&self) -> Result<(), DaoError> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(DaoError::CommitError)
    }

    /// Roll back the open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DaoError::SqliteError`] if the rollback fails.
    pub fn rollback(&self) -> Result<(), DaoError> {
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(DaoError::SqliteError)
    }

    /// Release the connection. Failures are logged, never raised, so they
    /// cannot mask the unit of work's result.
    pub(crate) fn release(self) {
        if let Err((_conn, e)) = self.conn.close() {
            tracing::warn!("connection release failed: {}", e);
        }
    }
}

/// Split `total` queued entries into flush spans: a flush happens whenever
/// the queued count exceeds `batch_size`, plus one final flush (possibly
/// empty) at the end.
fn flush_spans(total: usize, batch_size: usize) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut queued = 0;
    for i in 0..total {
        queued += 1;
        if queued > batch_size {
            spans.push(start..i + 1);
            start = i + 1;
            queued = 0;
        }
    }
    spans.push(start..total);
    spans
}

fn ensure_identifier(name: &str) -> Result<(), DaoError> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if ok {
        Ok(())
    } else {
        Err(DaoError::TemplateError(format!(
            "`{name}` is not a plain identifier"
        )))
    }
}
