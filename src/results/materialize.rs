//! Conversion of one driver result table into generic records.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::Statement;
use rusqlite::types::Value;

use super::result_set::ResultSet;
use super::row::Record;
use crate::bind;
use crate::error::DaoError;
use crate::types::{CasePolicy, ParamValue};

/// Per-query materialization options.
///
/// `row_number_column` names the synthetic column a dialect's paged SQL may
/// inject; a matching column (case-insensitive) is never exposed to the
/// caller. `spool_dir` is where large binary values land; `None` uses the
/// process temp directory. Spooled files are owned by the caller.
#[derive(Debug, Clone, Copy)]
pub struct MaterializeOptions<'a> {
    pub case: CasePolicy,
    pub row_number_column: Option<&'a str>,
    pub spool_dir: Option<&'a Path>,
}

enum ColumnKind {
    Native,
    LargeText,
    LargeBinary,
}

struct ColumnPlan {
    /// Source column index and value handling for each kept column.
    keep: Vec<(usize, ColumnKind)>,
    names: Arc<Vec<String>>,
}

fn column_plan(stmt: &Statement<'_>, opts: &MaterializeOptions<'_>) -> ColumnPlan {
    let columns = stmt.columns();
    let mut keep = Vec::with_capacity(columns.len());
    let mut names = Vec::with_capacity(columns.len());
    for (i, column) in columns.iter().enumerate() {
        let name = column.name();
        if opts
            .row_number_column
            .is_some_and(|rn| rn.eq_ignore_ascii_case(name))
        {
            continue;
        }
        let kind = match column.decl_type().map(str::to_ascii_uppercase) {
            Some(decl) if decl.contains("BLOB") || decl.contains("BINARY") => {
                ColumnKind::LargeBinary
            }
            Some(decl) if decl.contains("CLOB") => ColumnKind::LargeText,
            _ => ColumnKind::Native,
        };
        names.push(opts.case.fold(name));
        keep.push((i, kind));
    }
    ColumnPlan {
        keep,
        names: Arc::new(names),
    }
}

/// Extract one column of one row as a `ParamValue`.
///
/// # Errors
///
/// Returns `DaoError::SqliteError` if the value cannot be read.
fn extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<ParamValue, DaoError> {
    let value: Value = row.get(idx).map_err(DaoError::SqliteError)?;
    Ok(match value {
        Value::Null => ParamValue::Null,
        Value::Integer(i) => ParamValue::Int(i),
        Value::Real(f) => ParamValue::Float(f),
        Value::Text(s) => ParamValue::Text(s),
        Value::Blob(b) => ParamValue::Blob(b),
    })
}

fn spool_to_file(bytes: &[u8], dir: Option<&Path>) -> Result<PathBuf, DaoError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("sql-dao-lob-");
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    file.write_all(bytes)?;
    let (_, path) = file.keep().map_err(|e| DaoError::SpoolError(e.error))?;
    Ok(path)
}

fn shape_value(
    kind: &ColumnKind,
    value: ParamValue,
    spool_dir: Option<&Path>,
) -> Result<ParamValue, DaoError> {
    Ok(match kind {
        ColumnKind::Native => value,
        // Textual large objects read fully into memory as strings.
        ColumnKind::LargeText => match value {
            ParamValue::Blob(bytes) => ParamValue::Text(String::from_utf8_lossy(&bytes).into_owned()),
            other => other,
        },
        // Binary large objects spool to a uniquely named file; nulls stay null.
        ColumnKind::LargeBinary => match value {
            ParamValue::Blob(bytes) => ParamValue::BinaryFile(spool_to_file(&bytes, spool_dir)?),
            ParamValue::Text(s) => ParamValue::BinaryFile(spool_to_file(s.as_bytes(), spool_dir)?),
            other => other,
        },
    })
}

fn read_row(
    row: &rusqlite::Row<'_>,
    plan: &ColumnPlan,
    opts: &MaterializeOptions<'_>,
) -> Result<Vec<ParamValue>, DaoError> {
    let mut values = Vec::with_capacity(plan.keep.len());
    for (src_idx, kind) in &plan.keep {
        let value = extract_value(row, *src_idx)?;
        values.push(shape_value(kind, value, opts.spool_dir)?);
    }
    Ok(values)
}

/// Bind `values` and run the statement as a query, materializing every row.
///
/// # Errors
///
/// Returns [`DaoError`] if binding, execution, or value conversion fails.
pub fn materialize(
    stmt: &mut Statement<'_>,
    values: &[ParamValue],
    opts: &MaterializeOptions<'_>,
) -> Result<ResultSet, DaoError> {
    bind::bind_values(stmt, values)?;
    let plan = column_plan(stmt, opts);

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(plan.names.clone());

    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        let row_values = read_row(row, &plan, opts)?;
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

/// Bind `values` and materialize only the first row, if any.
///
/// The cursor is not advanced past the first row; remaining rows are
/// released with the statement.
///
/// # Errors
///
/// Returns [`DaoError`] if binding, execution, or value conversion fails.
pub fn materialize_first(
    stmt: &mut Statement<'_>,
    values: &[ParamValue],
    opts: &MaterializeOptions<'_>,
) -> Result<Option<Record>, DaoError> {
    bind::bind_values(stmt, values)?;
    let plan = column_plan(stmt, opts);

    let mut rows = stmt.raw_query();
    match rows.next()? {
        Some(row) => {
            let row_values = read_row(row, &plan, opts)?;
            Ok(Some(Record::new(plan.names.clone(), row_values)))
        }
        None => Ok(None),
    }
}
