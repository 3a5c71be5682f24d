//! Statement binding: coerce flattened parameter values onto a prepared
//! statement's slots.

use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::DaoError;
use crate::types::{ParamValue, TIMESTAMP_FORMAT};

/// Convert a single atomic `ParamValue` to a driver value.
///
/// Structured values that survived flattening (`Seq`/`Named`) bind as their
/// canonical JSON text. `BinaryFile` is read from disk here; SQLite has no
/// streamed parameter binding. Nulls bind untyped: SQLite never reports
/// parameter types, so typed-null resolution degrades to the generic null.
///
/// # Errors
///
/// Returns [`DaoError::SpoolError`] if a `BinaryFile` value cannot be read.
pub fn to_sqlite_value(value: &ParamValue) -> Result<Value, DaoError> {
    Ok(match value {
        ParamValue::Int(i) => Value::Integer(*i),
        ParamValue::Float(f) => Value::Real(*f),
        ParamValue::Text(s) => Value::Text(s.clone()),
        ParamValue::Bool(b) => Value::Integer(i64::from(*b)),
        ParamValue::Timestamp(dt) => Value::Text(dt.format(TIMESTAMP_FORMAT).to_string()),
        ParamValue::Null => Value::Null,
        ParamValue::Json(jval) => Value::Text(jval.to_string()),
        ParamValue::Blob(bytes) => Value::Blob(bytes.clone()),
        ParamValue::BinaryFile(path) => Value::Blob(std::fs::read(path)?),
        ParamValue::Seq(_) | ParamValue::Named(_) => Value::Text(value.to_json().to_string()),
    })
}

/// Bind a flattened value list to 1-based statement slots, in order.
///
/// # Errors
///
/// Returns [`DaoError::BindingError`] carrying the failing slot index if the
/// driver rejects a bind, or [`DaoError::SpoolError`] if a file-backed value
/// cannot be read.
pub fn bind_values(stmt: &mut Statement<'_>, values: &[ParamValue]) -> Result<(), DaoError> {
    for (i, value) in values.iter().enumerate() {
        let slot = i + 1;
        let converted = to_sqlite_value(value)?;
        tracing::debug!("bind slot [{}][{}][{:?}]", slot, type_label(&converted), value);
        stmt.raw_bind_parameter(slot, converted)
            .map_err(|source| DaoError::BindingError {
                index: slot,
                source,
            })?;
    }
    Ok(())
}

fn type_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Integer(_) => "integer",
        Value::Real(_) => "real",
        Value::Text(_) => "text",
        Value::Blob(_) => "blob",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn scalars_convert_to_driver_values() {
        assert_eq!(
            to_sqlite_value(&ParamValue::Int(5)).unwrap(),
            Value::Integer(5)
        );
        assert_eq!(
            to_sqlite_value(&ParamValue::Bool(true)).unwrap(),
            Value::Integer(1)
        );
        assert_eq!(to_sqlite_value(&ParamValue::Null).unwrap(), Value::Null);
    }

    #[test]
    fn timestamps_render_in_driver_text_form() {
        let dt = NaiveDateTime::parse_from_str("2024-01-01 08:00:01", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(
            to_sqlite_value(&ParamValue::Timestamp(dt)).unwrap(),
            Value::Text("2024-01-01 08:00:01".to_string())
        );
    }

    #[test]
    fn structured_values_bind_as_json_text() {
        let seq = ParamValue::Seq(vec![ParamValue::Int(1), ParamValue::Int(2)]);
        assert_eq!(
            to_sqlite_value(&seq).unwrap(),
            Value::Text("[1,2]".to_string())
        );
        let named = ParamValue::Named(vec![("a".to_string(), ParamValue::Bool(false))]);
        assert_eq!(
            to_sqlite_value(&named).unwrap(),
            Value::Text(r#"{"a":false}"#.to_string())
        );
    }
}
