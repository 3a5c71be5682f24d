use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde_json::Value as JsonValue;

/// Text form used when a timestamp is rendered for the driver or for JSON.
pub(crate) const TIMESTAMP_FORMAT: &str = "%F %T%.f";

/// A parameter or result value.
///
/// One closed union is shared between statement parameters and materialized
/// rows so helper functions never branch on driver types:
/// ```rust
/// use sql_dao::prelude::*;
///
/// let params = vec![
///     ParamValue::Int(1),
///     ParamValue::Text("alice".into()),
///     ParamValue::Seq(vec![ParamValue::Int(2), ParamValue::Int(3)]),
/// ];
/// # let _ = params;
/// ```
///
/// `Seq` and `Named` drive placeholder expansion; when one survives
/// flattening as an atomic value it is bound as its canonical JSON text.
/// `BinaryFile` carries a large binary value by file reference, both as a
/// parameter (streamed from disk at bind time) and as a materialized column
/// (spooled to disk by the result materializer).
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value, bound as its serialized text
    Json(JsonValue),
    /// Binary data held in memory
    Blob(Vec<u8>),
    /// Binary data held in a file
    BinaryFile(PathBuf),
    /// Ordered sequence; expands into a run of placeholders
    Seq(Vec<ParamValue>),
    /// Named parameter set for `:name` templates
    Named(Vec<(String, ParamValue)>),
}

impl ParamValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value binds to a single slot (not a `Seq` or `Named`).
    #[must_use]
    pub fn is_atomic(&self) -> bool {
        !matches!(self, Self::Seq(_) | Self::Named(_))
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let ParamValue::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let ParamValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let ParamValue::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let ParamValue::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // Try "YYYY-MM-DD HH:MM:SS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            // Try "YYYY-MM-DD HH:MM:SS.SSS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S.%3f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let ParamValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let ParamValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_file(&self) -> Option<&std::path::Path> {
        if let ParamValue::BinaryFile(path) = self {
            Some(path)
        } else {
            None
        }
    }

    /// Canonical JSON form, used when a structured value is bound as text
    /// and when records are exported as JSON.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            ParamValue::Int(i) => JsonValue::from(*i),
            ParamValue::Float(f) => JsonValue::from(*f),
            ParamValue::Text(s) => JsonValue::from(s.clone()),
            ParamValue::Bool(b) => JsonValue::from(*b),
            ParamValue::Timestamp(dt) => {
                JsonValue::from(dt.format(TIMESTAMP_FORMAT).to_string())
            }
            ParamValue::Null => JsonValue::Null,
            ParamValue::Json(j) => j.clone(),
            ParamValue::Blob(bytes) => {
                JsonValue::Array(bytes.iter().map(|&b| JsonValue::from(b)).collect())
            }
            ParamValue::BinaryFile(path) => JsonValue::from(path.display().to_string()),
            ParamValue::Seq(items) => {
                JsonValue::Array(items.iter().map(ParamValue::to_json).collect())
            }
            ParamValue::Named(pairs) => JsonValue::Object(
                pairs
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Casing applied to result column names that are not intentionally
/// mixed-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CasePolicy {
    /// Fold single-case column names to upper case
    #[default]
    Upper,
    /// Fold single-case column names to lower case
    Lower,
}

impl CasePolicy {
    /// Apply the policy to a column name. Names containing both upper- and
    /// lower-case letters are treated as intentionally authored and pass
    /// through unchanged.
    #[must_use]
    pub fn fold(self, name: &str) -> String {
        let has_lower = name.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = name.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper {
            return name.to_string();
        }
        match self {
            CasePolicy::Upper => name.to_uppercase(),
            CasePolicy::Lower => name.to_lowercase(),
        }
    }
}

/// Sort direction for paged queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}
