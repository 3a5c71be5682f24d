use serde_json::Value as JsonValue;

use super::row::Record;
use crate::types::ParamValue;

/// A result set from a database query
///
/// This struct represents the result of a database query, containing the
/// rows returned by the query and metadata. Row order matches cursor
/// delivery order; a result set is built once and owned by the caller.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<Record>,
    /// The number of rows affected (for DML statements)
    pub rows_affected: usize,
    /// Column names shared by all rows (to avoid duplicating in each row)
    column_names: Option<std::sync::Arc<Vec<String>>>,
    /// Column lookup cache shared by all rows
    column_index_cache: Option<std::sync::Arc<std::collections::HashMap<String, usize>>>,
}

impl ResultSet {
    /// Create a new result set with a known capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - The initial capacity for the result rows
    ///
    /// # Returns
    ///
    /// A new `ResultSet` instance with preallocated capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            rows_affected: 0,
            column_names: None,
            column_index_cache: None,
        }
    }

    /// Set the column names for this result set (to be shared by all rows).
    /// The name-to-index cache is built once here and reused for every row.
    pub fn set_column_names(&mut self, column_names: std::sync::Arc<Vec<String>>) {
        self.column_index_cache = Some(std::sync::Arc::new(
            column_names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect::<std::collections::HashMap<_, _>>(),
        ));
        self.column_names = Some(column_names);
    }

    /// Get the column names for this result set
    #[must_use]
    pub fn get_column_names(&self) -> Option<&std::sync::Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row to the result set
    ///
    /// # Arguments
    ///
    /// * `row_values` - The values for this row
    pub fn add_row_values(&mut self, row_values: Vec<ParamValue>) {
        if let (Some(column_names), Some(cache)) = (&self.column_names, &self.column_index_cache) {
            let row = Record {
                column_names: column_names.clone(),
                values: row_values,
                column_index_cache: cache.clone(),
            };

            self.results.push(row);
            self.rows_affected += 1;
        }
    }

    /// Add a row to the result set
    ///
    /// # Arguments
    ///
    /// * `row` - The row to add
    pub fn add_row(&mut self, row: Record) {
        // If column names haven't been set yet, use the ones from this row
        if self.column_names.is_none() {
            self.set_column_names(row.column_names.clone());
        }

        self.results.push(row);
        self.rows_affected += 1;
    }

    /// Export the result set as a JSON array of objects.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.results.iter().map(Record::to_json).collect())
    }
}

impl PartialEq for ResultSet {
    fn eq(&self, other: &Self) -> bool {
        self.results == other.results && self.rows_affected == other.rows_affected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn rows_share_one_lookup_cache() {
        let mut rs = ResultSet::with_capacity(2);
        rs.set_column_names(Arc::new(vec!["A".to_string()]));
        rs.add_row_values(vec![ParamValue::Int(1)]);
        rs.add_row_values(vec![ParamValue::Int(2)]);
        assert_eq!(rs.rows_affected, 2);
        assert!(Arc::ptr_eq(
            &rs.results[0].column_index_cache,
            &rs.results[1].column_index_cache
        ));
        assert_eq!(rs.results[1].get("A"), Some(&ParamValue::Int(2)));
    }

    #[test]
    fn json_export_is_an_array_of_objects() {
        let mut rs = ResultSet::with_capacity(1);
        rs.set_column_names(Arc::new(vec!["N".to_string()]));
        rs.add_row_values(vec![ParamValue::Text("x".to_string())]);
        assert_eq!(rs.to_json().to_string(), r#"[{"N":"x"}]"#);
    }
}
