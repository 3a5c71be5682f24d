//! Dialect strategy: database-specific SQL generation for table-level
//! inserts, updates, equality conditions, and paged queries.

mod generic;
mod sqlite;

pub use generic::GenericDialect;
pub use sqlite::SqliteDialect;

use crate::types::{ParamValue, SortDirection};

/// Strategy converting semantic operations into concrete SQL strings.
///
/// Exactly one dialect is active per [`DaoConfig`](crate::config::DaoConfig);
/// the methods that build parameterized fragments append their bound values
/// to `out` in placeholder order.
pub trait Dialect: Send + Sync + std::fmt::Debug {
    /// Build an INSERT statement for one record.
    fn insert_sql(
        &self,
        table: &str,
        fields: &[(String, ParamValue)],
        out: &mut Vec<ParamValue>,
    ) -> String {
        let columns = fields
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let holders = vec!["?"; fields.len()].join(", ");
        out.extend(fields.iter().map(|(_, value)| value.clone()));
        format!("insert into {table} ({columns}) values ({holders})")
    }

    /// Build the `update <table> set ...` head for one record.
    fn update_set_sql(
        &self,
        table: &str,
        fields: &[(String, ParamValue)],
        out: &mut Vec<ParamValue>,
    ) -> String {
        let assignments = fields
            .iter()
            .map(|(name, _)| format!("{name} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        out.extend(fields.iter().map(|(_, value)| value.clone()));
        format!("update {table} set {assignments}")
    }

    /// Build an AND-joined equality condition fragment.
    fn where_eq_and(
        &self,
        conditions: &[(String, ParamValue)],
        out: &mut Vec<ParamValue>,
    ) -> String {
        if conditions.is_empty() {
            return "1 = 1".to_string();
        }
        let fragment = conditions
            .iter()
            .map(|(name, _)| format!("{name} = ?"))
            .collect::<Vec<_>>()
            .join(" and ");
        out.extend(conditions.iter().map(|(_, value)| value.clone()));
        fragment
    }

    /// Rewrite an arbitrary SELECT into its paged form. `start` is a row
    /// offset, `limit` the page size. Offsets render as integer literals so
    /// paging composes with both positional and named templates.
    fn page_sql(
        &self,
        order_col: &str,
        direction: SortDirection,
        start: u64,
        limit: u64,
        sql: &str,
    ) -> String;

    /// Name of the synthetic row-number column `page_sql` injects, if any.
    /// The result materializer drops a column with this name.
    fn row_number_column(&self) -> Option<&'static str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_insert_and_update_fragments() {
        let dialect = SqliteDialect;
        let fields = vec![
            ("id".to_string(), ParamValue::Int(1)),
            ("name".to_string(), ParamValue::Text("a".to_string())),
        ];

        let mut out = Vec::new();
        let sql = dialect.insert_sql("users", &fields, &mut out);
        assert_eq!(sql, "insert into users (id, name) values (?, ?)");
        assert_eq!(out.len(), 2);

        let mut out = Vec::new();
        let sql = dialect.update_set_sql("users", &fields, &mut out);
        assert_eq!(sql, "update users set id = ?, name = ?");
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn empty_condition_set_is_always_true() {
        let mut out = Vec::new();
        assert_eq!(SqliteDialect.where_eq_and(&[], &mut out), "1 = 1");
        assert!(out.is_empty());
    }
}
