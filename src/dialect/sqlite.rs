use super::Dialect;
use crate::types::SortDirection;

/// SQLite dialect: LIMIT/OFFSET paging, no synthetic columns.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn page_sql(
        &self,
        order_col: &str,
        direction: SortDirection,
        start: u64,
        limit: u64,
        sql: &str,
    ) -> String {
        format!(
            "select * from ({sql}) page_q order by {order_col} {dir} limit {limit} offset {start}",
            dir = direction.as_sql(),
        )
    }
}
