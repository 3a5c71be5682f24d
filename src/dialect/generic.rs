use super::Dialect;
use crate::types::SortDirection;

/// Column name the paged rewrite injects for row numbering. Never exposed
/// to callers; the materializer drops it.
pub(crate) const ROW_NUMBER_COLUMN: &str = "row_number_";

/// Oracle-like default dialect.
///
/// Pages with a `row_number() over (...)` window, which also runs on any
/// engine supporting window functions.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericDialect;

impl Dialect for GenericDialect {
    fn page_sql(
        &self,
        order_col: &str,
        direction: SortDirection,
        start: u64,
        limit: u64,
        sql: &str,
    ) -> String {
        let end = start.saturating_add(limit);
        format!(
            "select * from (select page_q.*, row_number() over (order by {order_col} {dir}) as {ROW_NUMBER_COLUMN} from ({sql}) page_q) \
             where {ROW_NUMBER_COLUMN} > {start} and {ROW_NUMBER_COLUMN} <= {end}",
            dir = direction.as_sql(),
        )
    }

    fn row_number_column(&self) -> Option<&'static str> {
        Some(ROW_NUMBER_COLUMN)
    }
}
