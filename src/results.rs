//! Generic records and result sets materialized from driver result tables.

mod materialize;
mod result_set;
mod row;

pub use materialize::{MaterializeOptions, materialize, materialize_first};
pub use result_set::ResultSet;
pub use row::Record;
