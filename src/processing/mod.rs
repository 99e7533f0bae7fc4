//! In-memory transformations over [`crate::table::Table`].
//!
//! - [`GroupBy`]: streaming per-group aggregation with a [`GroupBy::pivot`] reshape
//! - [`Aggregate`] / [`Aggregator`]: the fixed set of aggregation functions
//! - [`map_column()`]: rewrite a column element by element
//!
//! Everything here is single-threaded and fully materialized; inputs must fit in memory.

pub mod aggregate;
pub mod group_by;
pub mod map;

pub use aggregate::{Aggregate, Aggregator};
pub use group_by::GroupBy;
pub use map::map_column;
