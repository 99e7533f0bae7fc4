//! Column mapping for [`crate::table::Table`].

use crate::error::TableResult;
use crate::table::Table;
use crate::types::Value;

/// Replace the contents of column `header` with `mapper` applied to every element.
///
/// The mapped values go through the column's validated replace path, so a mapper that
/// produces the wrong datatype (or a null in a non-nullable column) fails and leaves the
/// column unchanged.
pub fn map_column<F>(table: &mut Table, header: &str, mut mapper: F) -> TableResult<()>
where
    F: FnMut(&Value) -> Value,
{
    let column = table.column_mut(header)?;
    let mapped: Vec<Value> = column.iter().map(&mut mapper).collect();
    column.replace(mapped)
}
