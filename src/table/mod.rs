//! Ordered collections of typed columns.
//!
//! A [`Table`] maps unique headers to [`Column`]s in insertion order and carries opaque
//! [`Metadata`]. Row tuples follow column order. Columns may briefly differ in length: the
//! table is as long as its longest column and reads past a shorter column yield
//! [`Value::Null`].
//!
//! ```rust
//! use tablekit::table::Table;
//! use tablekit::types::{DataType, Value};
//!
//! # fn main() -> Result<(), tablekit::TableError> {
//! let mut table = Table::new();
//! table.add_column("A", DataType::Int, false, vec![])?;
//! table.add_column("B", DataType::Str, false, vec![])?;
//! table.add_row(vec![Value::Int(1), Value::from("hello")])?;
//! table.add_row(vec![Value::Int(2), Value::from("world")])?;
//!
//! // Duplicate headers are suffixed.
//! let header = table.add_column("B", DataType::Int, true, vec![])?;
//! assert_eq!(header, "B_1");
//!
//! let copy = Table::from_json(&table.to_json()?)?;
//! assert_eq!(copy, table);
//! assert_eq!(table.to_string(), "<Table> 3 columns x 2 rows");
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod join;
pub mod select;
pub mod sort;

use std::fmt;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::error::{TableError, TableResult};
use crate::types::{DataType, Metadata, Value};

pub use join::{Index, JoinKind};
pub use select::Criterion;

/// A row slice: optional start/stop (negative values count from the end, out-of-range bounds
/// are clamped) and a non-zero step, which may be negative to walk backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSlice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: isize,
}

impl Default for RowSlice {
    fn default() -> Self {
        Self::all()
    }
}

impl RowSlice {
    /// Every row.
    pub fn all() -> Self {
        Self {
            start: None,
            stop: None,
            step: 1,
        }
    }

    pub fn new(start: Option<isize>, stop: Option<isize>) -> Self {
        Self { start, stop, step: 1 }
    }

    pub fn with_step(self, step: isize) -> Self {
        Self { step, ..self }
    }

    /// Resolve the slice against a sequence of `len` elements.
    pub fn indices(&self, len: usize) -> TableResult<Vec<usize>> {
        if self.step == 0 {
            return Err(TableError::invalid("slice step cannot be zero"));
        }
        let len = len as isize;
        let resolve = |i: isize| if i < 0 { i + len } else { i };

        let mut out = Vec::new();
        if self.step > 0 {
            let start = self.start.map(resolve).unwrap_or(0).clamp(0, len);
            let stop = self.stop.map(resolve).unwrap_or(len).clamp(0, len);
            let mut i = start;
            while i < stop {
                out.push(i as usize);
                match i.checked_add(self.step) {
                    Some(next) => i = next,
                    None => break,
                }
            }
        } else {
            let start = self.start.map(resolve).unwrap_or(len - 1).clamp(-1, len - 1);
            let stop = self.stop.map(resolve).unwrap_or(-1).clamp(-1, len - 1);
            let mut i = start;
            while i > stop {
                out.push(i as usize);
                match i.checked_add(self.step) {
                    Some(next) => i = next,
                    None => break,
                }
            }
        }
        Ok(out)
    }
}

impl From<Range<usize>> for RowSlice {
    fn from(r: Range<usize>) -> Self {
        Self::new(Some(r.start as isize), Some(r.end as isize))
    }
}

impl From<RangeFrom<usize>> for RowSlice {
    fn from(r: RangeFrom<usize>) -> Self {
        Self::new(Some(r.start as isize), None)
    }
}

impl From<RangeTo<usize>> for RowSlice {
    fn from(r: RangeTo<usize>) -> Self {
        Self::new(None, Some(r.end as isize))
    }
}

impl From<RangeFull> for RowSlice {
    fn from(_: RangeFull) -> Self {
        Self::all()
    }
}

/// Serialized form of a table: metadata plus one JSON string per column.
#[derive(Debug, Serialize, Deserialize)]
struct TableDocument {
    metadata: Metadata,
    columns: Vec<String>,
}

/// An ordered mapping of unique header to [`Column`], plus opaque metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    metadata: Metadata,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Length of the longest column (0 for a table without columns).
    pub fn len(&self) -> usize {
        self.columns.iter().map(Column::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Headers in column order.
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(Column::header).collect()
    }

    pub fn columns(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    pub fn has_column(&self, header: &str) -> bool {
        self.position(header).is_some()
    }

    fn position(&self, header: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.header() == header)
    }

    pub fn column(&self, header: &str) -> TableResult<&Column> {
        self.columns
            .iter()
            .find(|c| c.header() == header)
            .ok_or_else(|| TableError::unknown_column(header))
    }

    pub fn column_mut(&mut self, header: &str) -> TableResult<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.header() == header)
            .ok_or_else(|| TableError::unknown_column(header))
    }

    /// Look up several columns at once, reporting every unknown header together.
    pub(crate) fn resolve_columns(&self, headers: &[&str]) -> TableResult<Vec<&Column>> {
        let missing: Vec<String> = headers
            .iter()
            .filter(|h| !self.has_column(h))
            .map(|h| h.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(TableError::UnknownColumn { names: missing });
        }
        headers.iter().map(|h| self.column(h)).collect()
    }

    /// `header` if unused, otherwise the first free `header_1`, `header_2`, ...
    pub fn unique_header(&self, header: &str) -> String {
        let mut candidate = header.to_string();
        let mut counter = 1;
        while self.has_column(&candidate) {
            candidate = format!("{header}_{counter}");
            counter += 1;
        }
        candidate
    }

    /// Insert a column, renaming it if its header is taken. Returns the header used.
    pub fn push_column(&mut self, mut column: Column) -> String {
        let header = self.unique_header(column.header());
        column.set_header(header.clone());
        self.columns.push(column);
        header
    }

    /// Create and insert a column. Returns the (possibly suffixed) header used.
    pub fn add_column(
        &mut self,
        header: &str,
        datatype: DataType,
        allow_empty: bool,
        data: Vec<Value>,
    ) -> TableResult<String> {
        let column = Column::with_data(header, datatype, allow_empty, data)?;
        Ok(self.push_column(column))
    }

    pub fn remove_column(&mut self, header: &str) -> TableResult<Column> {
        let pos = self.position(header).ok_or_else(|| TableError::unknown_column(header))?;
        Ok(self.columns.remove(pos))
    }

    /// Append one value to every column, in column order.
    ///
    /// All values are validated before any column is touched.
    pub fn add_row(&mut self, values: Vec<Value>) -> TableResult<()> {
        if values.len() != self.columns.len() {
            return Err(TableError::SchemaMismatch {
                message: format!("expected {} values, got {}", self.columns.len(), values.len()),
            });
        }
        for (column, value) in self.columns.iter().zip(&values) {
            column.type_check(value)?;
        }
        for (column, value) in self.columns.iter_mut().zip(values) {
            column.append(value)?;
        }
        Ok(())
    }

    /// The row at `index` (negative counts from the end), or `None` when out of range.
    pub fn row(&self, index: isize) -> Option<Vec<Value>> {
        let i = self.wrap_index(index)?;
        Some(self.columns.iter().map(|c| c.value_at(i).clone()).collect())
    }

    /// A one-row table holding the row at `index` (negative counts from the end).
    pub fn row_table(&self, index: isize) -> TableResult<Table> {
        let len = self.len();
        let i = self.wrap_index(index).ok_or(TableError::IndexOutOfBounds {
            index: index.unsigned_abs(),
            len,
        })?;
        Ok(self.take_rows(&[i]))
    }

    fn wrap_index(&self, index: isize) -> Option<usize> {
        let len = self.len() as isize;
        let i = if index < 0 { index + len } else { index };
        (0..len).contains(&i).then_some(i as usize)
    }

    /// Apply the same slice to every column. Negative bounds resolve against the table length.
    pub fn slice(&self, slice: impl Into<RowSlice>) -> TableResult<Table> {
        let indices = slice.into().indices(self.len())?;
        Ok(self.take_rows(&indices))
    }

    /// A table with the same columns holding only the rows at `indices`.
    pub(crate) fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            metadata: self.metadata.clone(),
        }
    }

    /// Full-width row tuples over the whole table.
    pub fn rows(&self) -> impl Iterator<Item = Vec<Value>> + '_ {
        (0..self.len()).map(move |i| self.columns.iter().map(|c| c.value_at(i).clone()).collect())
    }

    /// Row tuples restricted to `headers` (in argument order, repeats allowed) over an optional
    /// row slice.
    pub fn filter<'a>(
        &'a self,
        headers: &[&str],
        slice: Option<RowSlice>,
    ) -> TableResult<impl Iterator<Item = Vec<Value>> + 'a> {
        let columns = self.resolve_columns(headers)?;
        let indices = slice.unwrap_or_default().indices(self.len())?;
        Ok(indices
            .into_iter()
            .map(move |i| columns.iter().map(|c| c.value_at(i).clone()).collect()))
    }

    /// Structural compatibility: equal metadata and, for every column in either table, the same
    /// header, datatype and `allow_empty`. Data is not compared.
    pub fn compare(&self, other: &Table) -> TableResult<()> {
        if self.metadata != other.metadata {
            return Err(TableError::Incompatible {
                message: "metadata differs".to_string(),
            });
        }
        for column in &self.columns {
            let theirs = other.column(column.header()).map_err(|_| TableError::Incompatible {
                message: format!("column '{}' is missing from the other table", column.header()),
            })?;
            if theirs.datatype() != column.datatype() {
                return Err(TableError::Incompatible {
                    message: format!(
                        "column '{}' datatype {} != {}",
                        column.header(),
                        column.datatype(),
                        theirs.datatype()
                    ),
                });
            }
            if theirs.allow_empty() != column.allow_empty() {
                return Err(TableError::Incompatible {
                    message: format!(
                        "column '{}' allow_empty {} != {}",
                        column.header(),
                        column.allow_empty(),
                        theirs.allow_empty()
                    ),
                });
            }
        }
        if let Some(extra) = other.columns.iter().find(|c| !self.has_column(c.header())) {
            return Err(TableError::Incompatible {
                message: format!("column '{}' is missing from this table", extra.header()),
            });
        }
        Ok(())
    }

    /// Append the rows of `other` onto this table. Both tables must pass [`Table::compare`].
    pub fn extend_from(&mut self, other: &Table) -> TableResult<()> {
        self.compare(other)?;
        for column in &mut self.columns {
            let theirs = other.column(column.header())?;
            column.extend(theirs.values().to_vec())?;
        }
        Ok(())
    }

    /// A new table holding the rows of `self` followed by the rows of `other`.
    pub fn concat(&self, other: &Table) -> TableResult<Table> {
        let mut out = self.clone();
        out.extend_from(other)?;
        Ok(out)
    }

    pub fn to_json_value(&self) -> TableResult<serde_json::Value> {
        let doc = TableDocument {
            metadata: self.metadata.clone(),
            columns: self.columns.iter().map(Column::to_json).collect::<TableResult<_>>()?,
        };
        Ok(serde_json::to_value(doc)?)
    }

    /// Serialize as `{"metadata": {...}, "columns": [<column json string>, ...]}`.
    pub fn to_json(&self) -> TableResult<String> {
        Ok(serde_json::to_string(&self.to_json_value()?)?)
    }

    pub fn from_json_value(value: serde_json::Value) -> TableResult<Table> {
        let doc: TableDocument = serde_json::from_value(value)?;
        let mut table = Table {
            columns: Vec::with_capacity(doc.columns.len()),
            metadata: doc.metadata,
        };
        for json in &doc.columns {
            table.push_column(Column::from_json(json)?);
        }
        Ok(table)
    }

    /// Inverse of [`Table::to_json`].
    pub fn from_json(json: &str) -> TableResult<Table> {
        Self::from_json_value(serde_json::from_str(json)?)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Table> {} columns x {} rows", self.columns.len(), self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::{RowSlice, Table};
    use crate::error::TableError;
    use crate::types::{DataType, Value};

    fn sample() -> Table {
        let mut t = Table::new();
        t.add_column("A", DataType::Int, false, vec![]).unwrap();
        t.add_column("B", DataType::Str, false, vec![]).unwrap();
        for (a, b) in [(1, "a"), (2, "b"), (3, "c"), (4, "d"), (5, "e")] {
            t.add_row(vec![Value::Int(a), Value::from(b)]).unwrap();
        }
        t
    }

    fn ints(t: &Table, header: &str) -> Vec<i64> {
        t.column(header).unwrap().iter().filter_map(Value::as_i64).collect()
    }

    #[test]
    fn duplicate_headers_get_suffixes() {
        let mut t = sample();
        assert_eq!(t.add_column("B", DataType::Int, true, vec![]).unwrap(), "B_1");
        assert_eq!(t.add_column("B", DataType::Int, true, vec![]).unwrap(), "B_2");
        assert_eq!(t.headers(), vec!["A", "B", "B_1", "B_2"]);

        t.remove_column("B_1").unwrap();
        assert_eq!(t.add_column("B", DataType::Int, true, vec![]).unwrap(), "B_1");
    }

    #[test]
    fn add_row_checks_width_and_types_without_partial_writes() {
        let mut t = sample();
        assert!(matches!(
            t.add_row(vec![Value::Int(1)]),
            Err(TableError::SchemaMismatch { .. })
        ));
        assert!(t.add_row(vec![Value::Int(9), Value::Int(9)]).is_err());
        assert_eq!(t.column("A").unwrap().len(), 5);
        assert_eq!(t.len(), 5);
    }

    #[test]
    fn unknown_column_lookup_fails() {
        let t = sample();
        assert!(matches!(t.column("Z"), Err(TableError::UnknownColumn { .. })));
        let err = t.filter(&["A", "Y", "Z"], None).err().unwrap();
        assert_eq!(err.to_string(), "unknown column(s): Y, Z");
    }

    #[test]
    fn len_is_longest_column_and_short_reads_are_null() {
        let mut t = sample();
        t.add_column("C", DataType::Int, true, vec![Value::Int(10)]).unwrap();
        assert_eq!(t.len(), 5);
        let rows: Vec<Vec<Value>> = t.rows().collect();
        assert_eq!(rows[0], vec![Value::Int(1), Value::from("a"), Value::Int(10)]);
        assert_eq!(rows[4], vec![Value::Int(5), Value::from("e"), Value::Null]);
    }

    #[test]
    fn slices_resolve_negative_bounds_against_table_length() {
        let t = sample();
        assert_eq!(ints(&t.slice(1..3).unwrap(), "A"), vec![2, 3]);
        assert_eq!(ints(&t.slice(RowSlice::new(None, Some(-2))).unwrap(), "A"), vec![1, 2, 3]);
        assert_eq!(ints(&t.slice(RowSlice::all().with_step(2)).unwrap(), "A"), vec![1, 3, 5]);
        assert_eq!(ints(&t.slice(RowSlice::all().with_step(-1)).unwrap(), "A"), vec![5, 4, 3, 2, 1]);
        assert_eq!(t.slice(3..).unwrap().len(), 2);
        assert!(t.slice(RowSlice::all().with_step(0)).is_err());
    }

    #[test]
    fn huge_steps_stop_after_the_first_row() {
        let t = sample();
        assert_eq!(ints(&t.slice(RowSlice::new(Some(1), None).with_step(isize::MAX)).unwrap(), "A"), vec![2]);
        assert_eq!(ints(&t.slice(RowSlice::new(Some(-1), None).with_step(isize::MIN)).unwrap(), "A"), vec![5]);
        let rows: Vec<Vec<Value>> = t
            .filter(&["B"], Some(RowSlice::all().with_step(isize::MAX)))
            .unwrap()
            .collect();
        assert_eq!(rows, vec![vec![Value::from("a")]]);
    }

    #[test]
    fn row_access_wraps_negative_indices() {
        let t = sample();
        assert_eq!(t.row(-1), Some(vec![Value::Int(5), Value::from("e")]));
        assert_eq!(t.row(5), None);
        let one = t.row_table(0).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one.headers(), vec!["A", "B"]);
        assert!(t.row_table(-6).is_err());
    }

    #[test]
    fn filter_projects_and_repeats_columns() {
        let t = sample();
        let rows: Vec<Vec<Value>> = t.filter(&["B", "A", "B"], Some(RowSlice::new(Some(3), None))).unwrap().collect();
        assert_eq!(
            rows,
            vec![
                vec![Value::from("d"), Value::Int(4), Value::from("d")],
                vec![Value::from("e"), Value::Int(5), Value::from("e")],
            ]
        );
    }

    #[test]
    fn compare_reports_first_mismatch() {
        let t = sample();
        assert!(t.compare(&t.clone()).is_ok());

        let mut other = t.clone();
        other.metadata_mut().insert("source".into(), serde_json::json!("x"));
        assert!(t.compare(&other).unwrap_err().to_string().contains("metadata"));

        let mut other = t.clone();
        other.remove_column("B").unwrap();
        other.add_column("B", DataType::Str, true, vec![]).unwrap();
        assert!(t.compare(&other).unwrap_err().to_string().contains("allow_empty"));

        let mut other = t.clone();
        other.add_column("C", DataType::Int, true, vec![]).unwrap();
        assert!(t.compare(&other).unwrap_err().to_string().contains("'C'"));
    }

    #[test]
    fn concat_appends_rows_and_extend_mutates_in_place() {
        let t = sample();
        let joined = t.concat(&t).unwrap();
        assert_eq!(joined.len(), 10);
        assert_eq!(t.len(), 5);

        let mut grown = t.clone();
        grown.extend_from(&t).unwrap();
        assert_eq!(grown, joined);

        let mut other = Table::new();
        other.add_column("A", DataType::Float, false, vec![]).unwrap();
        assert!(matches!(t.concat(&other), Err(TableError::Incompatible { .. })));
    }

    #[test]
    fn json_round_trip_keeps_metadata_and_order() {
        let mut t = sample();
        t.metadata_mut().insert("name".into(), serde_json::json!("people"));
        t.add_column("flag", DataType::Bool, true, vec![Value::Bool(false), Value::Null]).unwrap();

        let json = t.to_json().unwrap();
        let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(doc["metadata"]["name"], "people");
        assert!(doc["columns"][0].is_string());

        let back = Table::from_json(&json).unwrap();
        assert_eq!(back, t);
        assert_eq!(back.headers(), vec!["A", "B", "flag"]);
    }

    #[test]
    fn empty_table_has_zero_length() {
        let t = Table::new();
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
        assert_eq!(t.rows().count(), 0);
    }
}
