//! Streaming group-by with a pivot reshape.
//!
//! A [`GroupBy`] is configured with grouping keys and `(column, Aggregate)` pairs, then fed any
//! number of tables with [`GroupBy::ingest`]. Reading the result with [`GroupBy::table`] builds
//! the output once and caches it until more data arrives.
//!
//! ```rust
//! use tablekit::processing::{Aggregate, GroupBy};
//! use tablekit::table::Table;
//! use tablekit::types::{DataType, Value};
//!
//! # fn main() -> Result<(), tablekit::TableError> {
//! let mut sales = Table::new();
//! sales.add_column("region", DataType::Str, false, vec!["north".into(), "south".into(), "north".into()])?;
//! sales.add_column("amount", DataType::Int, false, vec![10.into(), 5.into(), 7.into()])?;
//!
//! let mut groups = GroupBy::new(&["region"], &[("amount", Aggregate::Sum), ("amount", Aggregate::Count)])?;
//! groups.ingest(&sales)?;
//!
//! let out = groups.table()?;
//! assert_eq!(out.headers(), vec!["region", "Sum(amount)", "Count(amount)"]);
//! assert_eq!(out.row(0), Some(vec![Value::from("north"), Value::Int(17), Value::Int(2)]));
//! # Ok(())
//! # }
//! ```

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use super::aggregate::{Aggregate, Aggregator};
use crate::column::Column;
use crate::error::{TableError, TableResult};
use crate::table::Table;
use crate::types::{DataType, Value};

/// Datatypes of the referenced columns, fixed by the first ingested table.
#[derive(Debug, Clone, PartialEq)]
struct GroupSchema {
    keys: Vec<(DataType, bool)>,
    sources: Vec<DataType>,
}

#[derive(Debug, Clone)]
pub struct GroupBy {
    keys: Vec<String>,
    functions: Vec<(String, Aggregate)>,
    schema: Option<GroupSchema>,
    groups: BTreeMap<Vec<Value>, Vec<Aggregator>>,
    output: Option<Table>,
}

impl GroupBy {
    /// Group by `keys` (distinct, order-significant) and compute one aggregate per
    /// `(column, function)` pair. A column may appear under several functions.
    pub fn new(keys: &[&str], functions: &[(&str, Aggregate)]) -> TableResult<Self> {
        if keys.is_empty() {
            return Err(TableError::invalid("group by needs at least one key"));
        }
        let distinct: BTreeSet<&str> = keys.iter().copied().collect();
        if distinct.len() != keys.len() {
            return Err(TableError::invalid("group by keys must be distinct"));
        }
        Ok(Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            functions: functions.iter().map(|(c, f)| (c.to_string(), *f)).collect(),
            schema: None,
            groups: BTreeMap::new(),
            output: None,
        })
    }

    pub fn keys(&self) -> Vec<&str> {
        self.keys.iter().map(String::as_str).collect()
    }

    /// Number of distinct key tuples seen so far.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Fold every row of `table` into the per-group aggregators.
    ///
    /// The first table fixes the datatypes of the key and aggregated columns; later tables must
    /// match them. On error nothing from `table` is kept.
    pub fn ingest(&mut self, table: &Table) -> TableResult<()> {
        let key_headers = self.keys();
        let source_headers: Vec<&str> = self.functions.iter().map(|(c, _)| c.as_str()).collect();
        let mut wanted = key_headers.clone();
        wanted.extend(source_headers.iter().filter(|h| !key_headers.contains(*h)));
        table.resolve_columns(&wanted)?;

        let key_columns = table.resolve_columns(&key_headers)?;
        let source_columns = table.resolve_columns(&source_headers)?;
        let schema = GroupSchema {
            keys: key_columns.iter().map(|c| (c.datatype(), c.allow_empty())).collect(),
            sources: source_columns.iter().map(|c| c.datatype()).collect(),
        };
        match &self.schema {
            Some(expected) => check_schema(expected, &schema, &key_headers, &source_headers)?,
            None => {
                for ((column, function), dt) in self.functions.iter().zip(&schema.sources) {
                    if !function.accepts(*dt) {
                        return Err(TableError::invalid(format!(
                            "{function} is not defined for column '{column}' of type {dt}"
                        )));
                    }
                }
            }
        }

        let len = table.len();
        if len == 0 {
            self.schema.get_or_insert(schema);
            return Ok(());
        }

        // Only the groups this batch touches are copied; they replace the originals on success.
        let mut touched: BTreeMap<Vec<Value>, Vec<Aggregator>> = BTreeMap::new();
        for row in 0..len {
            let key: Vec<Value> = key_columns.iter().map(|c| c.value_at(row).clone()).collect();
            let aggregators = match touched.entry(key) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let current = match self.groups.get(entry.key()) {
                        Some(existing) => existing.clone(),
                        None => self.fresh_aggregators(&schema.sources)?,
                    };
                    entry.insert(current)
                }
            };
            for (aggregator, column) in aggregators.iter_mut().zip(&source_columns) {
                aggregator.update(column.value_at(row))?;
            }
        }

        self.groups.extend(touched);
        self.schema.get_or_insert(schema);
        self.output = None;
        debug!(rows = len, groups = self.groups.len(), "group by ingested batch");
        Ok(())
    }

    fn fresh_aggregators(&self, sources: &[DataType]) -> TableResult<Vec<Aggregator>> {
        self.functions
            .iter()
            .zip(sources)
            .map(|((_, f), dt)| Aggregator::new(*f, *dt))
            .collect()
    }

    /// The grouped output: key columns then one `Function(column)` column per aggregate, sorted
    /// by the keys with nulls last. Built on first read and cached until the next ingest.
    pub fn table(&mut self) -> TableResult<&Table> {
        if self.output.is_none() {
            let built = self.materialize()?;
            self.output = Some(built);
        }
        self.output
            .as_ref()
            .ok_or_else(|| TableError::invalid("group by output is unavailable"))
    }

    /// Row tuples of [`GroupBy::table`].
    pub fn rows(&mut self) -> TableResult<impl Iterator<Item = Vec<Value>> + '_> {
        Ok(self.table()?.rows())
    }

    fn materialize(&self) -> TableResult<Table> {
        let schema = self
            .schema
            .as_ref()
            .ok_or_else(|| TableError::invalid("group by has not ingested any data"))?;

        let mut out = Table::new();
        for (i, (header, (dt, allow_empty))) in self.keys.iter().zip(&schema.keys).enumerate() {
            let data: Vec<Value> = self.groups.keys().map(|k| k[i].clone()).collect();
            let allow_empty = *allow_empty || data.iter().any(Value::is_null);
            out.push_column(Column::with_data(header.as_str(), *dt, allow_empty, data)?);
        }
        for (i, ((column, function), dt)) in self.functions.iter().zip(&schema.sources).enumerate() {
            let data: Vec<Value> = self.groups.values().map(|aggs| aggs[i].value()).collect();
            let allow_empty = data.iter().any(Value::is_null);
            let header = format!("{}({column})", function.name());
            out.push_column(Column::with_data(header, function.output_datatype(*dt), allow_empty, data)?);
        }

        let sort_keys: Vec<(&str, bool)> = self.keys.iter().map(|k| (k.as_str(), false)).collect();
        if !out.is_empty() {
            out.sort(&sort_keys)?;
        }
        debug!(groups = out.len(), columns = out.column_count(), "group by materialized");
        Ok(out)
    }

    /// Spread the distinct value combinations of `columns` (a subset of the keys) across new
    /// aggregate columns, one row per combination of the remaining keys.
    ///
    /// Pivoted columns are named `Function(column,key=value,...)`. Cells with no matching group
    /// are null.
    pub fn pivot(&mut self, columns: &[&str]) -> TableResult<Table> {
        if columns.is_empty() {
            return Err(TableError::invalid("pivot needs at least one column"));
        }
        let not_keys: Vec<String> = columns
            .iter()
            .filter(|c| !self.keys.iter().any(|k| k == *c))
            .map(|c| c.to_string())
            .collect();
        if !not_keys.is_empty() {
            return Err(TableError::invalid(format!(
                "pivot columns must be group keys: {}",
                not_keys.join(", ")
            )));
        }

        let key_count = self.keys.len();
        let pivot_pos: Vec<usize> = columns
            .iter()
            .filter_map(|c| self.keys.iter().position(|k| k == c))
            .collect();
        let remaining_pos: Vec<usize> = (0..key_count).filter(|i| !pivot_pos.contains(i)).collect();
        let functions = self.functions.clone();
        let remaining_headers: Vec<String> = remaining_pos.iter().map(|&i| self.keys[i].clone()).collect();

        let schema = self
            .schema
            .as_ref()
            .ok_or_else(|| TableError::invalid("group by has not ingested any data"))?;
        let output_types: Vec<DataType> = functions
            .iter()
            .zip(&schema.sources)
            .map(|((_, function), dt)| function.output_datatype(*dt))
            .collect();

        let grouped = self.table()?;
        let pick = |row: &[Value], positions: &[usize]| -> Vec<Value> {
            positions.iter().map(|&i| row[i].clone()).collect()
        };

        let mut combos = BTreeSet::new();
        let mut cells: BTreeMap<Vec<Value>, HashMap<Vec<Value>, Vec<Value>>> = BTreeMap::new();
        for row in grouped.rows() {
            let combo = pick(row.as_slice(), &pivot_pos);
            combos.insert(combo.clone());
            cells
                .entry(pick(row.as_slice(), &remaining_pos))
                .or_default()
                .insert(combo, row[key_count..].to_vec());
        }

        let mut out = Table::new();
        out.metadata_mut().clone_from(grouped.metadata());
        for (slot, header) in remaining_headers.iter().enumerate() {
            let source = grouped.column(header)?;
            let data: Vec<Value> = cells.keys().map(|k| k[slot].clone()).collect();
            let allow_empty = source.allow_empty() || data.iter().any(Value::is_null);
            out.push_column(Column::with_data(header.as_str(), source.datatype(), allow_empty, data)?);
        }
        for combo in &combos {
            let labels: Vec<String> = columns
                .iter()
                .zip(combo)
                .map(|(c, v)| format!("{c}={v}"))
                .collect();
            for (i, ((column, function), datatype)) in functions.iter().zip(&output_types).enumerate() {
                let data: Vec<Value> = cells
                    .values()
                    .map(|by_combo| by_combo.get(combo).map(|v| v[i].clone()).unwrap_or(Value::Null))
                    .collect();
                let allow_empty = data.iter().any(Value::is_null);
                let header = format!("{}({column},{})", function.name(), labels.join(","));
                out.push_column(Column::with_data(header, *datatype, allow_empty, data)?);
            }
        }

        if !remaining_headers.is_empty() && !out.is_empty() {
            let sort_keys: Vec<(&str, bool)> = remaining_headers.iter().map(|h| (h.as_str(), false)).collect();
            out.sort(&sort_keys)?;
        }
        Ok(out)
    }
}

fn check_schema(expected: &GroupSchema, got: &GroupSchema, keys: &[&str], sources: &[&str]) -> TableResult<()> {
    for ((header, (want, _)), (have, _)) in keys.iter().zip(&expected.keys).zip(&got.keys) {
        if want != have {
            return Err(TableError::Incompatible {
                message: format!("key column '{header}' is {have}, earlier batches had {want}"),
            });
        }
    }
    for ((header, want), have) in sources.iter().zip(&expected.sources).zip(&got.sources) {
        if want != have {
            return Err(TableError::Incompatible {
                message: format!("column '{header}' is {have}, earlier batches had {want}"),
            });
        }
    }
    Ok(())
}
