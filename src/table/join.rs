//! Composite-key indexes and left/inner/outer joins.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use super::Table;
use crate::column::Column;
use crate::error::{TableError, TableResult};
use crate::types::Value;

/// Maps a composite key (values of the indexed columns, in argument order) to the set of row
/// indices holding that key.
pub type Index = HashMap<Vec<Value>, BTreeSet<usize>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Every left row at least once; right-owned columns are null when no right row matches.
    Left,
    /// Only key tuples present on both sides, one output row per matching pair.
    Inner,
    /// The left join plus right rows whose key never appears on the left.
    Outer,
}

/// Which input a join output column is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Table {
    /// Build an index over the columns named in `headers`.
    pub fn index(&self, headers: &[&str]) -> TableResult<Index> {
        let columns = self.resolve_columns(headers)?;
        let mut index = Index::new();
        for row in 0..self.len() {
            let key: Vec<Value> = columns.iter().map(|c| c.value_at(row).clone()).collect();
            index.entry(key).or_default().insert(row);
        }
        Ok(index)
    }

    pub fn left_join(&self, other: &Table, keys: &[&str], columns: &[&str]) -> TableResult<Table> {
        self.join(other, keys, columns, JoinKind::Left)
    }

    pub fn inner_join(&self, other: &Table, keys: &[&str], columns: &[&str]) -> TableResult<Table> {
        self.join(other, keys, columns, JoinKind::Inner)
    }

    pub fn outer_join(&self, other: &Table, keys: &[&str], columns: &[&str]) -> TableResult<Table> {
        self.join(other, keys, columns, JoinKind::Outer)
    }

    /// Join `self` (left) with `other` (right) on the `keys` columns, keeping `columns` in the
    /// given order.
    ///
    /// Output columns are read from the left table when it has them, otherwise from the right.
    /// For right-only rows of an outer join, key columns are filled from the right row so the
    /// output keys are the union of both sides. The result carries the left table's metadata.
    pub fn join(&self, other: &Table, keys: &[&str], columns: &[&str], kind: JoinKind) -> TableResult<Table> {
        if keys.is_empty() {
            return Err(TableError::invalid("join needs at least one key column"));
        }
        self.check_join_keys(other, keys)?;

        let missing: Vec<String> = columns
            .iter()
            .filter(|c| !self.has_column(c) && !other.has_column(c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(TableError::UnknownColumn { names: missing });
        }

        let right_index = other.index(keys)?;
        let left_keys = self.resolve_columns(keys)?;
        let mut pairs: Vec<(Option<usize>, Option<usize>)> = Vec::new();
        let mut seen_on_left = BTreeSet::new();

        for row in 0..self.len() {
            let key: Vec<Value> = left_keys.iter().map(|c| c.value_at(row).clone()).collect();
            match right_index.get(&key) {
                Some(matches) => pairs.extend(matches.iter().map(|&r| (Some(row), Some(r)))),
                None if kind != JoinKind::Inner => pairs.push((Some(row), None)),
                None => {}
            }
            if kind == JoinKind::Outer {
                seen_on_left.insert(key);
            }
        }

        if kind == JoinKind::Outer {
            let right_keys = other.resolve_columns(keys)?;
            for row in 0..other.len() {
                let key: Vec<Value> = right_keys.iter().map(|c| c.value_at(row).clone()).collect();
                if !seen_on_left.contains(&key) {
                    pairs.push((None, Some(row)));
                }
            }
        }

        let mut out = Table {
            columns: Vec::with_capacity(columns.len()),
            metadata: self.metadata.clone(),
        };
        for &header in columns {
            let (side, source) = match self.column(header) {
                Ok(c) => (Side::Left, c),
                Err(_) => (Side::Right, other.column(header)?),
            };
            let fallback = if side == Side::Left && keys.contains(&header) {
                Some(other.column(header)?)
            } else {
                None
            };

            let data: Vec<Value> = pairs
                .iter()
                .map(|&(l, r)| match (side, l, r) {
                    (Side::Left, Some(l), _) => source.value_at(l).clone(),
                    (Side::Left, None, Some(r)) => fallback.map(|c| c.value_at(r).clone()).unwrap_or(Value::Null),
                    (Side::Right, _, Some(r)) => source.value_at(r).clone(),
                    _ => Value::Null,
                })
                .collect();
            let allow_empty = source.allow_empty() || data.iter().any(Value::is_null);
            out.push_column(Column::with_data(header, source.datatype(), allow_empty, data)?);
        }

        debug!(?kind, rows = out.len(), left = self.len(), right = other.len(), "join complete");
        Ok(out)
    }

    fn check_join_keys(&self, other: &Table, keys: &[&str]) -> TableResult<()> {
        let missing: Vec<String> = keys
            .iter()
            .filter(|k| !self.has_column(k) || !other.has_column(k))
            .map(|k| k.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(TableError::UnknownColumn { names: missing });
        }
        for key in keys {
            let (l, r) = (self.column(key)?, other.column(key)?);
            if l.datatype() != r.datatype() {
                return Err(TableError::Incompatible {
                    message: format!(
                        "join key '{key}' is {} on the left and {} on the right",
                        l.datatype(),
                        r.datatype()
                    ),
                });
            }
        }
        Ok(())
    }
}
