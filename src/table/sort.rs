//! Multi-key stable sort with nulls always last.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::Table;
use crate::error::{TableError, TableResult};
use crate::types::Value;

impl Table {
    /// Sort rows in place by `keys`, given as `(header, descending)` pairs in priority order.
    ///
    /// Nulls sort after every non-null value whichever direction a key uses. The sort is stable,
    /// so rows with equal keys keep their relative order.
    pub fn sort(&mut self, keys: &[(&str, bool)]) -> TableResult<()> {
        let order = self.sorted_order(keys)?;
        if order.iter().enumerate().all(|(i, &row)| i == row) {
            return Ok(());
        }
        for column in &mut self.columns {
            let permuted: Vec<Value> = order.iter().map(|&i| column.value_at(i).clone()).collect();
            column.replace(permuted)?;
        }
        debug!(rows = order.len(), keys = keys.len(), "table sorted");
        Ok(())
    }

    /// `true` when the current row order is what [`Table::sort`] with the same keys produces.
    pub fn is_sorted(&self, keys: &[(&str, bool)]) -> TableResult<bool> {
        let ranks = self.rank_rows(keys)?;
        Ok(ranks.windows(2).all(|pair| pair[0] <= pair[1]))
    }

    /// Row permutation that sorts the table by `keys`.
    fn sorted_order(&self, keys: &[(&str, bool)]) -> TableResult<Vec<usize>> {
        let ranks = self.rank_rows(keys)?;
        let mut order: Vec<usize> = (0..ranks.len()).collect();
        order.sort_by(|&a, &b| ranks[a].cmp(&ranks[b]));
        Ok(order)
    }

    /// One rank tuple per row. Each distinct non-null value gets its position in sorted order
    /// (reversed for descending keys); null ranks after all of them.
    fn rank_rows(&self, keys: &[(&str, bool)]) -> TableResult<Vec<Vec<usize>>> {
        if keys.is_empty() {
            return Err(TableError::invalid("sort needs at least one key"));
        }
        let headers: Vec<&str> = keys.iter().map(|(h, _)| *h).collect();
        let columns = self.resolve_columns(&headers)?;

        let len = self.len();
        if let Some(short) = self.columns.iter().find(|c| c.len() != len) {
            return Err(TableError::SchemaMismatch {
                message: format!(
                    "cannot sort: column '{}' has {} values, table has {len} rows",
                    short.header(),
                    short.len()
                ),
            });
        }

        let mut ranks = vec![Vec::with_capacity(keys.len()); len];
        for (column, (_, descending)) in columns.iter().zip(keys) {
            let distinct: BTreeSet<&Value> = column.iter().filter(|v| !v.is_null()).collect();
            let count = distinct.len();
            let lookup: BTreeMap<&Value, usize> = distinct
                .into_iter()
                .enumerate()
                .map(|(i, v)| (v, if *descending { count - 1 - i } else { i }))
                .collect();
            for (row, value) in column.iter().enumerate() {
                ranks[row].push(lookup.get(value).copied().unwrap_or(count));
            }
        }
        Ok(ranks)
    }
}
