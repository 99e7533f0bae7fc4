//! Row selection by per-column criteria.

use std::collections::BTreeSet;
use std::fmt;

use super::Table;
use crate::column::Column;
use crate::error::TableResult;
use crate::types::Value;

/// A test applied to one column's value: equality with a literal or an arbitrary predicate.
pub enum Criterion {
    Equals(Value),
    Matches(Box<dyn Fn(&Value) -> bool>),
}

impl Criterion {
    pub fn equals(value: impl Into<Value>) -> Self {
        Self::Equals(value.into())
    }

    pub fn matches(predicate: impl Fn(&Value) -> bool + 'static) -> Self {
        Self::Matches(Box::new(predicate))
    }

    pub fn test(&self, value: &Value) -> bool {
        match self {
            Self::Equals(expected) => expected == value,
            Self::Matches(predicate) => predicate(value),
        }
    }
}

impl fmt::Debug for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(v) => f.debug_tuple("Equals").field(v).finish(),
            Self::Matches(_) => f.write_str("Matches(<fn>)"),
        }
    }
}

impl Table {
    /// Rows where every criterion holds, as a new table.
    pub fn all(&self, criteria: &[(&str, Criterion)]) -> TableResult<Table> {
        let columns = self.columns_for(criteria)?;
        let mut selected: BTreeSet<usize> = (0..self.len()).collect();
        for (column, (_, criterion)) in columns.iter().zip(criteria) {
            if selected.is_empty() {
                break;
            }
            selected.retain(|&row| criterion.test(column.value_at(row)));
        }
        Ok(self.take_rows(&selected.into_iter().collect::<Vec<_>>()))
    }

    /// Rows where at least one criterion holds, as a new table.
    pub fn any(&self, criteria: &[(&str, Criterion)]) -> TableResult<Table> {
        let columns = self.columns_for(criteria)?;
        let selected: Vec<usize> = (0..self.len())
            .filter(|&row| {
                columns
                    .iter()
                    .zip(criteria)
                    .any(|(column, (_, criterion))| criterion.test(column.value_at(row)))
            })
            .collect();
        Ok(self.take_rows(&selected))
    }

    fn columns_for(&self, criteria: &[(&str, Criterion)]) -> TableResult<Vec<&Column>> {
        let headers: Vec<&str> = criteria.iter().map(|(h, _)| *h).collect();
        self.resolve_columns(&headers)
    }
}

#[cfg(test)]
mod tests {
    use super::Criterion;
    use crate::table::Table;
    use crate::types::{DataType, Value};

    fn table() -> Table {
        let mut t = Table::new();
        t.add_column("city", DataType::Str, false, ["oslo", "rome", "oslo", "nice"].map(Value::from).to_vec())
            .unwrap();
        t.add_column("temp", DataType::Int, true, vec![Value::Int(-3), Value::Int(14), Value::Null, Value::Int(16)])
            .unwrap();
        t
    }

    #[test]
    fn all_requires_every_criterion() {
        let t = table();
        let out = t
            .all(&[
                ("city", Criterion::equals("oslo")),
                ("temp", Criterion::matches(|v| v.as_i64().is_some_and(|n| n < 0))),
            ])
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.row(0).unwrap(), vec![Value::from("oslo"), Value::Int(-3)]);
        assert_eq!(out.headers(), t.headers());
    }

    #[test]
    fn all_with_no_match_is_empty() {
        let out = table().all(&[("city", Criterion::equals("paris")), ("temp", Criterion::equals(14))]).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.column_count(), 2);
    }

    #[test]
    fn any_accepts_one_matching_criterion() {
        let out = table()
            .any(&[("city", Criterion::equals("nice")), ("temp", Criterion::equals(Value::Null))])
            .unwrap();
        assert_eq!(out.column("city").unwrap().values(), &["oslo", "nice"].map(Value::from));
    }

    #[test]
    fn unknown_criterion_column_fails() {
        assert!(table().all(&[("country", Criterion::equals("no"))]).is_err());
    }
}
