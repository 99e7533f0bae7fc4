//! Streaming aggregation functions.
//!
//! An [`Aggregator`] is created for one [`Aggregate`] kind and one input [`DataType`], then fed
//! values one at a time with [`Aggregator::update`]. Nulls are ignored by every kind.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::{TableError, TableResult};
use crate::types::{DataType, Value};

/// The fixed set of aggregation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Max,
    Min,
    Sum,
    /// First non-null value in ingestion order.
    First,
    /// Most recent non-null value.
    Last,
    /// Number of non-null values.
    Count,
    /// Number of distinct non-null values.
    CountUnique,
    Average,
    /// Sample standard deviation (`n - 1` denominator); `0.0` below two observations.
    StandardDeviation,
    /// Smallest value whose cumulative frequency exceeds half of all observations.
    Median,
    /// Most frequent value, ties going to the larger value.
    Mode,
}

impl Aggregate {
    pub const ALL: [Aggregate; 11] = [
        Aggregate::Max,
        Aggregate::Min,
        Aggregate::Sum,
        Aggregate::First,
        Aggregate::Last,
        Aggregate::Count,
        Aggregate::CountUnique,
        Aggregate::Average,
        Aggregate::StandardDeviation,
        Aggregate::Median,
        Aggregate::Mode,
    ];

    /// Name used in output column headers.
    pub fn name(&self) -> &'static str {
        match self {
            Aggregate::Max => "Max",
            Aggregate::Min => "Min",
            Aggregate::Sum => "Sum",
            Aggregate::First => "First",
            Aggregate::Last => "Last",
            Aggregate::Count => "Count",
            Aggregate::CountUnique => "CountUnique",
            Aggregate::Average => "Average",
            Aggregate::StandardDeviation => "StandardDeviation",
            Aggregate::Median => "Median",
            Aggregate::Mode => "Mode",
        }
    }

    /// Datatype of the aggregate for an input column of `input`.
    pub fn output_datatype(&self, input: DataType) -> DataType {
        match self {
            Aggregate::Count | Aggregate::CountUnique => DataType::Int,
            Aggregate::Average | Aggregate::StandardDeviation => DataType::Float,
            _ => input,
        }
    }

    /// Whether the aggregate can be computed over values of `input`.
    pub fn accepts(&self, input: DataType) -> bool {
        match self {
            Aggregate::Sum | Aggregate::Average | Aggregate::StandardDeviation => {
                matches!(input, DataType::Int | DataType::Float)
            }
            _ => true,
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
enum State {
    /// Max, Min, Sum, First and Last: a single running value.
    Running(Option<Value>),
    Count(i64),
    Distinct(HashSet<Value>),
    Mean { count: u64, mean: f64 },
    /// Welford's online variance.
    Variance { count: u64, mean: f64, m2: f64 },
    /// Median and Mode: value frequencies.
    Histogram(BTreeMap<Value, u64>),
}

/// Running state of one aggregate over one column.
#[derive(Debug, Clone)]
pub struct Aggregator {
    kind: Aggregate,
    datatype: DataType,
    state: State,
}

impl Aggregator {
    pub fn new(kind: Aggregate, datatype: DataType) -> TableResult<Self> {
        if !kind.accepts(datatype) {
            return Err(TableError::invalid(format!("{kind} is not defined for {datatype} values")));
        }
        let state = match kind {
            Aggregate::Max | Aggregate::Min | Aggregate::Sum | Aggregate::First | Aggregate::Last => {
                State::Running(None)
            }
            Aggregate::Count => State::Count(0),
            Aggregate::CountUnique => State::Distinct(HashSet::new()),
            Aggregate::Average => State::Mean { count: 0, mean: 0.0 },
            Aggregate::StandardDeviation => State::Variance {
                count: 0,
                mean: 0.0,
                m2: 0.0,
            },
            Aggregate::Median | Aggregate::Mode => State::Histogram(BTreeMap::new()),
        };
        Ok(Self { kind, datatype, state })
    }

    pub fn kind(&self) -> Aggregate {
        self.kind
    }

    pub fn output_datatype(&self) -> DataType {
        self.kind.output_datatype(self.datatype)
    }

    /// Fold one value into the aggregate. Nulls are skipped.
    pub fn update(&mut self, value: &Value) -> TableResult<()> {
        let Some(dt) = value.data_type() else {
            return Ok(());
        };
        if dt != self.datatype {
            return Err(TableError::TypeMismatch {
                column: self.kind.name().to_string(),
                message: format!("{value} is {dt}, aggregator expects {}", self.datatype),
            });
        }

        match (&mut self.state, self.kind) {
            (State::Running(current), Aggregate::Max) => {
                if current.as_ref().is_none_or(|c| value > c) {
                    *current = Some(value.clone());
                }
            }
            (State::Running(current), Aggregate::Min) => {
                if current.as_ref().is_none_or(|c| value < c) {
                    *current = Some(value.clone());
                }
            }
            (State::Running(current), Aggregate::Sum) => {
                let next = match current {
                    None => value.clone(),
                    Some(total) => add(total, value)?,
                };
                *current = Some(next);
            }
            (State::Running(current), Aggregate::First) => {
                if current.is_none() {
                    *current = Some(value.clone());
                }
            }
            (State::Running(current), _) => *current = Some(value.clone()),
            (State::Count(n), _) => *n += 1,
            (State::Distinct(seen), _) => {
                seen.insert(value.clone());
            }
            (State::Mean { count, mean }, _) => {
                let x = numeric(value)?;
                *count += 1;
                *mean += (x - *mean) / *count as f64;
            }
            (State::Variance { count, mean, m2 }, _) => {
                let x = numeric(value)?;
                *count += 1;
                let delta = x - *mean;
                *mean += delta / *count as f64;
                *m2 += delta * (x - *mean);
            }
            (State::Histogram(counts), _) => {
                *counts.entry(value.clone()).or_insert(0) += 1;
            }
        }
        Ok(())
    }

    /// Current value of the aggregate.
    pub fn value(&self) -> Value {
        match &self.state {
            State::Running(current) => current.clone().unwrap_or(Value::Null),
            State::Count(n) => Value::Int(*n),
            State::Distinct(seen) => Value::Int(seen.len() as i64),
            State::Mean { mean, .. } => Value::Float(*mean),
            State::Variance { count, m2, .. } => {
                if *count < 2 {
                    Value::Float(0.0)
                } else {
                    Value::Float((m2 / (*count - 1) as f64).sqrt())
                }
            }
            State::Histogram(counts) if self.kind == Aggregate::Median => median(counts),
            State::Histogram(counts) => mode(counts),
        }
    }
}

fn numeric(value: &Value) -> TableResult<f64> {
    value
        .as_f64()
        .ok_or_else(|| TableError::invalid(format!("{value} is not numeric")))
}

fn add(total: &Value, value: &Value) -> TableResult<Value> {
    match (total, value) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(*b)
            .map(Value::Int)
            .ok_or_else(|| TableError::invalid("integer overflow in Sum")),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        _ => Err(TableError::invalid(format!("cannot add {value} to {total}"))),
    }
}

fn median(counts: &BTreeMap<Value, u64>) -> Value {
    let total: u64 = counts.values().sum();
    let mut cumulative = 0;
    for (value, n) in counts {
        cumulative += n;
        if cumulative * 2 > total {
            return value.clone();
        }
    }
    Value::Null
}

fn mode(counts: &BTreeMap<Value, u64>) -> Value {
    counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(v, _)| v.clone())
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::{Aggregate, Aggregator};
    use crate::types::{DataType, Value};

    fn run(kind: Aggregate, dt: DataType, values: &[Value]) -> Value {
        let mut agg = Aggregator::new(kind, dt).unwrap();
        for v in values {
            agg.update(v).unwrap();
        }
        agg.value()
    }

    fn ints(xs: &[i64]) -> Vec<Value> {
        xs.iter().copied().map(Value::Int).collect()
    }

    #[test]
    fn limits_and_sum_keep_input_type() {
        let data = [Value::Int(4), Value::Null, Value::Int(9), Value::Int(-2)];
        assert_eq!(run(Aggregate::Max, DataType::Int, &data), Value::Int(9));
        assert_eq!(run(Aggregate::Min, DataType::Int, &data), Value::Int(-2));
        assert_eq!(run(Aggregate::Sum, DataType::Int, &data), Value::Int(11));
        assert_eq!(
            run(Aggregate::Sum, DataType::Float, &[Value::Float(0.5), Value::Float(1.25)]),
            Value::Float(1.75)
        );
        assert_eq!(run(Aggregate::Max, DataType::Str, &[Value::from("a"), Value::from("c")]), Value::from("c"));
    }

    #[test]
    fn first_last_count_ignore_nulls() {
        let data = [Value::Null, Value::Int(1), Value::Int(2), Value::Null];
        assert_eq!(run(Aggregate::First, DataType::Int, &data), Value::Int(1));
        assert_eq!(run(Aggregate::Last, DataType::Int, &data), Value::Int(2));
        assert_eq!(run(Aggregate::Count, DataType::Int, &data), Value::Int(2));
        assert_eq!(run(Aggregate::CountUnique, DataType::Int, &ints(&[1, 1, 2])), Value::Int(2));
    }

    #[test]
    fn distinct_and_frequency_aggregates_ignore_nulls() {
        let data = [Value::Null, Value::Int(1), Value::Null, Value::Int(1), Value::Int(2)];
        assert_eq!(run(Aggregate::CountUnique, DataType::Int, &data), Value::Int(2));

        let mostly_null = [Value::Null, Value::Null, Value::Null, Value::Int(1), Value::Int(2)];
        assert_eq!(run(Aggregate::Median, DataType::Int, &mostly_null), Value::Int(2));
        assert_eq!(
            run(Aggregate::Mode, DataType::Str, &[Value::Null, Value::Null, Value::from("x")]),
            Value::from("x")
        );
    }

    #[test]
    fn empty_groups() {
        assert_eq!(run(Aggregate::Max, DataType::Int, &[Value::Null]), Value::Null);
        assert_eq!(run(Aggregate::Count, DataType::Int, &[]), Value::Int(0));
        assert_eq!(run(Aggregate::Average, DataType::Int, &[]), Value::Float(0.0));
        assert_eq!(run(Aggregate::Median, DataType::Int, &[]), Value::Null);
    }

    #[test]
    fn average_and_standard_deviation() {
        let data = ints(&[2, 4, 4, 4, 5, 5, 7, 9]);
        assert_eq!(run(Aggregate::Average, DataType::Int, &data), Value::Float(5.0));
        let Value::Float(sd) = run(Aggregate::StandardDeviation, DataType::Int, &data) else {
            panic!("expected float");
        };
        assert!((sd - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(run(Aggregate::StandardDeviation, DataType::Int, &ints(&[3])), Value::Float(0.0));
    }

    #[test]
    fn median_and_mode() {
        assert_eq!(run(Aggregate::Median, DataType::Int, &ints(&[5, 1, 3])), Value::Int(3));
        assert_eq!(run(Aggregate::Median, DataType::Int, &ints(&[1, 2, 3, 4])), Value::Int(3));
        assert_eq!(run(Aggregate::Mode, DataType::Int, &ints(&[1, 2, 2, 3, 3])), Value::Int(3));
        assert_eq!(run(Aggregate::Mode, DataType::Int, &ints(&[7, 1, 1])), Value::Int(1));
    }

    #[test]
    fn numeric_aggregates_reject_text_columns() {
        assert!(Aggregator::new(Aggregate::Sum, DataType::Str).is_err());
        assert!(Aggregator::new(Aggregate::Average, DataType::Date).is_err());
        assert!(Aggregator::new(Aggregate::Mode, DataType::Str).is_ok());
    }

    #[test]
    fn update_rejects_wrong_type_and_overflow() {
        let mut agg = Aggregator::new(Aggregate::Sum, DataType::Int).unwrap();
        assert!(agg.update(&Value::Float(1.0)).is_err());
        agg.update(&Value::Int(i64::MAX)).unwrap();
        assert!(agg.update(&Value::Int(1)).is_err());
    }

    #[test]
    fn output_datatypes() {
        assert_eq!(Aggregate::Count.output_datatype(DataType::Str), DataType::Int);
        assert_eq!(Aggregate::Average.output_datatype(DataType::Int), DataType::Float);
        assert_eq!(Aggregate::Median.output_datatype(DataType::Date), DataType::Date);
    }
}
