//! Core value model: datatypes, typed values, and table metadata.
//!
//! Every [`crate::column::Column`] holds values of exactly one [`DataType`] (plus
//! [`Value::Null`] when the column allows empty values).

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Opaque key/value metadata carried by a [`crate::table::Table`].
///
/// Keys keep their insertion order through serialization.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Logical datatype of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point number.
    Float,
    /// Boolean.
    Bool,
    /// UTF-8 text.
    Str,
    /// Calendar date.
    Date,
    /// Time of day (microsecond precision when inferred from text).
    Time,
    /// Date and time of day, without timezone.
    DateTime,
}

impl DataType {
    /// The order in which inference attempts datatypes: most restrictive first, text last.
    pub const INFERENCE_ORDER: [DataType; 7] = [
        DataType::DateTime,
        DataType::Date,
        DataType::Time,
        DataType::Int,
        DataType::Bool,
        DataType::Float,
        DataType::Str,
    ];

    /// Canonical name used in serialization.
    pub fn name(self) -> &'static str {
        match self {
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Bool => "bool",
            DataType::Str => "str",
            DataType::Date => "date",
            DataType::Time => "time",
            DataType::DateTime => "datetime",
        }
    }

    /// Resolve a datatype from its canonical name or one of its aliases
    /// (`integer`, `decimal`, `boolean`, `text`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" | "integer" => Some(DataType::Int),
            "float" | "decimal" => Some(DataType::Float),
            "bool" | "boolean" => Some(DataType::Bool),
            "str" | "text" => Some(DataType::Str),
            "date" => Some(DataType::Date),
            "time" => Some(DataType::Time),
            "datetime" => Some(DataType::DateTime),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single typed value stored in a column.
///
/// Values are totally ordered and hashable so they can serve as index, group, and sort keys.
/// Floats compare with [`f64::total_cmp`], so `NaN` equals itself and `-0.0` sorts before `0.0`.
/// Values of different datatypes order by datatype, with [`Value::Null`] first.
#[derive(Debug, Clone)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 text.
    Str(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Date and time of day.
    DateTime(NaiveDateTime),
}

impl Value {
    /// The datatype of this value, or `None` for [`Value::Null`].
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Int(_) => Some(DataType::Int),
            Value::Float(_) => Some(DataType::Float),
            Value::Bool(_) => Some(DataType::Bool),
            Value::Str(_) => Some(DataType::Str),
            Value::Date(_) => Some(DataType::Date),
            Value::Time(_) => Some(DataType::Time),
            Value::DateTime(_) => Some(DataType::DateTime),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of the value (integers widen to `f64`).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Int(_) => 1,
            Value::Float(_) => 2,
            Value::Bool(_) => 3,
            Value::Str(_) => 4,
            Value::Date(_) => 5,
            Value::Time(_) => 6,
            Value::DateTime(_) => 7,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Time(a), Value::Time(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Int(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Bool(v) => v.hash(state),
            Value::Str(v) => v.hash(state),
            Value::Date(v) => v.hash(state),
            Value::Time(v) => v.hash(state),
            Value::DateTime(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::Time(v) => f.write_str(&iso_time(v)),
            Value::DateTime(v) => write!(f, "{}T{}", v.date().format("%Y-%m-%d"), iso_time(&v.time())),
        }
    }
}

/// `HH:MM:SS`, followed by `.ffffff` for a sub-second part, or `.fffffffff` when that part is
/// finer than a microsecond.
fn iso_time(t: &NaiveTime) -> String {
    // A leap second carries its extra second in the nanosecond field.
    let nanos = t.nanosecond() % 1_000_000_000;
    let hms = t.format("%H:%M:%S");
    if nanos == 0 {
        hms.to_string()
    } else if nanos % 1_000 == 0 {
        format!("{hms}.{:06}", nanos / 1_000)
    } else {
        format!("{hms}.{nanos:09}")
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
