//! Value codec and datatype inference.
//!
//! - [`encode`] / [`decode`] convert between [`Value`]s and the JSON literals used by the
//!   table format.
//! - [`infer`] coerces a raw value (usually text read from a file) into a requested
//!   [`DataType`], failing when the value does not fit.
//! - [`Inferrer`] memoizes [`infer`] so repeated values are only parsed once.
//!
//! Recognized null tokens (`""`, `null`, `Null`, `NULL`, `None`, `#N/A`, `#n/a`) infer as
//! [`Value::Null`] for every datatype.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use tablekit::datatypes::infer;
//! use tablekit::types::{DataType, Value};
//!
//! let day = NaiveDate::from_ymd_opt(2003, 9, 25).unwrap();
//! assert_eq!(infer(&Value::from("2003-09-25"), DataType::Date).unwrap(), Value::Date(day));
//! assert_eq!(infer(&Value::from("25/09/2003"), DataType::Date).unwrap(), Value::Date(day));
//! assert_eq!(infer(&Value::from("2,932.500"), DataType::Float).unwrap(), Value::Float(2932.5));
//! assert!(infer(&Value::from("x"), DataType::Int).is_err());
//! ```

pub mod numeric;
pub mod temporal;

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{TableError, TableResult};
use crate::types::{DataType, Value};

/// Literal used for null in the JSON table format.
pub const NULL_LITERAL: &str = "null";

/// Text tokens that are read as null during inference.
pub const NULL_TOKENS: [&str; 7] = ["", "null", "Null", "NULL", "None", "#N/A", "#n/a"];

const TRUE_LITERAL: &str = "True";
const FALSE_LITERAL: &str = "False";

/// Returns `true` for [`Value::Null`] and for text matching one of [`NULL_TOKENS`].
pub fn is_null_token(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Str(s) => NULL_TOKENS.contains(&s.trim()),
        _ => false,
    }
}

/// Encode a value as the JSON literal stored in a serialized column.
///
/// Null encodes as the string `"null"` and booleans as the strings `"True"`/`"False"`;
/// temporal values encode as ISO-8601 strings. Non-finite floats encode as `"nan"`, `"inf"`
/// or `"-inf"` since JSON numbers cannot hold them.
pub fn encode(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::String(NULL_LITERAL.to_string()),
        Value::Int(v) => serde_json::Value::from(*v),
        Value::Float(v) => match serde_json::Number::from_f64(*v) {
            Some(n) => serde_json::Value::Number(n),
            None => serde_json::Value::String(non_finite_literal(*v).to_string()),
        },
        Value::Bool(true) => serde_json::Value::String(TRUE_LITERAL.to_string()),
        Value::Bool(false) => serde_json::Value::String(FALSE_LITERAL.to_string()),
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::Date(_) | Value::Time(_) | Value::DateTime(_) => {
            serde_json::Value::String(value.to_string())
        }
    }
}

fn non_finite_literal(v: f64) -> &'static str {
    if v.is_nan() {
        "nan"
    } else if v.is_sign_negative() {
        "-inf"
    } else {
        "inf"
    }
}

/// Decode a JSON literal written by [`encode`] back into a value of `datatype`.
pub fn decode(raw: &serde_json::Value, datatype: DataType) -> TableResult<Value> {
    if raw.as_str() == Some(NULL_LITERAL) {
        return Ok(Value::Null);
    }

    let fail = |message: &str| TableError::Decode {
        datatype,
        raw: raw.to_string(),
        message: message.to_string(),
    };

    match datatype {
        DataType::Int => raw.as_i64().map(Value::Int).ok_or_else(|| fail("expected integer")),
        DataType::Float => match raw {
            serde_json::Value::Number(n) => n.as_f64().map(Value::Float).ok_or_else(|| fail("expected number")),
            serde_json::Value::String(s) => match s.as_str() {
                "nan" => Ok(Value::Float(f64::NAN)),
                "inf" => Ok(Value::Float(f64::INFINITY)),
                "-inf" => Ok(Value::Float(f64::NEG_INFINITY)),
                _ => Err(fail("expected number")),
            },
            _ => Err(fail("expected number")),
        },
        DataType::Bool => match raw {
            serde_json::Value::String(s) if s == TRUE_LITERAL => Ok(Value::Bool(true)),
            serde_json::Value::String(s) if s == FALSE_LITERAL => Ok(Value::Bool(false)),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            _ => Err(fail("expected \"True\" or \"False\"")),
        },
        DataType::Str => raw
            .as_str()
            .map(|s| Value::Str(s.to_string()))
            .ok_or_else(|| fail("expected string")),
        DataType::Date => decode_iso::<NaiveDate>(raw).map(Value::Date).map_err(|m| fail(&m)),
        DataType::Time => decode_iso::<NaiveTime>(raw).map(Value::Time).map_err(|m| fail(&m)),
        DataType::DateTime => decode_iso::<NaiveDateTime>(raw)
            .map(Value::DateTime)
            .map_err(|m| fail(&m)),
    }
}

fn decode_iso<T>(raw: &serde_json::Value) -> Result<T, String>
where
    T: FromStr<Err = chrono::ParseError>,
{
    let text = raw.as_str().ok_or_else(|| "expected ISO-8601 string".to_string())?;
    text.parse::<T>().map_err(|e| e.to_string())
}

/// Coerce `value` into `datatype`.
///
/// Null tokens infer as [`Value::Null`]. Otherwise the value must convert without loss:
///
/// - `Int` rejects booleans and fractional floats; text must be digits with an optional sign.
/// - `Float` rejects integers (they infer as `Int` first) and text whose parsed value does not
///   reproduce the input digits.
/// - `Bool` accepts only booleans and the text `true`/`false` (any case).
/// - `Date`, `Time` and `DateTime` accept ISO-8601 text plus the patterns in [`temporal`].
/// - `Str` accepts anything, rendering non-text values with their display form.
pub fn infer(value: &Value, datatype: DataType) -> TableResult<Value> {
    if is_null_token(value) {
        return Ok(Value::Null);
    }

    let attempt = match datatype {
        DataType::Int => numeric::infer_int(value),
        DataType::Float => numeric::infer_float(value),
        DataType::Bool => numeric::infer_bool(value),
        DataType::Str => Ok(infer_str(value)),
        DataType::Date => temporal::infer_date(value),
        DataType::Time => temporal::infer_time(value),
        DataType::DateTime => temporal::infer_datetime(value),
    };

    attempt.map_err(|message| TableError::Infer {
        raw: value.to_string(),
        datatype,
        message,
    })
}

fn infer_str(value: &Value) -> Value {
    match value {
        Value::Str(_) => value.clone(),
        other => Value::Str(other.to_string()),
    }
}

/// Memoizing front-end for [`infer`].
///
/// Inference is a pure function of `(value, datatype)`, so both successes and failures are
/// cached.
#[derive(Debug, Default)]
pub struct Inferrer {
    cache: HashMap<(Value, DataType), Result<Value, String>>,
}

impl Inferrer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same as [`infer`], answering repeated requests from the cache.
    pub fn infer(&mut self, value: &Value, datatype: DataType) -> TableResult<Value> {
        let key = (value.clone(), datatype);
        let cached = self.cache.entry(key).or_insert_with(|| match infer(value, datatype) {
            Ok(v) => Ok(v),
            Err(TableError::Infer { message, .. }) => Err(message),
            Err(other) => Err(other.to_string()),
        });

        cached.clone().map_err(|message| TableError::Infer {
            raw: value.to_string(),
            datatype,
            message,
        })
    }

    /// Number of cached `(value, datatype)` results.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
