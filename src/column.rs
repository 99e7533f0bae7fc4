//! Typed, validated column storage.

use serde::{Deserialize, Serialize};

use crate::datatypes::{decode, encode};
use crate::error::{TableError, TableResult};
use crate::types::{DataType, Value};

static NULL: Value = Value::Null;

/// A named sequence of values of one [`DataType`].
///
/// Every element is either a value of exactly `datatype` or [`Value::Null`] (only when
/// `allow_empty` is set). All mutation goes through methods that validate before they write,
/// so a failed call leaves the column unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    header: String,
    datatype: DataType,
    allow_empty: bool,
    values: Vec<Value>,
}

/// Serialized form of a column. `data` is itself a JSON document holding the encoded values.
#[derive(Debug, Serialize, Deserialize)]
struct ColumnDocument {
    header: String,
    datatype: String,
    allow_empty: bool,
    data: String,
}

impl Column {
    /// Create an empty column. The header must not be empty.
    pub fn new(header: impl Into<String>, datatype: DataType, allow_empty: bool) -> TableResult<Self> {
        let header = header.into();
        if header.is_empty() {
            return Err(TableError::SchemaMismatch {
                message: "column header must not be empty".to_string(),
            });
        }
        Ok(Self {
            header,
            datatype,
            allow_empty,
            values: Vec::new(),
        })
    }

    /// Create a column and append `data`, validating every element.
    pub fn with_data(
        header: impl Into<String>,
        datatype: DataType,
        allow_empty: bool,
        data: Vec<Value>,
    ) -> TableResult<Self> {
        let mut column = Self::new(header, datatype, allow_empty)?;
        column.validate_all(&data)?;
        column.values = data;
        Ok(column)
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    pub fn allow_empty(&self) -> bool {
        self.allow_empty
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// The value at `index`, or [`Value::Null`] past the end of the column.
    pub fn value_at(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&NULL)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Check that `value` may be stored in this column.
    pub fn type_check(&self, value: &Value) -> TableResult<()> {
        match value.data_type() {
            None if self.allow_empty => Ok(()),
            None => Err(TableError::NullNotAllowed {
                column: self.header.clone(),
            }),
            Some(dt) if dt == self.datatype => Ok(()),
            Some(dt) => Err(TableError::TypeMismatch {
                column: self.header.clone(),
                message: format!("{value} is {dt}, expected {}", self.datatype),
            }),
        }
    }

    fn validate_all(&self, values: &[Value]) -> TableResult<()> {
        values.iter().try_for_each(|v| self.type_check(v))
    }

    pub fn append(&mut self, value: Value) -> TableResult<()> {
        self.type_check(&value)?;
        self.values.push(value);
        Ok(())
    }

    /// Append every value, or none of them if any fails validation.
    pub fn extend(&mut self, values: Vec<Value>) -> TableResult<()> {
        self.validate_all(&values)?;
        self.values.extend(values);
        Ok(())
    }

    /// Overwrite the element at `index`.
    pub fn set(&mut self, index: usize, value: Value) -> TableResult<()> {
        let len = self.values.len();
        if index >= len {
            return Err(TableError::IndexOutOfBounds { index, len });
        }
        self.type_check(&value)?;
        self.values[index] = value;
        Ok(())
    }

    /// Replace the whole contents with `values`, which must have the current length.
    pub fn replace(&mut self, values: Vec<Value>) -> TableResult<()> {
        if values.len() != self.values.len() {
            return Err(TableError::SchemaMismatch {
                message: format!(
                    "column '{}' has {} values, replacement has {}",
                    self.header,
                    self.values.len(),
                    values.len()
                ),
            });
        }
        self.validate_all(&values)?;
        self.values = values;
        Ok(())
    }

    /// Change datatype and contents together; used when a text column's real type is inferred.
    pub(crate) fn retype(&mut self, datatype: DataType, allow_empty: bool, values: Vec<Value>) -> TableResult<()> {
        let candidate = Self::with_data(self.header.clone(), datatype, allow_empty, values)?;
        *self = candidate;
        Ok(())
    }

    pub(crate) fn set_header(&mut self, header: String) {
        self.header = header;
    }

    /// A copy of this column holding only the elements at `indices` that exist.
    pub(crate) fn take(&self, indices: &[usize]) -> Self {
        Self {
            header: self.header.clone(),
            datatype: self.datatype,
            allow_empty: self.allow_empty,
            values: indices.iter().filter_map(|&i| self.values.get(i).cloned()).collect(),
        }
    }

    /// Serialize as `{"header", "datatype", "allow_empty", "data"}`, where `data` is a JSON
    /// string holding the array of encoded values.
    pub fn to_json(&self) -> TableResult<String> {
        let encoded: Vec<serde_json::Value> = self.values.iter().map(encode).collect();
        let doc = ColumnDocument {
            header: self.header.clone(),
            datatype: self.datatype.name().to_string(),
            allow_empty: self.allow_empty,
            data: serde_json::to_string(&encoded)?,
        };
        Ok(serde_json::to_string(&doc)?)
    }

    /// Inverse of [`Column::to_json`].
    pub fn from_json(json: &str) -> TableResult<Self> {
        let doc: ColumnDocument = serde_json::from_str(json)?;
        let datatype = DataType::from_name(&doc.datatype).ok_or_else(|| TableError::SchemaMismatch {
            message: format!("column '{}' has unknown datatype '{}'", doc.header, doc.datatype),
        })?;
        let raw: Vec<serde_json::Value> = serde_json::from_str(&doc.data)?;
        let values = raw
            .iter()
            .map(|v| decode(v, datatype))
            .collect::<TableResult<Vec<_>>>()?;
        Self::with_data(doc.header, datatype, doc.allow_empty, values)
    }
}

impl<'a> IntoIterator for &'a Column {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
