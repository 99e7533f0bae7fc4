use thiserror::Error;

use crate::types::DataType;

/// Convenience result type used across the crate.
pub type TableResult<T> = Result<T, TableError>;

/// Error type returned by table, column, inference, and ingestion operations.
///
/// This is a single error enum shared by every module. Mutating operations that return an
/// error leave the table or column they were called on unchanged.
#[derive(Debug, Error)]
pub enum TableError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Spreadsheet reader error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV writer error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed JSON table document.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value does not match the datatype of the column it was written to.
    #[error("type mismatch in column '{column}': {message}")]
    TypeMismatch { column: String, message: String },

    /// A null was written to a column that does not permit empty values.
    #[error("column '{column}' does not permit null values")]
    NullNotAllowed { column: String },

    /// The shape of the input does not match the table (row width, column lengths, headers).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// Positional access past the end of a column.
    #[error("index {index} is out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// One or more column names are not present.
    #[error("unknown column(s): {}", names.join(", "))]
    UnknownColumn { names: Vec<String> },

    /// Two tables cannot be combined.
    #[error("tables are incompatible: {message}")]
    Incompatible { message: String },

    /// A value could not be coerced into the requested datatype.
    #[error("cannot infer {datatype} from '{raw}': {message}")]
    Infer {
        raw: String,
        datatype: DataType,
        message: String,
    },

    /// A serialized value could not be decoded into its column datatype.
    #[error("cannot decode {datatype} from {raw}: {message}")]
    Decode {
        datatype: DataType,
        raw: String,
        message: String,
    },

    /// The operation is not valid in the current state or with the given arguments.
    #[error("invalid operation: {message}")]
    InvalidOperation { message: String },
}

impl TableError {
    pub(crate) fn unknown_column(name: impl Into<String>) -> Self {
        Self::UnknownColumn {
            names: vec![name.into()],
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
