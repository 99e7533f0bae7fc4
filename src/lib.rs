//! `tablekit` is a typed columnar table engine: validated columns, relational operations on
//! tables, streaming group-by, and datatype inference for raw delimited-text and spreadsheet
//! input.
//!
//! The primary ingestion entrypoint is [`ingestion::file_reader`], which picks a reader from the
//! file extension, builds tables of text columns, and then infers each column's real datatype
//! with [`ingestion::find_format`].
//!
//! ## Data model
//!
//! - [`types::DataType`]: `int`, `float`, `bool`, `str`, `date`, `time`, `datetime`
//! - [`types::Value`]: one cell, or [`types::Value::Null`]
//! - [`column::Column`]: a named sequence of values of one datatype; every mutation is
//!   validated before it is applied, so a failed call leaves the column unchanged
//! - [`table::Table`]: ordered, uniquely named columns plus opaque metadata
//!
//! ## Quick example: build, query and serialize a table
//!
//! ```rust
//! use tablekit::table::{Criterion, Table};
//! use tablekit::types::{DataType, Value};
//!
//! # fn main() -> Result<(), tablekit::TableError> {
//! let mut t = Table::new();
//! t.add_column("city", DataType::Str, false, vec![])?;
//! t.add_column("temp", DataType::Int, true, vec![])?;
//! t.add_row(vec!["oslo".into(), Value::Int(-3)])?;
//! t.add_row(vec!["rome".into(), Value::Null])?;
//! t.add_row(vec!["nice".into(), Value::Int(16)])?;
//!
//! t.sort(&[("temp", true)])?;
//! assert_eq!(t.row(0), Some(vec!["nice".into(), Value::Int(16)]));
//! assert_eq!(t.row(-1), Some(vec!["rome".into(), Value::Null]));
//!
//! let cold = t.all(&[("temp", Criterion::matches(|v| v.as_i64().is_some_and(|n| n < 0)))])?;
//! assert_eq!(cold.len(), 1);
//!
//! let copy = Table::from_json(&t.to_json()?)?;
//! assert_eq!(copy, t);
//! # Ok(())
//! # }
//! ```
//!
//! ## Ingesting files
//!
//! ```no_run
//! use tablekit::ingestion::{file_reader, IngestionOptions};
//!
//! # fn main() -> Result<(), tablekit::TableError> {
//! // Separator, encoding and column datatypes are all detected.
//! let tables = file_reader("data.csv", &IngestionOptions::default())?;
//! for column in tables[0].columns() {
//!     println!("{} is {}", column.header(), column.datatype());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: datatypes and values
//! - [`datatypes`]: the JSON value codec and text-to-value inference
//! - [`column`]: validated column storage
//! - [`table`]: tables, row access, select, sort, index, joins, CSV export
//! - [`processing`]: aggregators, [`processing::GroupBy`] with pivot, column mapping
//! - [`ingestion`]: encoding detection, readers, harmonization, observers
//! - [`error`]: the error type shared by every module
//!
//! All operations are single-threaded and in-memory: sort builds a full rank table, joins build
//! full indexes, and inputs must fit in memory.

pub mod column;
pub mod datatypes;
pub mod error;
pub mod ingestion;
pub mod processing;
pub mod table;
pub mod types;

pub use error::{TableError, TableResult};
