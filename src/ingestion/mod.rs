//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`file_reader`] (from [`unified`]) which:
//!
//! - picks a reader by file extension (or you can override via [`IngestionOptions`])
//! - builds one table per input table (one per sheet for workbooks)
//! - infers column datatypes with [`find_format`]
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! The pieces are also available separately:
//! - [`encoding`]: byte-to-text decoding
//! - [`text`]: separator detection, tokenizing and delimited-text reading
//! - [`sheet`]: spreadsheet cells to tables, date serials
//! - `excel`: workbook reading (cargo feature `excel`)
//! - [`json`]: JSON table files
//! - [`harmonize`]: datatype inference over a whole table

pub mod encoding;
#[cfg(feature = "excel")]
pub mod excel;
pub mod harmonize;
pub mod json;
pub mod observability;
pub mod sheet;
pub mod text;
pub mod unified;

pub use harmonize::find_format;
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    TracingObserver,
};
pub use unified::{file_reader, IngestionFormat, IngestionOptions, SheetSelection};
