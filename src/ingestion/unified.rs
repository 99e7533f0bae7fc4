//! Unified ingestion entrypoint.
//!
//! Most callers should use [`file_reader`], which reads a file into one or more tables:
//!
//! - If [`IngestionOptions::format`] is `None`, the format is inferred from the file extension.
//! - Text and spreadsheet tables are passed through [`find_format`] unless
//!   [`IngestionOptions::harmonize`] is off.
//! - If an [`IngestionObserver`] is provided, success, failure and alerts are reported to it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{TableError, TableResult};
use crate::table::Table;

use super::harmonize::find_format;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::{json, text};

/// Supported ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    /// Delimited text (`csv`, `tsv`, `txt`, `psv`); the separator is detected unless given.
    Text,
    /// Workbook formats (feature-gated behind `excel`).
    Spreadsheet,
    /// The JSON table format.
    Json,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "txt" | "psv" => Some(Self::Text),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Spreadsheet),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Which sheets of a workbook to read. Each selected sheet becomes its own table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SheetSelection {
    #[default]
    First,
    Sheet(String),
    AllSheets,
    /// The listed sheets, in the given order.
    Sheets(Vec<String>),
}

/// Options controlling [`file_reader`]. Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, the format is inferred from the file extension.
    pub format: Option<IngestionFormat>,
    /// Separator for delimited text; detected from the header line when `None`.
    pub separator: Option<char>,
    pub sheet_selection: SheetSelection,
    /// Run datatype inference over text and spreadsheet tables (default `true`).
    pub harmonize: bool,
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("separator", &self.separator)
            .field("sheet_selection", &self.sheet_selection)
            .field("harmonize", &self.harmonize)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            separator: None,
            sheet_selection: SheetSelection::default(),
            harmonize: true,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Read `path` into tables.
///
/// Delimited text and JSON files holding one table yield one table; spreadsheets yield one
/// table per selected sheet and JSON files may hold several. A failure anywhere aborts the
/// whole file.
///
/// When an observer is configured this reports `on_success` with table and row counts,
/// `on_failure` with a computed severity, and `on_alert` when that severity is at or above
/// `options.alert_at_or_above`.
///
/// ```no_run
/// use std::sync::Arc;
///
/// use tablekit::ingestion::{file_reader, IngestionOptions, IngestionSeverity, TracingObserver};
///
/// # fn main() -> Result<(), tablekit::TableError> {
/// let opts = IngestionOptions {
///     separator: Some(';'),
///     observer: Some(Arc::new(TracingObserver)),
///     alert_at_or_above: IngestionSeverity::Error,
///     ..Default::default()
/// };
/// let tables = file_reader("measurements.csv", &opts)?;
/// println!("{}", tables[0]);
/// # Ok(())
/// # }
/// ```
pub fn file_reader(path: impl AsRef<Path>, options: &IngestionOptions) -> TableResult<Vec<Table>> {
    let path = path.as_ref();
    let format = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };
    let ctx = IngestionContext {
        path: path.to_path_buf(),
        format,
    };

    let result = read_format(path, format, options);

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(tables) => obs.on_success(
                &ctx,
                IngestionStats {
                    tables: tables.len(),
                    rows: tables.iter().map(Table::len).sum(),
                },
            ),
            Err(e) => {
                let severity = IngestionSeverity::of(e);
                obs.on_failure(&ctx, severity, e);
                if severity >= options.alert_at_or_above {
                    obs.on_alert(&ctx, severity, e);
                }
            }
        }
    }

    result
}

fn read_format(path: &Path, format: IngestionFormat, options: &IngestionOptions) -> TableResult<Vec<Table>> {
    let mut tables = match format {
        IngestionFormat::Text => vec![text::read_text_from_path(path, options.separator)?],
        IngestionFormat::Spreadsheet => read_spreadsheet(path, &options.sheet_selection)?,
        IngestionFormat::Json => return json::read_json_tables(path),
    };
    if options.harmonize {
        for table in &mut tables {
            find_format(table)?;
        }
    }
    Ok(tables)
}

fn infer_format_from_path(path: &Path) -> TableResult<IngestionFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| TableError::SchemaMismatch {
            message: format!("cannot infer format: path has no extension ({})", path.display()),
        })?;

    IngestionFormat::from_extension(ext).ok_or_else(|| TableError::SchemaMismatch {
        message: format!("cannot infer format from extension '{ext}' for path ({})", path.display()),
    })
}

fn read_spreadsheet(path: &Path, selection: &SheetSelection) -> TableResult<Vec<Table>> {
    #[cfg(feature = "excel")]
    {
        super::excel::read_workbook_from_path(path, selection)
    }

    #[cfg(not(feature = "excel"))]
    {
        let _ = (path, selection);
        Err(TableError::invalid(
            "spreadsheet ingestion not enabled (enable cargo feature 'excel')",
        ))
    }
}
