#![cfg(feature = "excel")]

//! Workbook reading (`.xlsx`, `.xls`, `.xlsm`, `.xlsb`, `.ods`) via `calamine`.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::error::{TableError, TableResult};
use crate::table::Table;

use super::sheet::{table_from_cells, SheetCell};
use super::unified::SheetSelection;

/// Read the selected sheets of a workbook, one table per sheet in selection order.
pub fn read_workbook_from_path(path: impl AsRef<Path>, selection: &SheetSelection) -> TableResult<Vec<Table>> {
    let mut workbook = open_workbook_auto(path)?;
    let available = workbook.sheet_names();

    let sheets: Vec<String> = match selection {
        SheetSelection::First => available.first().cloned().into_iter().collect(),
        SheetSelection::Sheet(name) => vec![name.clone()],
        SheetSelection::AllSheets => available.clone(),
        SheetSelection::Sheets(names) => names.clone(),
    };
    if sheets.is_empty() {
        return Err(TableError::SchemaMismatch {
            message: "workbook has no sheets".to_string(),
        });
    }

    let mut tables = Vec::with_capacity(sheets.len());
    for sheet in &sheets {
        if !available.contains(sheet) {
            return Err(TableError::SchemaMismatch {
                message: format!("sheet '{sheet}' not found. sheets={available:?}"),
            });
        }
        let range = workbook.worksheet_range(sheet)?;
        let rows = range.rows().map(|row| row.iter().map(cell_from_data).collect::<Vec<_>>());
        let table = table_from_cells(rows).map_err(|e| wrap_schema_err_with_sheet(sheet, e))?;
        debug!(sheet = %sheet, rows = table.len(), "read worksheet");
        tables.push(table);
    }
    Ok(tables)
}

fn wrap_schema_err_with_sheet(sheet: &str, err: TableError) -> TableError {
    match err {
        TableError::SchemaMismatch { message } => TableError::SchemaMismatch {
            message: format!("sheet '{sheet}': {message}"),
        },
        other => other,
    }
}

fn cell_from_data(c: &Data) -> SheetCell {
    match c {
        Data::Empty => SheetCell::Empty,
        Data::String(s) => SheetCell::Text(s.clone()),
        Data::Int(i) => SheetCell::Text(i.to_string()),
        Data::Float(f) => SheetCell::Number(*f),
        Data::Bool(b) => SheetCell::Boolean(*b),
        Data::DateTime(dt) if dt.is_duration() => SheetCell::Number(dt.as_f64()),
        Data::DateTime(dt) => SheetCell::DateSerial(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => SheetCell::Text(s.clone()),
        Data::Error(e) => SheetCell::Error(e.to_string()),
    }
}
