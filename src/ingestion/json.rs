//! JSON table files.
//!
//! A file holds either one table document (see [`Table::to_json`]) or an array of them.

use std::fs;
use std::path::Path;

use crate::error::{TableError, TableResult};
use crate::table::Table;

/// Read every table from a JSON table file.
pub fn read_json_tables(path: impl AsRef<Path>) -> TableResult<Vec<Table>> {
    let text = fs::read_to_string(path)?;
    read_json_tables_from_str(&text)
}

/// Parse one table document or an array of table documents.
pub fn read_json_tables_from_str(input: &str) -> TableResult<Vec<Table>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TableError::SchemaMismatch {
            message: "json input is empty".to_string(),
        });
    }

    match serde_json::from_str::<serde_json::Value>(trimmed)? {
        serde_json::Value::Array(items) => items.into_iter().map(Table::from_json_value).collect(),
        v @ serde_json::Value::Object(_) => Ok(vec![Table::from_json_value(v)?]),
        _ => Err(TableError::SchemaMismatch {
            message: "json must be a table object or an array of table objects".to_string(),
        }),
    }
}

/// Render tables as a JSON table file: a single object for one table, an array otherwise.
pub fn tables_to_json_string(tables: &[Table]) -> TableResult<String> {
    let value = match tables {
        [one] => one.to_json_value()?,
        many => serde_json::Value::Array(many.iter().map(Table::to_json_value).collect::<TableResult<_>>()?),
    };
    Ok(serde_json::to_string(&value)?)
}

/// Write tables to `path`, replacing any existing file.
pub fn write_json_tables(path: impl AsRef<Path>, tables: &[Table]) -> TableResult<()> {
    fs::write(path, tables_to_json_string(tables)?)?;
    Ok(())
}
