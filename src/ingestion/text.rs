//! Delimited-text reader.
//!
//! The first non-blank line is the header. The separator is detected from that line unless one
//! is given. Every column of the resulting table is text and nullable; run
//! [`super::harmonize::find_format`] to infer real datatypes.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::column::Column;
use crate::error::{TableError, TableResult};
use crate::table::Table;
use crate::types::{DataType, Value};

use super::encoding::decode_bytes;

/// Separators considered by [`detect_separator`], in tie-break order.
pub const SEPARATOR_CANDIDATES: [char; 5] = [',', ';', ':', '|', '\t'];

const QUOTE: char = '"';

/// Pick the most frequent candidate separator in `line`, or a space if none occurs.
pub fn detect_separator(line: &str) -> char {
    let mut best = (' ', 0);
    for candidate in SEPARATOR_CANDIDATES {
        let count = line.matches(candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    debug!(separator = ?best.0, occurrences = best.1, "detected separator");
    best.0
}

/// Split one line into fields.
///
/// Lines with fewer than two quote characters are split on `separator` and each field is
/// trimmed. Otherwise quotes are honoured: a quote at the start of a field opens it, a quote
/// followed by the separator or the end of the line closes it, and any other quote (doubled
/// quotes included) is kept as text. Quoted content is not trimmed.
pub fn split_line(line: &str, separator: char) -> Vec<String> {
    if line.matches(QUOTE).count() < 2 {
        return line.split(separator).map(|f| f.trim().to_string()).collect();
    }

    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quote = false;
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quote {
            if c == QUOTE {
                match chars.peek() {
                    None => in_quote = false,
                    Some(&next) if next == separator => in_quote = false,
                    Some(_) => field.push(QUOTE),
                }
            } else {
                field.push(c);
            }
        } else if c == separator {
            fields.push(finish_field(&mut field, quoted));
            quoted = false;
        } else if c == QUOTE && field.trim().is_empty() && !quoted {
            field.clear();
            in_quote = true;
            quoted = true;
        } else {
            field.push(c);
        }
    }
    fields.push(finish_field(&mut field, quoted));
    fields
}

fn finish_field(field: &mut String, quoted: bool) -> String {
    let out = if quoted {
        std::mem::take(field)
    } else {
        field.trim().to_string()
    };
    field.clear();
    out
}

/// Read delimited text into a table of nullable text columns.
///
/// Blank lines are skipped. A row one field short of the header is padded with an empty field;
/// any other width mismatch is an error naming the 1-based line number.
pub fn read_text(text: &str, separator: Option<char>) -> TableResult<Table> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines.next().ok_or_else(|| TableError::SchemaMismatch {
        message: "input has no header line".to_string(),
    })?;
    let separator = separator.unwrap_or_else(|| detect_separator(header_line));
    let headers: Vec<String> = split_line(header_line, separator)
        .into_iter()
        .enumerate()
        .map(|(i, h)| if h.is_empty() { format!("column{}", i + 1) } else { h })
        .collect();

    let width = headers.len();
    let mut data: Vec<Vec<Value>> = vec![Vec::new(); width];
    for (line_no, line) in lines {
        let mut fields = split_line(line, separator);
        if fields.len() + 1 == width {
            warn!(line = line_no, "row is one field short; padding with an empty field");
            fields.push(String::new());
        }
        if fields.len() != width {
            return Err(TableError::SchemaMismatch {
                message: format!("line {line_no}: expected {width} fields, found {}", fields.len()),
            });
        }
        for (column, field) in data.iter_mut().zip(fields) {
            column.push(Value::Str(field));
        }
    }

    let mut table = Table::new();
    for (header, values) in headers.into_iter().zip(data) {
        table.push_column(Column::with_data(header, DataType::Str, true, values)?);
    }
    debug!(columns = table.column_count(), rows = table.len(), "read delimited text");
    Ok(table)
}

/// Read a delimited text file, detecting its encoding first.
pub fn read_text_from_path(path: impl AsRef<Path>, separator: Option<char>) -> TableResult<Table> {
    let bytes = fs::read(path)?;
    let (text, _encoding) = decode_bytes(&bytes);
    read_text(&text, separator)
}
