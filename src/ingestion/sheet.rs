//! Spreadsheet cells to tables.
//!
//! Cell extraction is done by a workbook reader (see the `excel` feature); this module takes the
//! extracted cells and builds a table of nullable text columns the same way the delimited-text
//! reader does, so both paths share one harmonization pass.

use chrono::{NaiveDate, NaiveTime, TimeDelta};

use crate::column::Column;
use crate::error::{TableError, TableResult};
use crate::table::Table;
use crate::types::{DataType, Value};

const MICROS_PER_DAY: f64 = 86_400_000_000.0;

/// One spreadsheet cell as reported by a workbook reader.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetCell {
    Empty,
    Text(String),
    Number(f64),
    /// Serial day number in the 1900 date system; the fraction is the time of day.
    DateSerial(f64),
    Boolean(bool),
    /// An error cell such as `#N/A` or `#DIV/0!`.
    Error(String),
}

impl SheetCell {
    pub fn is_empty(&self) -> bool {
        match self {
            SheetCell::Empty => true,
            SheetCell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text form handed to datatype inference.
    pub fn to_text(&self) -> String {
        match self {
            SheetCell::Empty => String::new(),
            SheetCell::Text(s) => s.trim().to_string(),
            SheetCell::Number(n) => n.to_string(),
            SheetCell::DateSerial(serial) => match excel_serial_to_value(*serial) {
                Value::Null => serial.to_string(),
                value => value.to_string(),
            },
            SheetCell::Boolean(b) => b.to_string(),
            SheetCell::Error(e) => e.clone(),
        }
    }
}

/// Convert a 1900-system date serial to a date, time or datetime.
///
/// Serials below 1 are a time of day, whole serials are dates, anything else a datetime.
/// Serial 60 is the nonexistent 1900-02-29, which is mapped to 1900-02-28; earlier serials are
/// shifted by one day to account for it. Negative or non-finite serials give [`Value::Null`].
pub fn excel_serial_to_value(serial: f64) -> Value {
    if !serial.is_finite() || serial < 0.0 {
        return Value::Null;
    }
    let mut days = serial.trunc() as i64;
    let mut micros = ((serial - serial.trunc()) * MICROS_PER_DAY).round() as i64;
    if micros >= MICROS_PER_DAY as i64 {
        days += 1;
        micros = 0;
    }

    let Some(time) =
        NaiveTime::from_num_seconds_from_midnight_opt((micros / 1_000_000) as u32, (micros % 1_000_000) as u32 * 1_000)
    else {
        return Value::Null;
    };
    if days == 0 {
        return Value::Time(time);
    }
    if days < 60 {
        days += 1;
    }

    let date = NaiveDate::from_ymd_opt(1899, 12, 30)
        .zip(TimeDelta::try_days(days))
        .and_then(|(epoch, offset)| epoch.checked_add_signed(offset));
    let Some(date) = date else {
        return Value::Null;
    };
    if micros == 0 {
        Value::Date(date)
    } else {
        Value::DateTime(date.and_time(time))
    }
}

/// Build a table from rows of cells. The first row with a non-empty cell is the header; rows
/// before it are skipped, shorter rows are padded with empty cells and empty header cells get a
/// generated `column{n}` name.
pub fn table_from_cells<I>(rows: I) -> TableResult<Table>
where
    I: IntoIterator<Item = Vec<SheetCell>>,
{
    let mut rows = rows.into_iter().skip_while(|row| row.iter().all(SheetCell::is_empty));
    let header_row = rows.next().ok_or_else(|| TableError::SchemaMismatch {
        message: "sheet has no non-empty rows (no header row found)".to_string(),
    })?;

    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell.to_text() {
            h if h.is_empty() => format!("column{}", i + 1),
            h => h,
        })
        .collect();
    let width = headers.len();

    let mut data: Vec<Vec<Value>> = vec![Vec::new(); width];
    for (offset, row) in rows.enumerate() {
        if let Some(extra) = row.iter().skip(width).position(|c| !c.is_empty()) {
            return Err(TableError::SchemaMismatch {
                message: format!(
                    "data row {}: value in column {} beyond the {width} header columns",
                    offset + 1,
                    width + extra + 1
                ),
            });
        }
        for (i, column) in data.iter_mut().enumerate() {
            let text = row.get(i).map(SheetCell::to_text).unwrap_or_default();
            column.push(Value::Str(text));
        }
    }

    let mut table = Table::new();
    for (header, values) in headers.into_iter().zip(data) {
        table.push_column(Column::with_data(header, DataType::Str, true, values)?);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::{excel_serial_to_value, table_from_cells, SheetCell};
    use crate::types::Value;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn serials_follow_the_1900_system() {
        assert_eq!(excel_serial_to_value(1.0), Value::Date(date(1900, 1, 1)));
        assert_eq!(excel_serial_to_value(59.0), Value::Date(date(1900, 2, 28)));
        assert_eq!(excel_serial_to_value(61.0), Value::Date(date(1900, 3, 1)));
        assert_eq!(excel_serial_to_value(43831.0), Value::Date(date(2020, 1, 1)));
    }

    #[test]
    fn fractional_serials_carry_time() {
        assert_eq!(
            excel_serial_to_value(43831.5),
            Value::DateTime(date(2020, 1, 1).and_hms_opt(12, 0, 0).unwrap())
        );
        assert_eq!(excel_serial_to_value(0.25), Value::Time(NaiveTime::from_hms_opt(6, 0, 0).unwrap()));
        assert_eq!(excel_serial_to_value(-1.0), Value::Null);
    }

    #[test]
    fn cells_become_text_columns() {
        let rows = vec![
            vec![SheetCell::Empty, SheetCell::Empty],
            vec![SheetCell::Text("id".into()), SheetCell::Text("when".into()), SheetCell::Empty],
            vec![SheetCell::Number(1.0), SheetCell::DateSerial(43831.0), SheetCell::Empty],
            vec![SheetCell::Number(2.5), SheetCell::Error("#N/A".into())],
        ];
        let t = table_from_cells(rows).unwrap();
        assert_eq!(t.headers(), vec!["id", "when", "column3"]);
        assert_eq!(
            t.rows().collect::<Vec<_>>(),
            vec![
                vec![Value::from("1"), Value::from("2020-01-01"), Value::from("")],
                vec![Value::from("2.5"), Value::from("#N/A"), Value::from("")],
            ]
        );
    }

    #[test]
    fn values_beyond_header_width_fail() {
        let rows = vec![
            vec![SheetCell::Text("a".into())],
            vec![SheetCell::Number(1.0), SheetCell::Boolean(true)],
        ];
        assert!(table_from_cells(rows).is_err());
        assert!(table_from_cells(Vec::<Vec<SheetCell>>::new()).is_err());
    }
}
