//! Delimited-text export.

use std::io::Write;

use super::Table;
use crate::error::TableResult;
use crate::types::Value;

impl Table {
    /// Write a header record and one record per row. Nulls are written as empty fields and
    /// other values with their display form.
    pub fn write_csv<W: Write>(&self, writer: W, delimiter: u8) -> TableResult<()> {
        let mut wtr = csv::WriterBuilder::new().delimiter(delimiter).from_writer(writer);
        wtr.write_record(self.headers())?;
        for row in self.rows() {
            wtr.write_record(row.iter().map(field))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Comma-separated rendering of the whole table.
    pub fn to_csv_string(&self) -> TableResult<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf, b',')?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::table::Table;
    use crate::types::{DataType, Value};

    #[test]
    fn csv_quotes_fields_and_blanks_nulls() {
        let mut t = Table::new();
        t.add_column("name", DataType::Str, false, vec![Value::from("a,b"), Value::from("c")]).unwrap();
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        t.add_column("when", DataType::Date, true, vec![Value::Date(day), Value::Null])
            .unwrap();
        assert_eq!(t.to_csv_string().unwrap(), "name,when\n\"a,b\",2020-01-01\nc,\n");
    }

    #[test]
    fn custom_delimiter() {
        let mut t = Table::new();
        t.add_column("x", DataType::Int, false, vec![Value::Int(1)]).unwrap();
        t.add_column("y", DataType::Bool, false, vec![Value::Bool(true)]).unwrap();
        let mut buf = Vec::new();
        t.write_csv(&mut buf, b';').unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "x;y\n1;true\n");
    }
}
