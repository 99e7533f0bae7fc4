use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{NaiveDate, NaiveTime};
use tablekit::column::Column;
use tablekit::ingestion::json::{read_json_tables, write_json_tables};
use tablekit::ingestion::{file_reader, IngestionOptions};
use tablekit::table::Table;
use tablekit::types::{DataType, Value};

fn tmp_file(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tablekit-{name}-{nanos}.json"))
}

fn every_type() -> Table {
    let day = NaiveDate::from_ymd_opt(2003, 9, 25).unwrap();
    let noon = NaiveTime::from_hms_micro_opt(12, 0, 1, 250).unwrap();
    let mut t = Table::new();
    t.add_column("i", DataType::Int, true, vec![Value::Int(-4), Value::Null]).unwrap();
    t.add_column("f", DataType::Float, false, vec![Value::Float(0.5), Value::Float(1e300)]).unwrap();
    t.add_column("b", DataType::Bool, true, vec![Value::Bool(true), Value::Null]).unwrap();
    t.add_column("s", DataType::Str, false, vec!["tab\there".into(), "".into()]).unwrap();
    t.add_column("d", DataType::Date, false, vec![Value::Date(day), Value::Date(day.succ_opt().unwrap())])
        .unwrap();
    t.add_column("t", DataType::Time, true, vec![Value::Null, Value::Time(noon)]).unwrap();
    t.add_column("dt", DataType::DateTime, false, vec![Value::DateTime(day.and_time(noon)); 2]).unwrap();
    t.metadata_mut().insert("rev".to_string(), 3.into());
    t
}

#[test]
fn files_round_trip_one_and_many_tables() {
    let path = tmp_file("single");
    write_json_tables(&path, &[every_type()]).unwrap();
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.trim_start().starts_with('{'));
    assert_eq!(read_json_tables(&path).unwrap(), vec![every_type()]);

    let many = vec![every_type(), Table::new()];
    write_json_tables(&path, &many).unwrap();
    let opts = IngestionOptions::default();
    assert_eq!(file_reader(&path, &opts).unwrap(), many);

    let _ = std::fs::remove_file(path);
}

#[test]
fn legacy_encoding_of_booleans_and_nulls() {
    let column = Column::with_data("b", DataType::Bool, true, vec![Value::Bool(false), Value::Null]).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&column.to_json().unwrap()).unwrap();
    let data: serde_json::Value = serde_json::from_str(doc["data"].as_str().unwrap()).unwrap();
    assert_eq!(data, serde_json::json!(["False", "null"]));
}

#[test]
fn malformed_documents_are_errors() {
    let path = tmp_file("bad");
    std::fs::write(&path, "[1, 2]").unwrap();
    assert!(read_json_tables(&path).is_err());

    std::fs::write(&path, r#"{"metadata": {}, "columns": ["{\"header\": \"x\"}"]}"#).unwrap();
    assert!(read_json_tables(&path).is_err());

    let _ = std::fs::remove_file(path);
}
