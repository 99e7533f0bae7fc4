use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use tablekit::ingestion::text::read_text;
use tablekit::ingestion::{file_reader, find_format, IngestionFormat, IngestionOptions};
use tablekit::types::{DataType, Value};
use tablekit::TableError;

fn tmp_file(name: &str, ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tablekit-{name}-{nanos}.{ext}"))
}

fn date(y: i32, m: u32, d: u32) -> Value {
    Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

#[test]
fn file_reader_infers_column_types() {
    let tables = file_reader("tests/fixtures/abc.csv", &IngestionOptions::default()).unwrap();
    assert_eq!(tables.len(), 1);

    let t = &tables[0];
    assert_eq!(t.len(), 2);
    assert_eq!(t.headers(), vec!["A", "B", "C"]);
    assert_eq!(t.column("A").unwrap().datatype(), DataType::Int);
    assert_eq!(t.column("B").unwrap().datatype(), DataType::Str);
    assert_eq!(t.column("C").unwrap().datatype(), DataType::Date);
    assert_eq!(
        t.row(1),
        Some(vec![Value::Int(2), Value::from("world"), date(2020, 2, 1)])
    );
}

#[test]
fn file_reader_detects_separator_quotes_and_nulls() {
    let tables = file_reader("tests/fixtures/people_semicolon.txt", &IngestionOptions::default()).unwrap();
    let t = &tables[0];

    assert_eq!(t.len(), 3);
    let types: Vec<DataType> = t.columns().map(|c| c.datatype()).collect();
    assert_eq!(
        types,
        vec![DataType::Int, DataType::Str, DataType::Float, DataType::Bool, DataType::Date]
    );
    assert_eq!(t.column("name").unwrap().get(1), Some(&Value::from("Hopper; Grace")));
    assert_eq!(t.column("joined").unwrap().get(1), Some(&date(2021, 2, 15)));

    let score = t.column("score").unwrap();
    assert!(score.allow_empty());
    assert_eq!(score.values(), &[Value::Float(98.5), Value::Float(87.25), Value::Null]);
    assert!(!t.column("id").unwrap().allow_empty());
}

#[test]
fn explicit_separator_overrides_detection() {
    let path = tmp_file("pipes", "psv");
    std::fs::write(&path, "a|b\n1,5|x\n2,5|y\n").unwrap();

    let opts = IngestionOptions {
        separator: Some('|'),
        ..Default::default()
    };
    let tables = file_reader(&path, &opts).unwrap();
    let a = tables[0].column("a").unwrap();
    assert_eq!(a.datatype(), DataType::Float);
    assert_eq!(a.values(), &[Value::Float(1.5), Value::Float(2.5)]);

    let _ = std::fs::remove_file(path);
}

#[test]
fn harmonize_can_be_turned_off() {
    let opts = IngestionOptions {
        format: Some(IngestionFormat::Text),
        harmonize: false,
        ..Default::default()
    };
    let mut tables = file_reader("tests/fixtures/abc.csv", &opts).unwrap();
    let t = &mut tables[0];
    assert!(t.columns().all(|c| c.datatype() == DataType::Str));
    assert_eq!(t.column("A").unwrap().get(0), Some(&Value::from("1")));

    find_format(t).unwrap();
    assert_eq!(t.column("A").unwrap().datatype(), DataType::Int);
}

#[test]
fn ragged_rows_abort_the_file() {
    let err = file_reader("tests/fixtures/ragged.csv", &IngestionOptions::default()).unwrap_err();
    match err {
        TableError::SchemaMismatch { message } => assert!(message.contains("line 4"), "{message}"),
        other => panic!("expected SchemaMismatch, got {other:?}"),
    }
}

#[test]
fn windows_1252_text_is_decoded() {
    let path = tmp_file("latin", "csv");
    // "café" with 0xE9 for é, which is not valid UTF-8.
    std::fs::write(&path, b"name,n\ncaf\xe9,1\n").unwrap();

    let tables = file_reader(&path, &IngestionOptions::default()).unwrap();
    assert_eq!(tables[0].column("name").unwrap().get(0), Some(&Value::from("café")));

    let _ = std::fs::remove_file(path);
}

#[test]
fn unknown_extension_is_rejected() {
    let err = file_reader("tests/fixtures/data.parquet", &IngestionOptions::default()).unwrap_err();
    assert!(matches!(err, TableError::SchemaMismatch { .. }));
}

#[test]
fn duplicate_and_empty_headers_are_renamed() {
    let t = read_text("x,,x\n1,2,3\n", Some(',')).unwrap();
    assert_eq!(t.headers(), vec!["x", "column2", "x_1"]);
}
