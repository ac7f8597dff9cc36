//! Integration tests for exceltab

use exceltab::{
    CellValue, ColumnRule, ExcelError, HeaderMap, Reader, ReadResult, Rows, Writer,
};
use std::fs;
use tempfile::tempdir;

fn header() -> Vec<String> {
    vec!["Name".to_string(), "Balance".to_string(), "Active".to_string()]
}

fn body() -> Vec<Vec<CellValue>> {
    vec![
        vec![
            CellValue::from("Alice"),
            CellValue::Number(1250.75),
            CellValue::Bool(true),
        ],
        vec![
            CellValue::from("Bob"),
            CellValue::Number(-40.5),
            CellValue::Bool(false),
        ],
    ]
}

#[test]
fn test_write_and_read_roundtrip() {
    let dir = tempdir().unwrap();

    let path = Writer::new(dir.path())
        .filename("report")
        .header(header())
        .rows(body())
        .column_rule("Balance", ColumnRule::number())
        .save()
        .unwrap();
    assert!(path.ends_with("report.xlsx"));

    let result = Reader::open(dir.path(), "report").unwrap().read().unwrap();
    let rows = result.into_single().unwrap();
    let rows = rows.as_positional().unwrap();

    assert_eq!(rows.len(), 2); // header row split off
    assert_eq!(rows[0][0], CellValue::from("Alice"));
    assert_eq!(rows[0][1], CellValue::Number(1250.75));
    assert_eq!(rows[0][2], CellValue::Bool(true));
    assert_eq!(rows[1][1], CellValue::Number(-40.5));
}

#[test]
fn test_deterministic_output() {
    let dir = tempdir().unwrap();

    let write = |name: &str| {
        Writer::new(dir.path())
            .filename(name)
            .header(header())
            .rows(body())
            .column_rule("Balance", ColumnRule::number())
            .save()
            .unwrap()
    };

    let first = fs::read(write("a")).unwrap();
    let second = fs::read(write("b")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_header_projection() {
    let dir = tempdir().unwrap();

    Writer::new(dir.path())
        .filename("people")
        .header(header())
        .rows(body())
        .save()
        .unwrap();

    let mut map = HeaderMap::new();
    map.insert("Name".to_string(), "name".to_string());
    map.insert("Balance".to_string(), "balance".to_string());

    let result = Reader::open(dir.path(), "people")
        .unwrap()
        .column_to_key(map)
        .read()
        .unwrap();
    let rows = result.into_single().unwrap();
    let records = rows.as_keyed().unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("name"), Some(&CellValue::from("Alice")));
    assert_eq!(records[0].get("balance"), Some(&CellValue::Number(1250.75)));
    assert_eq!(records[0].len(), 2); // "Active" has no mapping entry
}

#[test]
fn test_multi_sheet_shape() {
    let dir = tempdir().unwrap();

    Writer::new(dir.path())
        .filename("multi")
        .header(vec!["A".to_string()])
        .sheet(vec![vec![CellValue::from("first")]])
        .sheet(vec![vec![CellValue::from("second")]])
        .save()
        .unwrap();

    let result = Reader::open(dir.path(), "multi").unwrap().read().unwrap();
    let sheets = result.into_multi().unwrap();

    // positional titles come back as normalized keys
    assert_eq!(
        sheets.keys().collect::<Vec<_>>(),
        vec!["Sheet_1", "Sheet_2"]
    );
    let first = sheets["Sheet_1"].as_positional().unwrap();
    assert_eq!(first[0][0], CellValue::from("first"));
}

#[test]
fn test_titled_sheets_key_by_normalized_title() {
    let dir = tempdir().unwrap();

    Writer::new(dir.path())
        .filename("foglio")
        .header(vec!["A".to_string()])
        .sheet_titled("Foglio 1", vec![vec![CellValue::from("uno")]])
        .sheet_titled("Foglio 2", vec![vec![CellValue::from("due")]])
        .save()
        .unwrap();

    let result = Reader::open(dir.path(), "foglio").unwrap().read().unwrap();
    let sheets = result.into_multi().unwrap();
    assert_eq!(
        sheets.keys().collect::<Vec<_>>(),
        vec!["Foglio_1", "Foglio_2"]
    );
}

#[test]
fn test_sheet_headers_pair_regardless_of_call_order() {
    let dir = tempdir().unwrap();

    // headers set before any sheet body is appended
    Writer::new(dir.path())
        .filename("per_sheet")
        .sheet_headers(vec![vec!["Left".to_string()], vec!["Right".to_string()]])
        .sheet(vec![vec![CellValue::from("l")]])
        .sheet(vec![vec![CellValue::from("r")]])
        .save()
        .unwrap();

    let result = Reader::open(dir.path(), "per_sheet")
        .unwrap()
        .has_header(false)
        .read()
        .unwrap();
    let sheets = result.into_multi().unwrap();

    let first = sheets["Sheet_1"].as_positional().unwrap();
    assert_eq!(first[0][0], CellValue::from("Left"));
    let second = sheets["Sheet_2"].as_positional().unwrap();
    assert_eq!(second[0][0], CellValue::from("Right"));
}

#[test]
fn test_single_sheet_read_is_flat() {
    let dir = tempdir().unwrap();

    Writer::new(dir.path())
        .filename("flat")
        .header(vec!["A".to_string()])
        .rows(vec![vec![CellValue::from("x")]])
        .save()
        .unwrap();

    let result = Reader::open(dir.path(), "flat").unwrap().read().unwrap();
    assert!(matches!(result, ReadResult::Single(Rows::Positional(_))));
}

#[test]
fn test_date_rule_reformats_on_write() {
    let dir = tempdir().unwrap();

    Writer::new(dir.path())
        .filename("dates")
        .header(vec!["Since".to_string()])
        .rows(vec![vec![CellValue::from("2021-01-01")]])
        .column_rule("Since", ColumnRule::date())
        .save()
        .unwrap();

    let result = Reader::open(dir.path(), "dates").unwrap().read().unwrap();
    let rows = result.into_single().unwrap();
    assert_eq!(
        rows.as_positional().unwrap()[0][0],
        CellValue::from("01/01/2021")
    );
}

#[test]
fn test_sheet_selection_order_and_unknown_name() {
    let dir = tempdir().unwrap();

    Writer::new(dir.path())
        .filename("pick")
        .header(vec!["A".to_string()])
        .sheet_titled("Data", vec![vec![CellValue::from("d")]])
        .sheet_titled("Extra", vec![vec![CellValue::from("e")]])
        .save()
        .unwrap();

    // reversed explicit selection comes back in requested order
    let result = Reader::open(dir.path(), "pick")
        .unwrap()
        .sheets(vec!["Extra".to_string(), "Data".to_string()])
        .read()
        .unwrap();
    let sheets = result.into_multi().unwrap();
    assert_eq!(sheets.keys().collect::<Vec<_>>(), vec!["Extra", "Data"]);

    let err = Reader::open(dir.path(), "pick")
        .unwrap()
        .sheets(vec!["Missing".to_string()])
        .read()
        .unwrap_err();
    assert!(matches!(err, ExcelError::Decode(_)));
}

#[test]
fn test_headerless_read_keeps_all_rows() {
    let dir = tempdir().unwrap();

    Writer::new(dir.path())
        .filename("raw")
        .rows(vec![
            vec![CellValue::from("r1")],
            vec![CellValue::from("r2")],
        ])
        .save()
        .unwrap();

    let result = Reader::open(dir.path(), "raw")
        .unwrap()
        .has_header(false)
        .read()
        .unwrap();
    let rows = result.into_single().unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_datetime_value_roundtrip() {
    use chrono::NaiveDate;
    let dir = tempdir().unwrap();

    let stamp = NaiveDate::from_ymd_opt(2021, 3, 14)
        .unwrap()
        .and_hms_opt(9, 26, 53)
        .unwrap();

    Writer::new(dir.path())
        .filename("stamps")
        .header(vec!["At".to_string()])
        .rows(vec![vec![CellValue::DateTime(stamp)]])
        .save()
        .unwrap();

    let result = Reader::open(dir.path(), "stamps").unwrap().read().unwrap();
    let rows = result.into_single().unwrap();
    assert_eq!(
        rows.as_positional().unwrap()[0][0],
        CellValue::DateTime(stamp)
    );
}

#[test]
fn test_missing_file_fails() {
    let dir = tempdir().unwrap();
    let err = Reader::open(dir.path(), "absent").unwrap_err();
    assert!(matches!(err, ExcelError::FileNotFound(_)));
}

#[test]
fn test_empty_body_write_fails() {
    let dir = tempdir().unwrap();
    let err = Writer::new(dir.path()).rows(Vec::new()).save().unwrap_err();
    assert!(matches!(err, ExcelError::EmptyDocument));
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none()); // nothing written
}

#[test]
fn test_directory_is_created() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("exports/q1");

    let path = Writer::new(&nested)
        .filename("out")
        .rows(vec![vec![CellValue::from("x")]])
        .save()
        .unwrap();

    assert!(path.is_file());
    assert!(path.starts_with(&nested));
}

#[test]
fn test_corrupt_file_fails_to_decode() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.xlsx");
    fs::write(&path, b"this is not a zip archive").unwrap();

    let err = Reader::from_path(&path).unwrap().read().unwrap_err();
    assert!(matches!(err, ExcelError::Decode(_)));
}
