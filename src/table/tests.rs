use super::*;
use crate::tdms::{Timestamp, Values};
use std::fs;
use tempfile::tempdir;

fn cell(values: &Values, row: usize) -> String {
    let mut out = String::new();
    format_cell(values, row, &mut out);
    out
}

#[test]
fn test_format_numbers_keep_source_precision() {
    assert_eq!(cell(&Values::F32(vec![0.1]), 0), "0.1");
    assert_eq!(cell(&Values::F64(vec![0.1]), 0), "0.1");
    assert_eq!(cell(&Values::F64(vec![2.0]), 0), "2.0");
    assert_eq!(cell(&Values::F64(vec![1e-300]), 0), "1e-300");
    assert_eq!(cell(&Values::I64(vec![i64::MIN]), 0), "-9223372036854775808");
    assert_eq!(cell(&Values::U64(vec![u64::MAX]), 0), "18446744073709551615");
    assert_eq!(cell(&Values::Bool(vec![true, false]), 1), "false");
}

#[test]
fn test_format_complex_and_timestamp() {
    assert_eq!(cell(&Values::ComplexF64(vec![(1.5, -2.0)]), 0), "1.5-2.0j");
    assert_eq!(cell(&Values::ComplexF32(vec![(0.0, 3.0)]), 0), "0.0+3.0j");
    assert_eq!(
        cell(&Values::Timestamp(vec![Timestamp::default()]), 0),
        "1904-01-01T00:00:00.000000000Z"
    );
}

#[test]
fn test_format_past_end_is_empty() {
    assert_eq!(cell(&Values::I32(vec![1]), 1), "");
}

#[test]
fn test_write_pads_shorter_columns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.csv");

    let mut writer = TableWriter::create(&path, &TableConfig::default()).unwrap();
    writer.write_header(&["a", "b"]).unwrap();
    let rows = writer
        .write_block(&[
            Values::I32(vec![1, 2, 3]),
            Values::String(vec!["x".into()]),
        ])
        .unwrap();
    assert_eq!(rows, 3);
    let stats = writer.finish().unwrap();

    assert_eq!(stats.rows_written, 3);
    assert_eq!(stats.columns, 2);
    assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n1,x\n2,\n3,\n");
}

#[test]
fn test_nothing_visible_until_finish() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.csv");

    let mut writer = TableWriter::create(&path, &TableConfig::default()).unwrap();
    writer.write_header(&["a"]).unwrap();
    writer.write_block(&[Values::F64(vec![1.0])]).unwrap();
    assert!(!path.exists());

    drop(writer);
    assert!(!path.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_quotes_embedded_delimiters() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.csv");

    let mut writer = TableWriter::create(&path, &TableConfig::default()).unwrap();
    writer.write_header(&["text", "n"]).unwrap();
    writer
        .write_block(&[
            Values::String(vec!["a,b".into(), "say \"hi\"".into(), "two\nlines".into()]),
            Values::U8(vec![1, 2, 3]),
        ])
        .unwrap();
    writer.finish().unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][0], "a,b");
    assert_eq!(&rows[1][0], "say \"hi\"");
    assert_eq!(&rows[2][0], "two\nlines");
    assert_eq!(&rows[2][1], "3");
}

#[test]
fn test_zero_columns_writes_empty_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.csv");

    let mut writer = TableWriter::create(&path, &TableConfig::default()).unwrap();
    writer.write_header::<&str>(&[]).unwrap();
    assert_eq!(writer.write_block(&[]).unwrap(), 0);
    writer.finish().unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"");
}

#[test]
fn test_header_only_when_no_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("header.csv");

    let mut writer = TableWriter::create(&path, &TableConfig::default()).unwrap();
    writer.write_header(&["x", "y"]).unwrap();
    writer.finish().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "x,y\n");
}

#[test]
fn test_index_column_and_crlf() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("indexed.csv");
    let config = TableConfig {
        index_column: true,
        ..TableConfig::spreadsheet()
    };

    let mut writer = TableWriter::create(&path, &config).unwrap();
    writer.write_header(&["v"]).unwrap();
    writer.write_block(&[Values::I16(vec![7, 8])]).unwrap();
    writer.write_block(&[Values::I16(vec![9])]).unwrap();
    writer.finish().unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        ",v\r\n0,7\r\n1,8\r\n2,9\r\n"
    );
}

#[test]
fn test_tsv_preset() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.tsv");

    let mut writer = TableWriter::create(&path, &TableConfig::tsv()).unwrap();
    writer.write_header(&["a", "b"]).unwrap();
    writer
        .write_block(&[Values::I8(vec![-1]), Values::I8(vec![1])])
        .unwrap();
    writer.finish().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "a\tb\n-1\t1\n");
}

#[test]
fn test_existing_output_fail_and_overwrite() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.csv");
    fs::write(&path, "previous").unwrap();

    assert!(matches!(
        TableWriter::create(&path, &TableConfig::default()),
        Err(TableError::AlreadyExists(p)) if p == path
    ));
    assert_eq!(fs::read_to_string(&path).unwrap(), "previous");

    let config = TableConfig {
        on_existing: ExistingOutput::Overwrite,
        ..TableConfig::default()
    };
    let mut writer = TableWriter::create(&path, &config).unwrap();
    writer.write_header(&["a"]).unwrap();
    writer.finish().unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "a\n");
}

#[test]
fn test_destination_created_while_writing_is_kept() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("race.csv");

    let mut writer = TableWriter::create(&path, &TableConfig::default()).unwrap();
    writer.write_header(&["a"]).unwrap();
    fs::write(&path, "other writer").unwrap();

    assert!(matches!(writer.finish(), Err(TableError::AlreadyExists(_))));
    assert_eq!(fs::read_to_string(&path).unwrap(), "other writer");
}

#[test]
fn test_misuse_is_reported() {
    let dir = tempdir().unwrap();
    let mut writer =
        TableWriter::create(dir.path().join("x.csv"), &TableConfig::default()).unwrap();

    assert!(matches!(
        writer.write_block(&[Values::I8(vec![1])]),
        Err(TableError::InvalidState(_))
    ));
    writer.write_header(&["a", "b"]).unwrap();
    assert!(matches!(
        writer.write_header(&["a"]),
        Err(TableError::InvalidState(_))
    ));
    assert!(matches!(
        writer.write_block(&[Values::I8(vec![1])]),
        Err(TableError::ColumnMismatch {
            expected: 2,
            found: 1
        })
    ));
}
