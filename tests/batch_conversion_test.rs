//! Integration tests for batch conversion
//!
//! These tests run the whole pipeline over temporary directory trees and
//! check the written tables with a CSV reader.

mod common;

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use common::{
    partial_files, read_table, read_table_with, snapshot, snapshot_ext, write_garbage,
    write_groups, write_oversized_strings, write_tdms,
};
use tdms_csv::batch::{
    convert_directory, BatchConverter, FailureKind, PathError, ProgressEvent,
};
use tdms_csv::config::ConversionConfig;
use tdms_csv::table::{ExistingOutput, TableConfig};
use tdms_csv::tdms::{ChannelData, Values};
use tempfile::tempdir;

/// One healthy and one corrupt file in sibling directories
#[test]
fn test_mixed_tree_scenario() {
    let dir = tempdir().unwrap();
    write_groups(&dir.path().join("a/x.tdms"), &["G1", "G2"]);
    write_garbage(&dir.path().join("b/y.tdms"));

    let summary = convert_directory(dir.path(), &ConversionConfig::default(), None).unwrap();

    assert_eq!(summary.files_scanned(), 2);
    assert_eq!(summary.files_succeeded(), 1);
    assert_eq!(summary.files_failed(), 1);
    assert_eq!(
        summary.outputs(),
        [dir.path().join("a/x_G1.csv"), dir.path().join("a/x_G2.csv")]
    );

    let failures = summary.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].path, dir.path().join("b/y.tdms"));
    assert_eq!(failures[0].kind, FailureKind::ContainerOpen);
    assert!(!failures[0].reason.is_empty());

    assert_eq!(
        read_table(&dir.path().join("a/x_G1.csv")),
        vec![vec!["value"], vec!["1.0"], vec!["2.0"], vec!["3.0"]]
    );
    assert!(!dir.path().join("b/y_G1.csv").exists());
}

#[test]
fn test_no_matching_files_is_not_an_error() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
    fs::write(dir.path().join("nested/readme.txt"), b"nothing here").unwrap();
    fs::write(dir.path().join("nested/data.tdms_index"), b"index").unwrap();

    let summary = BatchConverter::new().run(dir.path()).unwrap();
    assert_eq!(summary.files_scanned(), 0);
    assert!(summary.outputs().is_empty());
    assert!(!summary.has_failures());
}

#[test]
fn test_invalid_root_aborts() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");
    assert!(matches!(
        BatchConverter::new().run(&missing),
        Err(PathError::NotFound(path)) if path == missing
    ));

    let file = dir.path().join("single.tdms");
    write_groups(&file, &["g"]);
    assert!(matches!(
        BatchConverter::new().run(&file),
        Err(PathError::NotADirectory(_))
    ));
    assert!(!dir.path().join("single_g.csv").exists());
}

#[test]
fn test_sources_are_never_modified() {
    let dir = tempdir().unwrap();
    write_groups(&dir.path().join("one.tdms"), &["a", "b"]);
    write_groups(&dir.path().join("sub/Two.TDMS"), &["c"]);
    write_garbage(&dir.path().join("sub/bad.tdms"));
    let before = snapshot_ext(dir.path(), "tdms");
    let before_upper = snapshot_ext(dir.path(), "TDMS");

    let summary = BatchConverter::new().run(dir.path()).unwrap();
    assert_eq!(summary.files_scanned(), 3);
    assert_eq!(summary.groups_exported(), 3);

    assert_eq!(snapshot_ext(dir.path(), "tdms"), before);
    assert_eq!(snapshot_ext(dir.path(), "TDMS"), before_upper);
    assert!(dir.path().join("sub/Two_c.csv").exists());
}

#[test]
fn test_colliding_group_names_get_distinct_outputs() {
    let dir = tempdir().unwrap();
    write_groups(&dir.path().join("x.tdms"), &["a/b", "a:b", "A?B"]);

    let summary = BatchConverter::new().run(dir.path()).unwrap();
    assert!(!summary.has_failures());
    assert_eq!(
        summary.outputs(),
        [
            dir.path().join("x_a_b.csv"),
            dir.path().join("x_a_b_2.csv"),
            dir.path().join("x_A_B_3.csv"),
        ]
    );
}

#[test]
fn test_shorter_channels_are_padded() {
    let dir = tempdir().unwrap();
    write_tdms(
        &dir.path().join("pad.tdms"),
        &[vec![
            ChannelData::new("g", "empty", Values::F64(Vec::new())),
            ChannelData::new("g", "full", Values::I32((0..10).collect())),
        ]],
    );

    let summary = BatchConverter::new().run(dir.path()).unwrap();
    assert_eq!(summary.rows_written(), 10);

    let rows = read_table(&dir.path().join("pad_g.csv"));
    assert_eq!(rows.len(), 11);
    assert_eq!(rows[0], vec!["empty", "full"]);
    for (i, row) in rows[1..].iter().enumerate() {
        assert_eq!(row, &vec![String::new(), i.to_string()]);
    }
}

/// One group readable, the other with its data cut off
#[test]
fn test_corrupt_group_fails_alone() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("partly.tdms");
    write_tdms(
        &path,
        &[
            vec![ChannelData::new("good", "v", Values::F64(vec![1.5; 40]))],
            vec![ChannelData::new("bad", "v", Values::F64(vec![2.5; 40]))],
        ],
    );
    let file = OpenOptions::new().write(true).open(&path).unwrap();
    let len = file.metadata().unwrap().len();
    file.set_len(len - 100).unwrap();
    drop(file);

    for chunk_size in [1, 7, 40] {
        let config = ConversionConfig {
            chunk_size,
            table: TableConfig {
                on_existing: ExistingOutput::Overwrite,
                ..TableConfig::default()
            },
            ..ConversionConfig::default()
        };
        let summary = convert_directory(dir.path(), &config, None).unwrap();
        assert_eq!(summary.files_succeeded(), 1);
        assert_eq!(summary.groups_exported(), 1);
        assert_eq!(summary.groups_failed(), 1);
        assert_eq!(summary.failures()[0].group.as_deref(), Some("bad"));
        assert_eq!(summary.failures()[0].kind, FailureKind::GroupExport);
        assert!(!dir.path().join("partly_bad.csv").exists());
        assert_eq!(read_table(&dir.path().join("partly_good.csv")).len(), 41);
    }
    assert!(partial_files(dir.path()).is_empty());
}

/// A declared length far past the end of the file fails its group, not the run
#[test]
fn test_oversized_declared_length_fails_alone() {
    let dir = tempdir().unwrap();
    write_oversized_strings(&dir.path().join("a_huge.tdms"));
    write_groups(&dir.path().join("b_good.tdms"), &["G"]);

    let summary = convert_directory(dir.path(), &ConversionConfig::default(), None).unwrap();

    assert_eq!(summary.files_scanned(), 2);
    assert_eq!(summary.groups_exported(), 1);
    assert_eq!(summary.groups_failed(), 1);
    let failure = &summary.failures()[0];
    assert_eq!(failure.kind, FailureKind::GroupExport);
    assert_eq!(failure.group.as_deref(), Some("g"));
    assert_eq!(failure.path, dir.path().join("a_huge.tdms"));
    assert!(!dir.path().join("a_huge_g.csv").exists());
    assert_eq!(read_table(&dir.path().join("b_good_G.csv")).len(), 4);
    assert!(partial_files(dir.path()).is_empty());
}

#[test]
fn test_rerun_reports_collisions_and_keeps_outputs() {
    let dir = tempdir().unwrap();
    write_groups(&dir.path().join("x.tdms"), &["G1", "G2"]);

    let first = BatchConverter::new().run(dir.path()).unwrap();
    assert!(!first.has_failures());
    let outputs = snapshot_ext(dir.path(), "csv");
    assert_eq!(outputs.len(), 2);

    let second = BatchConverter::new().run(dir.path()).unwrap();
    assert_eq!(second.files_scanned(), 1);
    assert_eq!(second.files_failed(), 1);
    assert_eq!(second.groups_failed(), 2);
    assert!(second
        .failures()
        .iter()
        .all(|f| f.kind == FailureKind::NamingCollision));
    assert_eq!(snapshot_ext(dir.path(), "csv"), outputs);
    assert!(partial_files(dir.path()).is_empty());
}

#[test]
fn test_overwrite_replaces_outputs() {
    let dir = tempdir().unwrap();
    write_groups(&dir.path().join("x.tdms"), &["G1"]);
    let output = dir.path().join("x_G1.csv");
    fs::write(&output, b"stale").unwrap();

    let mut config = ConversionConfig::default();
    config.table.on_existing = ExistingOutput::Overwrite;
    let summary = convert_directory(dir.path(), &config, None).unwrap();

    assert!(!summary.has_failures());
    assert_eq!(read_table(&output).len(), 4);
}

#[test]
fn test_tsv_with_index_column() {
    let dir = tempdir().unwrap();
    write_tdms(
        &dir.path().join("t.tdms"),
        &[vec![
            ChannelData::new("g", "name", Values::String(vec!["a\tb".into(), "c".into()])),
            ChannelData::new("g", "ok", Values::Bool(vec![true, false])),
        ]],
    );

    let config = ConversionConfig {
        table: TableConfig {
            index_column: true,
            ..TableConfig::tsv()
        },
        ..ConversionConfig::default()
    };
    let summary = convert_directory(dir.path(), &config, None).unwrap();
    assert_eq!(summary.outputs(), [dir.path().join("t_g.tsv")]);

    let rows = read_table_with(&dir.path().join("t_g.tsv"), b'\t');
    assert_eq!(
        rows,
        vec![
            vec!["", "name", "ok"],
            vec!["0", "a\tb", "true"],
            vec!["1", "c", "false"],
        ]
    );
}

#[test]
fn test_progress_callback_sees_every_file() {
    let dir = tempdir().unwrap();
    for name in ["c.tdms", "a.tdms", "b/inner.tdms"] {
        write_groups(&dir.path().join(name), &["g"]);
    }

    let mut seen: Vec<PathBuf> = Vec::new();
    let mut callback = |event: &ProgressEvent<'_>| {
        seen.push(event.path().to_path_buf());
    };
    let on_progress: &mut dyn FnMut(&ProgressEvent<'_>) = &mut callback;
    let summary =
        convert_directory(dir.path(), &ConversionConfig::default(), Some(on_progress)).unwrap();

    assert_eq!(summary.files_scanned(), 3);
    assert_eq!(
        seen,
        vec![
            dir.path().join("a.tdms"),
            dir.path().join("b/inner.tdms"),
            dir.path().join("c.tdms"),
        ]
    );
}

#[test]
fn test_summary_report_serializes() {
    let dir = tempdir().unwrap();
    write_groups(&dir.path().join("x.tdms"), &["G1"]);
    write_garbage(&dir.path().join("y.tdms"));

    let summary = BatchConverter::new().run(dir.path()).unwrap();
    let json: serde_json::Value = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["files_scanned"], 2);
    assert_eq!(json["failures"][0]["kind"], "container_open");
    assert_eq!(json["outputs"].as_array().unwrap().len(), 1);

    let before = snapshot(dir.path());
    assert_eq!(before.len(), 3);
}
