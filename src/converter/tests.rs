use super::*;
use crate::config::ConversionConfig;
use crate::export::{GroupExportError, NamingCollisionError};
use crate::tdms::{ChannelData, TdmsError, TdmsWriter, Values};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_tdms(path: &Path, channels: &[ChannelData]) {
    let mut writer = TdmsWriter::create(path).unwrap();
    writer.write_segment(channels).unwrap();
    writer.finish().unwrap();
}

#[test]
fn test_convert_exports_every_group() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("run.tdms");
    write_tdms(
        &source,
        &[
            ChannelData::new("A", "x", Values::I32(vec![1, 2])),
            ChannelData::new("B", "y", Values::F32(vec![0.25])),
        ],
    );

    let config = ConversionConfig::default();
    let claims = OutputClaims::new();
    let result = FileConverter::new(&config, &claims).convert(&source);

    assert!(result.open_error().is_none());
    assert_eq!(result.kind(), FileKind::Succeeded);
    assert_eq!(result.groups_succeeded(), 2);
    assert_eq!(result.groups_failed(), 0);
    assert_eq!(claims.len(), 2);

    let outputs: Vec<&Path> = result.output_paths().collect();
    assert_eq!(
        outputs,
        vec![dir.path().join("run_A.csv"), dir.path().join("run_B.csv")]
    );
    assert_eq!(fs::read_to_string(&outputs[0]).unwrap(), "x\n1\n2\n");
    assert_eq!(fs::read_to_string(&outputs[1]).unwrap(), "y\n0.25\n");
}

#[test]
fn test_open_failure_attempts_no_groups() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("broken.tdms");
    fs::write(&source, b"definitely not a TDMS file, just text").unwrap();

    let config = ConversionConfig::default();
    let claims = OutputClaims::new();
    let result = FileConverter::new(&config, &claims).convert(&source);

    assert!(matches!(
        result.open_error(),
        Some(TdmsError::InvalidTag { .. })
    ));
    assert!(result.outcomes().is_empty());
    assert_eq!(result.kind(), FileKind::Failed);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_file_without_groups_is_empty() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("nothing.tdms");
    write_tdms(&source, &[]);

    let config = ConversionConfig::default();
    let claims = OutputClaims::new();
    let result = FileConverter::new(&config, &claims).convert(&source);

    assert!(matches!(result.status(), FileStatus::Opened));
    assert_eq!(result.kind(), FileKind::Empty);
}

#[test]
fn test_claimed_path_fails_later_group() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("f.tdms");
    write_tdms(&source, &[ChannelData::new("g", "x", Values::U8(vec![1]))]);

    let config = ConversionConfig::default();
    let claims = OutputClaims::new();
    assert!(claims.claim(&dir.path().join("F_G.CSV")));

    let result = FileConverter::new(&config, &claims).convert(&source);
    let outcome = &result.outcomes()[0];
    assert!(matches!(
        outcome.error(),
        Some(GroupExportError::Collision(NamingCollisionError::ClaimedInRun(_)))
    ));
    assert_eq!(result.kind(), FileKind::Failed);
    assert!(!dir.path().join("f_g.csv").exists());
}

#[test]
fn test_group_failure_does_not_stop_other_groups() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("mixed.tdms");
    let mut writer = TdmsWriter::new(Vec::new());
    writer
        .write_segment(&[
            ChannelData::new("good", "x", Values::I64(vec![1, 2, 3])),
            ChannelData::new("bad", "y", Values::I64(vec![4, 5, 6])),
        ])
        .unwrap();
    let mut bytes = writer.finish().unwrap();
    let len = bytes.len();
    bytes.truncate(len - 8);
    fs::write(&source, bytes).unwrap();

    let config = ConversionConfig::default();
    let claims = OutputClaims::new();
    let result = FileConverter::new(&config, &claims).convert(&source);

    assert_eq!(result.groups_succeeded(), 1);
    assert_eq!(result.groups_failed(), 1);
    assert_eq!(result.kind(), FileKind::Succeeded);
    assert!(dir.path().join("mixed_good.csv").exists());
    assert!(!dir.path().join("mixed_bad.csv").exists());
}

#[test]
fn test_source_is_not_modified() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("keep.tdms");
    write_tdms(&source, &[ChannelData::new("g", "x", Values::F64(vec![1.0]))]);
    let before = fs::read(&source).unwrap();

    let config = ConversionConfig::default();
    let claims = OutputClaims::new();
    FileConverter::new(&config, &claims).convert(&source);

    assert_eq!(fs::read(&source).unwrap(), before);
}
