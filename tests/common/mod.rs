//! Shared helpers for the integration tests
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tdms_csv::tdms::{ChannelData, TdmsWriter, Values};
use walkdir::WalkDir;

/// Write a TDMS file with one segment per entry of `segments`
pub fn write_tdms(path: &Path, segments: &[Vec<ChannelData>]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut writer = TdmsWriter::create(path).unwrap();
    for segment in segments {
        writer.write_segment(segment).unwrap();
    }
    writer.finish().unwrap();
}

/// A healthy file with one `f64` channel per group
pub fn write_groups(path: &Path, groups: &[&str]) {
    let segment: Vec<ChannelData> = groups
        .iter()
        .map(|group| ChannelData::new(*group, "value", Values::F64(vec![1.0, 2.0, 3.0])))
        .collect();
    write_tdms(path, &[segment]);
}

/// Bytes that no TDMS reader accepts
pub fn write_garbage(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"this is not a TDMS file, just some text").unwrap();
}

/// One string channel `/'g'/'s'` whose segment declares 2^60 bytes of raw
/// data while the file ends right after its metadata
pub fn write_oversized_strings(path: &Path) {
    let total = 1u64 << 60;
    let object = "/'g'/'s'";
    let mut meta = Vec::new();
    meta.extend_from_slice(&1u32.to_le_bytes());
    meta.extend_from_slice(&(object.len() as u32).to_le_bytes());
    meta.extend_from_slice(object.as_bytes());
    meta.extend_from_slice(&28u32.to_le_bytes());
    meta.extend_from_slice(&0x20u32.to_le_bytes());
    meta.extend_from_slice(&1u32.to_le_bytes());
    meta.extend_from_slice(&1u64.to_le_bytes());
    meta.extend_from_slice(&total.to_le_bytes());
    meta.extend_from_slice(&0u32.to_le_bytes());

    let toc: u32 = (1 << 1) | (1 << 2) | (1 << 3);
    let mut bytes = b"TDSm".to_vec();
    bytes.extend_from_slice(&toc.to_le_bytes());
    bytes.extend_from_slice(&4713u32.to_le_bytes());
    bytes.extend_from_slice(&(meta.len() as u64 + total).to_le_bytes());
    bytes.extend_from_slice(&(meta.len() as u64).to_le_bytes());
    bytes.extend_from_slice(&meta);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, bytes).unwrap();
}

/// Parse a written table into rows of cells, header included
pub fn read_table(path: &Path) -> Vec<Vec<String>> {
    read_table_with(path, b',')
}

/// Like [`read_table`] with another delimiter
pub fn read_table_with(path: &Path, delimiter: u8) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|record| record.unwrap().iter().map(str::to_string).collect())
        .collect()
}

/// Contents of every file under `root`, keyed by path
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let bytes = fs::read(entry.path()).unwrap();
            (entry.into_path(), bytes)
        })
        .collect()
}

/// Snapshot restricted to files with `extension`
pub fn snapshot_ext(root: &Path, extension: &str) -> BTreeMap<PathBuf, Vec<u8>> {
    snapshot(root)
        .into_iter()
        .filter(|(path, _)| path.extension().map_or(false, |e| e == extension))
        .collect()
}

/// Files left behind by interrupted table writes
pub fn partial_files(root: &Path) -> Vec<PathBuf> {
    snapshot(root)
        .into_keys()
        .filter(|path| {
            path.file_name()
                .map_or(false, |name| name.to_string_lossy().ends_with(".partial"))
        })
        .collect()
}
