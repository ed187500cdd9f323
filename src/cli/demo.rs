use anyhow::{Context, Result};
use chrono::{Duration, TimeZone, Utc};
use log::info;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tdms_csv::tdms::{ChannelData, Property, SegmentOptions, TdmsWriter, Timestamp, Values};

/// Samples per segment in the large demo file
const SEGMENT_SAMPLES: usize = 1_000;

/// Generate a demo tree of TDMS files
pub fn run(output: PathBuf, samples: usize) -> Result<()> {
    info!("tdms-csv - Demo Data Generator");
    info!("==============================");
    info!("Creating demo tree in {}", output.display());

    fs::create_dir_all(output.join("bench"))
        .with_context(|| format!("Failed to create {}", output.display()))?;
    fs::create_dir_all(output.join("archive"))
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let files = [
        write_healthy(&output.join("run_001.tdms"), samples)?,
        write_multi_length(&output.join("bench").join("calibration.tdms"))?,
        write_text(&output.join("bench").join("operator_log.tdms"))?,
        write_truncated(&output.join("archive").join("interrupted.tdms"))?,
    ];

    println!("Demo files written:");
    for file in &files {
        println!("  {}", file.display());
    }
    println!();
    println!("Convert them with:");
    println!("  tdms-csv convert {}", output.display());

    Ok(())
}

/// Two groups of sine and cosine waveforms over many segments
fn write_healthy(path: &Path, samples: usize) -> Result<PathBuf> {
    info!("Writing {} ({} samples per channel)", path.display(), samples);
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).single().unwrap_or_default();

    let mut writer = TdmsWriter::create(path).context("Failed to create demo file")?;
    writer.file_property("name", "run_001");
    writer.file_property("author", "tdms-csv demo");
    writer.declare_group(
        "Voltage",
        vec![
            Property::new("sample_rate_hz", 1000.0),
            Property::new("unit", "V"),
        ],
    );
    writer.declare_group("Temperature", vec![Property::new("unit", "degC")]);

    let mut written = 0;
    while written < samples {
        let n = SEGMENT_SAMPLES.min(samples - written);
        let range = written..written + n;
        let time: Vec<f64> = range.clone().map(|i| i as f64 / 1000.0).collect();
        let sine: Vec<f64> = time.iter().map(|t| (t * 50.0).sin()).collect();
        let cosine: Vec<f32> = time.iter().map(|t| (t * 50.0).cos() as f32).collect();
        let temperature: Vec<f64> = range.clone().map(|i| 21.5 + (i % 100) as f64 * 0.01).collect();
        let stamps: Vec<Timestamp> = range
            .map(|i| Timestamp::from_datetime(start + Duration::milliseconds(i as i64)))
            .collect();

        writer
            .write_segment(&[
                ChannelData::new("Voltage", "Time", Values::F64(time)),
                ChannelData::new("Voltage", "Sine", Values::F64(sine)),
                ChannelData::new("Voltage", "Cosine", Values::F32(cosine)),
                ChannelData::new("Temperature", "Probe A", Values::F64(temperature)),
                ChannelData::new("Temperature", "Acquired", Values::Timestamp(stamps)),
            ])
            .context("Failed to write segment")?;
        written += n;
    }

    writer.finish().context("Failed to flush demo file")?;
    Ok(path.to_path_buf())
}

/// Channels of different lengths, an interleaved segment and two group
/// names that sanitize to the same output name
fn write_multi_length(path: &Path) -> Result<PathBuf> {
    info!("Writing {}", path.display());
    let mut writer = TdmsWriter::create(path).context("Failed to create demo file")?;

    writer
        .write_segment_opts(
            &[
                ChannelData::new("Sweep/1", "Setpoint", Values::I32((0..8).collect()))
                    .with_property("unit", "mV"),
                ChannelData::new("Sweep/1", "Reading", Values::F64(vec![0.01; 8])),
            ],
            SegmentOptions {
                interleaved: true,
                big_endian: false,
            },
        )
        .context("Failed to write segment")?;
    writer
        .write_segment(&[ChannelData::new(
            "Sweep/1",
            "Setpoint",
            Values::I32((8..12).collect()),
        )])
        .context("Failed to write segment")?;
    writer
        .write_segment(&[
            ChannelData::new("Sweep:1", "Gain", Values::U16(vec![1, 2, 4, 8])),
            ChannelData::new("Sweep:1", "Locked", Values::Bool(vec![true, true, false])),
        ])
        .context("Failed to write segment")?;
    writer.declare_group("Unused", vec![Property::new("note", "group without channels")]);
    writer
        .write_segment(&[])
        .context("Failed to write segment")?;

    writer.finish().context("Failed to flush demo file")?;
    Ok(path.to_path_buf())
}

/// String channels with delimiters, quotes and line breaks
fn write_text(path: &Path) -> Result<PathBuf> {
    info!("Writing {}", path.display());
    let mut writer = TdmsWriter::create(path).context("Failed to create demo file")?;

    let notes = [
        "started",
        "valve A, then valve B",
        "operator said \"ok\"",
        "multi\nline",
        "",
    ];
    writer
        .write_segment(&[
            ChannelData::new("Log", "Step", Values::U32((1..=notes.len() as u32).collect())),
            ChannelData::new(
                "Log",
                "Note",
                Values::String(notes.iter().map(|s| s.to_string()).collect()),
            ),
        ])
        .context("Failed to write segment")?;

    writer.finish().context("Failed to flush demo file")?;
    Ok(path.to_path_buf())
}

/// A file whose last segment was cut off mid-write
fn write_truncated(path: &Path) -> Result<PathBuf> {
    info!("Writing {}", path.display());
    let mut writer = TdmsWriter::create(path).context("Failed to create demo file")?;
    for segment in 0..3 {
        let base = segment * 100;
        writer
            .write_segment(&[ChannelData::new(
                "Acquisition",
                "Counter",
                Values::U64((base..base + 100).collect()),
            )])
            .context("Failed to write segment")?;
    }
    writer.finish().context("Failed to flush demo file")?;

    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .context("Failed to reopen demo file")?;
    let len = file.metadata()?.len();
    file.set_len(len.saturating_sub(256))
        .context("Failed to truncate demo file")?;
    Ok(path.to_path_buf())
}
