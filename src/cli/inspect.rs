use anyhow::{Context, Result};
use std::path::PathBuf;

use tdms_csv::tdms::{Property, TdmsFile};

/// Display information about a TDMS file
pub fn run(file: PathBuf) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let tdms = TdmsFile::open(&file)
        .with_context(|| format!("Failed to read TDMS file: {}", file.display()))?;

    println!("TDMS File Information");
    println!("=====================");
    println!("File: {}", file.display());
    println!();

    println!("File Statistics:");
    println!("  Segments: {}", tdms.segment_count());
    println!("  Groups: {}", tdms.groups().len());
    println!(
        "  Channels: {}",
        tdms.groups().iter().map(|g| g.channels().len()).sum::<usize>()
    );
    println!();

    if !tdms.properties().is_empty() {
        println!("File Properties:");
        print_properties(tdms.properties(), "  ");
        println!();
    }

    for group in tdms.groups() {
        println!(
            "Group '{}' ({} channels, {} rows):",
            group.name(),
            group.channels().len(),
            group.max_len()
        );
        print_properties(group.properties(), "    ");
        for (i, channel) in group.channels().iter().enumerate() {
            println!(
                "  {:3}. {} ({}, {} values)",
                i + 1,
                channel.name(),
                channel.data_type().name(),
                channel.len()
            );
            print_properties(channel.properties(), "         ");
        }
        println!();
    }

    Ok(())
}

fn print_properties(properties: &[Property], indent: &str) {
    for property in properties {
        let value = property.value.to_string();
        if value.len() > 100 {
            let cut = (0..=100).rev().find(|&i| value.is_char_boundary(i)).unwrap_or(0);
            println!(
                "{}{}: {}... ({} bytes)",
                indent,
                property.name,
                &value[..cut],
                value.len()
            );
        } else {
            println!("{}{}: {}", indent, property.name, value);
        }
    }
}
