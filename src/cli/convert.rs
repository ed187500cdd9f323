use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::path::PathBuf;

use tdms_csv::batch::{BatchConverter, ProgressEvent};
use tdms_csv::config::ConversionConfig;
use tdms_csv::table::{ExistingOutput, LineTerminator, TableConfig};

use super::config::{parse_delimiter, Config};
use super::{Profile, TableArgs};

/// Parsed flags of the convert command
pub struct ConvertArgs {
    pub root: PathBuf,
    pub profile: Profile,
    pub config: Option<PathBuf>,
    pub parallel: bool,
    pub workers: Option<usize>,
    pub report: Option<PathBuf>,
    pub table: TableArgs,
    pub extension: Option<String>,
    pub chunk_size: Option<usize>,
}

/// Convert every TDMS file under a directory
pub fn run(args: ConvertArgs) -> Result<()> {
    let config = build_config(&args)?;

    info!("tdms-csv - TDMS to CSV");
    info!("======================");
    info!("Root: {}", args.root.display());
    info!("Profile: {}", args.profile);
    info!("Chunk size: {} values per channel", config.chunk_size);
    info!(
        "Output: .{} (delimiter {:?}, existing files: {:?})",
        config.table.extension, config.table.delimiter as char, config.table.on_existing
    );
    if config.parallel {
        info!(
            "Parallel conversion: {} workers",
            config
                .workers
                .map(|n| n.to_string())
                .unwrap_or_else(|| "auto".to_string())
        );
    }

    let converter = BatchConverter::with_config(config);
    let summary = converter
        .run_with_progress(&args.root, report_progress)
        .context("Conversion failed")?;

    #[cfg(feature = "colorized_output")]
    {
        println!("{}", summary.format_colored());
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        println!("{}", summary);
    }

    if let Some(report) = &args.report {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialize report")?;
        std::fs::write(report, json)
            .with_context(|| format!("Failed to write report: {}", report.display()))?;
        info!("Report written to {}", report.display());
    }

    // Exit with error code if anything failed
    if summary.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

/// Merge settings: profile first, then the config file, then explicit flags
pub fn build_config(args: &ConvertArgs) -> Result<ConversionConfig> {
    let mut config = args.profile.conversion_config();

    if let Some(path) = &args.config {
        info!("Loading config from {}", path.display());
        Config::from_file(path)?.conversion.apply(&mut config)?;
    }

    if args.table.tsv {
        let tsv = TableConfig::tsv();
        config.table.delimiter = tsv.delimiter;
        config.table.extension = tsv.extension;
    }
    if let Some(delimiter) = &args.table.delimiter {
        config.table.delimiter = parse_delimiter(delimiter)?;
    }
    if args.table.crlf {
        config.table.terminator = LineTerminator::Crlf;
    }
    if args.table.overwrite {
        config.table.on_existing = ExistingOutput::Overwrite;
    }
    if args.table.index_column {
        config.table.index_column = true;
    }
    if let Some(extension) = &args.extension {
        config.extension = extension.trim_start_matches('.').to_string();
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    if args.parallel {
        config.parallel = true;
    }
    if let Some(workers) = args.workers {
        config.workers = Some(workers);
    }

    if config.chunk_size == 0 {
        bail!("Chunk size must be at least 1");
    }
    if config.workers == Some(0) {
        bail!("Worker count must be at least 1");
    }
    if config.extension.is_empty() {
        bail!("Container extension must not be empty");
    }
    if config.extension.eq_ignore_ascii_case(&config.table.extension) {
        bail!(
            "Output extension '.{}' equals the container extension",
            config.table.extension
        );
    }

    Ok(config)
}

fn report_progress(event: &ProgressEvent<'_>) {
    match event {
        ProgressEvent::FileConverted { index, result } => {
            if let Some(error) = result.open_error() {
                warn!("[{}] {}: {}", index + 1, result.path().display(), error);
            } else {
                info!(
                    "[{}] {}: {} groups exported, {} failed",
                    index + 1,
                    result.path().display(),
                    result.groups_succeeded(),
                    result.groups_failed()
                );
            }
        }
        ProgressEvent::DirectoryUnreadable { path, reason } => {
            warn!("Skipped {}: {}", path.display(), reason);
        }
    }
}
