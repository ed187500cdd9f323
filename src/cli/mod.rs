use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod config;
mod convert;
mod demo;
mod inspect;
mod profile;

pub use profile::Profile;

/// tdms-csv - Batch converter from TDMS files to per-group CSV tables
#[derive(Parser)]
#[command(name = "tdms-csv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Conversion profile for trading memory against speed.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ProfileArg {
    /// Small read blocks for memory-constrained machines
    LowMemory,
    /// Balance between memory use and speed
    #[default]
    Balanced,
    /// Large read blocks, parallel when available
    Throughput,
}

impl From<ProfileArg> for Profile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::LowMemory => Profile::LowMemory,
            ProfileArg::Balanced => Profile::Balanced,
            ProfileArg::Throughput => Profile::Throughput,
        }
    }
}

/// Table layout and policy flags of the convert command.
#[derive(clap::Args, Debug, Default)]
pub struct TableArgs {
    /// Replace existing output files instead of reporting a collision
    #[arg(long)]
    pub overwrite: bool,

    /// Prepend a zero-based row number column
    #[arg(long)]
    pub index_column: bool,

    /// Field delimiter (single ASCII character or 'tab')
    #[arg(short = 'd', long, value_name = "CHAR", conflicts_with = "tsv")]
    pub delimiter: Option<String>,

    /// Write tab-separated .tsv files
    #[arg(long)]
    pub tsv: bool,

    /// End rows with CRLF instead of LF
    #[arg(long)]
    pub crlf: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every TDMS file under a directory to CSV tables
    Convert {
        /// Root directory to scan recursively
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Conversion profile (low-memory, balanced, throughput)
        #[arg(short = 'p', long, default_value = "balanced", value_enum)]
        profile: ProfileArg,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Convert files in parallel (requires the parallel feature)
        #[arg(long)]
        parallel: bool,

        /// Number of worker threads for parallel conversion
        #[arg(short = 'j', long, value_name = "N")]
        workers: Option<usize>,

        /// Write a JSON summary of the run to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        #[command(flatten)]
        table: TableArgs,

        /// Container file extension to scan for
        #[arg(long, value_name = "EXT", hide = true)]
        extension: Option<String>,

        /// Values read per channel per block
        #[arg(short = 'c', long, hide = true)]
        chunk_size: Option<usize>,
    },

    /// Display groups, channels and properties of a TDMS file
    Inspect {
        /// Input TDMS file path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Write a directory of sample TDMS files for trying the converter
    Demo {
        /// Output directory
        #[arg(value_name = "DIR", default_value = "tdms_demo")]
        output: PathBuf,

        /// Samples per channel in the large sample file
        #[arg(short = 'n', long, default_value = "10000")]
        samples: usize,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert {
            root,
            profile,
            config,
            parallel,
            workers,
            report,
            table,
            extension,
            chunk_size,
        } => convert::run(convert::ConvertArgs {
            root,
            profile: Profile::from(profile),
            config,
            parallel,
            workers,
            report,
            table,
            extension,
            chunk_size,
        }),
        Commands::Inspect { file } => inspect::run(file),
        Commands::Demo { output, samples } => demo::run(output, samples),
    }
}
