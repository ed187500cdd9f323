//! # tdms-csv
//!
//! Command-line driver for batch TDMS to CSV conversion.
//!
//! ## Usage
//!
//! ```bash
//! # Convert every .tdms file under a directory
//! tdms-csv convert recordings/
//!
//! # Low-memory preset, tab-separated output, JSON report
//! tdms-csv convert recordings/ --profile low-memory --tsv --report report.json
//!
//! # Show the groups and channels of one file
//! tdms-csv inspect recordings/run1.tdms
//!
//! # Write a small tree of sample files to try the converter on
//! tdms-csv demo sample/
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
