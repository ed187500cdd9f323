//! # tdms-csv - Batch TDMS to CSV Conversion
//!
//! `tdms-csv` walks a directory tree, finds every NI TDMS measurement file and
//! exports each channel group of each file to its own delimited text table
//! next to the source.
//!
//! ## Key Features
//!
//! - **Streaming Reader**: TDMS files are indexed once and channel values are
//!   read in bounded chunks, so files larger than memory convert fine.
//!
//! - **Atomic Outputs**: Every table is written to a temporary file and renamed
//!   into place, so a failed group never leaves a partial file behind.
//!
//! - **Failure Isolation**: An unreadable file or a broken group is recorded
//!   in the run summary; the rest of the tree is still converted.
//!
//! - **Deterministic Names**: `{stem}_{group}.csv`, with sanitized group names
//!   and `_2`, `_3` suffixes when two groups map to the same file.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tdms_csv::batch::convert_directory;
//! use tdms_csv::config::ConversionConfig;
//!
//! let summary = convert_directory("recordings", &ConversionConfig::default(), None)?;
//! println!("{}", summary);
//! for failure in summary.failures() {
//!     eprintln!("{}: {}", failure.path.display(), failure.reason);
//! }
//! # Ok::<(), tdms_csv::batch::PathError>(())
//! ```
//!
//! ## Output Layout
//!
//! ```text
//! recordings/
//! ├── run1.tdms
//! ├── run1_Voltage.csv      # one table per group
//! ├── run1_Temperature.csv
//! └── bench/
//!     ├── cal.tdms
//!     └── cal_Group_1.csv   # "Group/1" sanitized
//! ```
//!
//! The header row holds the channel names in file order. Channels of different
//! lengths are padded with empty cells at the end.
//!
//! ## Architecture
//!
//! - [`scanner`]: lazy, sorted, recursive discovery of container files
//! - [`tdms`]: TDMS segment index, chunked channel reader and a small encoder
//! - [`table`]: streaming, atomically committed CSV writer
//! - [`export`]: output naming and per-group export
//! - [`converter`]: per-file conversion with per-group outcomes
//! - [`batch`]: orchestration, progress events and the run summary
//! - [`config`]: conversion settings and presets

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod batch;
pub mod config;
pub mod converter;
pub mod export;
pub mod scanner;
pub mod table;
pub mod tdms;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::batch::{
        convert_directory, BatchConverter, BatchSummary, FailureKind, FailureRecord, PathError,
        ProgressEvent,
    };
    pub use crate::config::{ConversionConfig, DEFAULT_CHUNK_SIZE};
    pub use crate::converter::{
        ConversionOutcome, FileConverter, FileKind, FileResult, FileStatus, OutcomeStatus,
        OutputClaims,
    };
    pub use crate::export::{GroupExportError, GroupExporter, NamingCollisionError, OutputNamer};
    pub use crate::scanner::{DirectoryScanner, ScanEvent};
    pub use crate::table::{
        ExistingOutput, LineTerminator, TableConfig, TableError, TableStats, TableWriter,
    };
    pub use crate::tdms::{
        Channel, ChannelData, DataType, Group, Property, PropertyValue, TdmsError, TdmsFile,
        TdmsWriter, Timestamp, Values,
    };
}
