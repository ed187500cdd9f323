//! # Group Exporter
//!
//! Drives one group's channels through a [`TableWriter`](crate::table::TableWriter)
//! and plans the output file names of a source file's groups.

mod error;
mod group;
mod naming;


pub use error::{GroupExportError, NamingCollisionError};
pub use group::{ConversionOutcome, GroupExporter, OutcomeStatus};
pub use naming::{sanitize_group_name, OutputNamer};
