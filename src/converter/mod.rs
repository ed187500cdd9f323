//! # File Converter
//!
//! Opens one container file, plans output names and exports every group,
//! isolating failures per group.

mod claims;
mod file;
mod result;

#[cfg(test)]
mod tests;

pub use crate::export::{ConversionOutcome, OutcomeStatus};
pub use claims::OutputClaims;
pub use file::FileConverter;
pub use result::{FileKind, FileResult, FileStatus};
