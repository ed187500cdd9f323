//! # Chunked Table Writer
//!
//! Writes column blocks to a delimited text file without holding the whole
//! table in memory. Output is committed atomically: the destination either
//! holds a complete table or is left as it was.

mod config;
mod error;
mod format;
mod writer;

#[cfg(test)]
mod tests;

pub use config::{ExistingOutput, LineTerminator, TableConfig};
pub use error::TableError;
pub use format::format_cell;
pub use writer::{TableStats, TableWriter};
