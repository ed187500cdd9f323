use std::path::PathBuf;

/// Errors that can occur while writing a table
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the CSV encoder
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Destination exists and the configuration forbids replacing it
    #[error("Output already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// A block does not have one entry per column
    #[error("Expected {expected} columns, got {found}")]
    ColumnMismatch {
        /// Columns declared in the header
        expected: usize,
        /// Columns in the offending block
        found: usize,
    },

    /// Operations called out of order
    #[error("Invalid writer state: {0}")]
    InvalidState(&'static str),
}
