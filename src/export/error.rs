use std::path::PathBuf;

use crate::table::TableError;
use crate::tdms::TdmsError;

/// An output path that cannot be used for a group
#[derive(Debug, thiserror::Error)]
pub enum NamingCollisionError {
    /// The output could replace a source file
    #[error("Output path has the extension of source files: {}", .0.display())]
    SourceFile(PathBuf),

    /// Another group in this run already produced this path
    #[error("Output path already claimed in this run: {}", .0.display())]
    ClaimedInRun(PathBuf),

    /// A file exists at the output path and may not be replaced
    #[error("Output file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
}

/// Errors that fail the export of one group
#[derive(Debug, thiserror::Error)]
pub enum GroupExportError {
    /// Reading a channel's values failed
    #[error("Failed to read channel '{channel}': {source}")]
    ChannelRead {
        /// Channel name
        channel: String,
        /// Underlying reader error
        #[source]
        source: TdmsError,
    },

    /// Writing the table failed
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// The output path could not be used
    #[error("Naming collision: {0}")]
    Collision(#[from] NamingCollisionError),
}

impl NamingCollisionError {
    /// The contested output path
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::SourceFile(path) | Self::ClaimedInRun(path) | Self::AlreadyExists(path) => path,
        }
    }
}
