/// Errors that can occur while opening or reading a TDMS file
#[derive(Debug, thiserror::Error)]
pub enum TdmsError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Segment does not start with the `TDSm` tag
    #[error("Not a TDMS segment at byte {offset}: found tag {tag:?}")]
    InvalidTag {
        /// Absolute position of the segment
        offset: u64,
        /// The four bytes found instead of the tag
        tag: [u8; 4],
    },

    /// The file is a `.tdms_index` companion, not a data file
    #[error("File is a TDMS index file, not a data file")]
    IndexFile,

    /// The file ends before a structure it declares
    #[error("Truncated {what} at byte {offset}")]
    Truncated {
        /// What was being read when the file ended
        what: String,
        /// Absolute position where the read started
        offset: u64,
    },

    /// A data type code that is not part of the TDMS format
    #[error("Unknown data type code 0x{0:08X}")]
    UnknownDataType(u32),

    /// Malformed object path in segment metadata
    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    /// Segment metadata that cannot be interpreted
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Channel data stored in a layout this reader does not decode
    #[error("Unsupported data in channel '{channel}': {reason}")]
    Unsupported {
        /// Channel name
        channel: String,
        /// What is unsupported
        reason: String,
    },

    /// Raw data whose internal structure is inconsistent
    #[error("Corrupt raw data in channel '{channel}': {reason}")]
    CorruptData {
        /// Channel name
        channel: String,
        /// Description of the inconsistency
        reason: String,
    },
}

impl TdmsError {
    pub(crate) fn truncated(what: impl Into<String>, offset: u64) -> Self {
        Self::Truncated {
            what: what.into(),
            offset,
        }
    }

    /// Map an unexpected EOF into [`TdmsError::Truncated`], keep other I/O errors as is.
    pub(crate) fn from_read(error: std::io::Error, what: impl Into<String>, offset: u64) -> Self {
        if error.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::truncated(what, offset)
        } else {
            Self::IoError(error)
        }
    }
}
