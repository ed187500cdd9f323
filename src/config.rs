//! Batch conversion settings.

use crate::table::TableConfig;

/// Default number of values read per channel per block
pub const DEFAULT_CHUNK_SIZE: usize = 65_536;

/// Configuration for a batch conversion
///
/// Memory per file is bounded by `chunk_size x channels in the widest group`;
/// the chunk size never changes the bytes written.
///
/// # Example
///
/// ```rust
/// use tdms_csv::config::ConversionConfig;
/// use tdms_csv::table::ExistingOutput;
///
/// let mut config = ConversionConfig::low_memory();
/// config.table.on_existing = ExistingOutput::Overwrite;
/// assert_eq!(config.chunk_size, 4_096);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionConfig {
    /// Values read per channel per block (at least 1)
    pub chunk_size: usize,

    /// Extension of container files to pick up, without the dot
    pub extension: String,

    /// Convert files on a worker pool (requires the `parallel` feature)
    pub parallel: bool,

    /// Worker count for parallel mode; `None` uses one per CPU
    pub workers: Option<usize>,

    /// Output table settings
    pub table: TableConfig,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            extension: "tdms".to_string(),
            parallel: false,
            workers: None,
            table: TableConfig::default(),
        }
    }
}

impl ConversionConfig {
    /// Small blocks for memory-constrained machines
    pub fn low_memory() -> Self {
        Self {
            chunk_size: 4_096,
            ..Self::default()
        }
    }

    /// Large blocks and parallel conversion where available
    pub fn high_throughput() -> Self {
        Self {
            chunk_size: 1_048_576,
            parallel: cfg!(feature = "parallel"),
            ..Self::default()
        }
    }
}
