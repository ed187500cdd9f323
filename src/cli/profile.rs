//! Conversion profiles for common use cases.
//!
//! Profiles trade memory for speed by choosing how many values are read per
//! channel at a time. They never change the bytes written.

use std::fmt;
use std::str::FromStr;

use tdms_csv::config::ConversionConfig;

/// Conversion profiles for common use cases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Profile {
    /// Small blocks for memory-constrained machines.
    ///
    /// - Chunk size: 4,096 values per channel
    LowMemory,

    /// Balance between memory and speed (default).
    ///
    /// - Chunk size: 65,536 values per channel
    #[default]
    Balanced,

    /// Large blocks and a worker pool when the binary supports it.
    ///
    /// - Chunk size: 1,048,576 values per channel
    /// - Parallel: on with the `parallel` feature
    Throughput,
}

impl Profile {
    /// Returns the number of values read per channel per block.
    pub fn chunk_size(&self) -> usize {
        match self {
            Profile::LowMemory => 4_096,
            Profile::Balanced => 65_536,
            Profile::Throughput => 1_048_576,
        }
    }

    /// Returns whether files are converted in parallel.
    pub fn parallel(&self) -> bool {
        matches!(self, Profile::Throughput) && cfg!(feature = "parallel")
    }

    /// Library settings for this profile.
    pub fn conversion_config(&self) -> ConversionConfig {
        ConversionConfig {
            chunk_size: self.chunk_size(),
            parallel: self.parallel(),
            ..ConversionConfig::default()
        }
    }

    /// Returns all available profile names.
    pub fn variants() -> &'static [&'static str] {
        &["low-memory", "balanced", "throughput"]
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::LowMemory => write!(f, "low-memory"),
            Profile::Balanced => write!(f, "balanced"),
            Profile::Throughput => write!(f, "throughput"),
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low-memory" | "lowmemory" | "small" => Ok(Profile::LowMemory),
            "balanced" | "default" => Ok(Profile::Balanced),
            "throughput" | "fast" => Ok(Profile::Throughput),
            _ => Err(format!(
                "Unknown profile '{}'. Valid options: {}",
                s,
                Profile::variants().join(", ")
            )),
        }
    }
}
