//! TOML configuration file support for power users.
//!
//! Instead of passing many CLI flags, users can specify settings in a config file:
//!
//! ```toml
//! # tdms-csv.toml
//! [conversion]
//! chunk_size = 262144
//! extension = "tdms"
//! parallel = true
//! workers = 4
//! on_existing = "overwrite"
//! index_column = false
//! delimiter = ";"
//! line_terminator = "crlf"
//! output_extension = "csv"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use tdms_csv::config::ConversionConfig as LibraryConfig;
use tdms_csv::table::{ExistingOutput, LineTerminator};

/// Root configuration structure for tdms-csv.toml files.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Conversion-specific settings.
    #[serde(default)]
    pub conversion: ConversionConfig,
}

/// Configuration for the convert command.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionConfig {
    /// Values read per channel per block.
    pub chunk_size: Option<usize>,

    /// Container file extension to scan for.
    pub extension: Option<String>,

    /// Convert files in parallel (requires the parallel feature).
    pub parallel: Option<bool>,

    /// Worker count for parallel conversion.
    pub workers: Option<usize>,

    /// Policy for outputs that already exist.
    pub on_existing: Option<ExistingOutput>,

    /// Prepend a row number column.
    pub index_column: Option<bool>,

    /// Single-byte field delimiter.
    pub delimiter: Option<String>,

    /// Row terminator.
    pub line_terminator: Option<LineTerminator>,

    /// Extension of written tables.
    pub output_extension: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

impl ConversionConfig {
    /// Overlay the values present in the file onto `config`.
    pub fn apply(&self, config: &mut LibraryConfig) -> Result<()> {
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(extension) = &self.extension {
            config.extension = extension.trim_start_matches('.').to_string();
        }
        if let Some(parallel) = self.parallel {
            config.parallel = parallel;
        }
        if let Some(workers) = self.workers {
            config.workers = Some(workers);
        }
        if let Some(on_existing) = self.on_existing {
            config.table.on_existing = on_existing;
        }
        if let Some(index_column) = self.index_column {
            config.table.index_column = index_column;
        }
        if let Some(delimiter) = &self.delimiter {
            config.table.delimiter = parse_delimiter(delimiter)?;
        }
        if let Some(terminator) = self.line_terminator {
            config.table.terminator = terminator;
        }
        if let Some(extension) = &self.output_extension {
            config.table.extension = extension.trim_start_matches('.').to_string();
        }
        Ok(())
    }
}

/// Parse a delimiter given as a single ASCII character or the word `tab`.
pub fn parse_delimiter(value: &str) -> Result<u8> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() && *byte != b'"' && *byte != b'\n' && *byte != b'\r' => {
                Ok(*byte)
            }
            _ => bail!(
                "Invalid delimiter '{}': expected a single ASCII character or 'tab'",
                value
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [conversion]
            chunk_size = 262144
            extension = ".TDMS"
            parallel = true
            workers = 4
            on_existing = "overwrite"
            index_column = true
            delimiter = ";"
            line_terminator = "crlf"
            output_extension = "txt"
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.conversion.chunk_size, Some(262_144));
        assert_eq!(config.conversion.workers, Some(4));
        assert_eq!(config.conversion.on_existing, Some(ExistingOutput::Overwrite));
        assert_eq!(config.conversion.line_terminator, Some(LineTerminator::Crlf));

        let mut library = LibraryConfig::default();
        config.conversion.apply(&mut library).unwrap();
        assert_eq!(library.chunk_size, 262_144);
        assert_eq!(library.extension, "TDMS");
        assert!(library.parallel);
        assert_eq!(library.workers, Some(4));
        assert_eq!(library.table.on_existing, ExistingOutput::Overwrite);
        assert!(library.table.index_column);
        assert_eq!(library.table.delimiter, b';');
        assert_eq!(library.table.terminator, LineTerminator::Crlf);
        assert_eq!(library.table.extension, "txt");
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [conversion]
            chunk_size = 1024
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.conversion.chunk_size, Some(1024));
        assert_eq!(config.conversion.parallel, None);

        let mut library = LibraryConfig::low_memory();
        config.conversion.apply(&mut library).unwrap();
        assert_eq!(library.chunk_size, 1024);
        assert_eq!(library.table, LibraryConfig::default().table);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.conversion.chunk_size, None);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::from_str("[conversion]\ncompression_level = 3\n").is_err());
        assert!(Config::from_str("[conversion]\non_existing = \"skip\"\n").is_err());
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter("|").unwrap(), b'|');
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("\"").is_err());
        assert!(parse_delimiter("é").is_err());

        let bad = Config::from_str("[conversion]\ndelimiter = \"ab\"\n").unwrap();
        assert!(bad.conversion.apply(&mut LibraryConfig::default()).is_err());
    }
}
