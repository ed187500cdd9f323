use serde::{Deserialize, Serialize};

/// What to do when a destination file already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExistingOutput {
    /// Leave the existing file untouched and report the group as failed
    #[default]
    Fail,
    /// Replace the existing file once the new one is complete
    Overwrite,
}

/// Record terminator of written rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTerminator {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    Crlf,
}

/// Configuration for the table writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    /// Field delimiter
    pub delimiter: u8,

    /// Row terminator
    pub terminator: LineTerminator,

    /// Prepend a zero-based row number column with an empty header
    pub index_column: bool,

    /// Policy for destinations that already exist
    pub on_existing: ExistingOutput,

    /// Output file extension, without the dot
    pub extension: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            terminator: LineTerminator::Lf,
            index_column: false,
            on_existing: ExistingOutput::Fail,
            extension: "csv".to_string(),
        }
    }
}

impl TableConfig {
    /// Tab-separated output with a `.tsv` extension
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            extension: "tsv".to_string(),
            ..Self::default()
        }
    }

    /// Comma-separated output with CRLF line endings, as spreadsheet tools expect
    pub fn spreadsheet() -> Self {
        Self {
            terminator: LineTerminator::Crlf,
            ..Self::default()
        }
    }
}
