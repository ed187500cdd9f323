use std::fmt;
use std::path::{Path, PathBuf};

use csv::{Terminator, WriterBuilder};
use log::debug;
use tempfile::{Builder, NamedTempFile};

use crate::tdms::Values;

use super::config::{ExistingOutput, LineTerminator, TableConfig};
use super::error::TableError;
use super::format::format_cell;

/// Statistics from a committed table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStats {
    /// Final destination path
    pub path: PathBuf,
    /// Data rows written (header excluded)
    pub rows_written: u64,
    /// Value columns (index column excluded)
    pub columns: usize,
}

impl fmt::Display for TableStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} rows x {} columns to {}",
            self.rows_written,
            self.columns,
            self.path.display()
        )
    }
}

/// Streaming writer for one delimited text table
///
/// Rows go to a hidden temporary file next to the destination, which is
/// renamed over the destination by [`TableWriter::finish`]. Dropping the
/// writer without finishing removes the temporary file and leaves the
/// destination as it was.
pub struct TableWriter {
    destination: PathBuf,
    on_existing: ExistingOutput,
    index_column: bool,
    writer: csv::Writer<NamedTempFile>,
    columns: Option<usize>,
    rows_written: u64,
    record: Vec<String>,
}

impl TableWriter {
    /// Prepare a table at `path`
    ///
    /// Fails early with [`TableError::AlreadyExists`] when the destination
    /// exists under [`ExistingOutput::Fail`].
    pub fn create(path: impl AsRef<Path>, config: &TableConfig) -> Result<Self, TableError> {
        let destination = path.as_ref().to_path_buf();
        if config.on_existing == ExistingOutput::Fail && destination.exists() {
            return Err(TableError::AlreadyExists(destination));
        }

        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = Builder::new()
            .prefix(".tdms-csv-")
            .suffix(".partial")
            .tempfile_in(dir)?;

        let terminator = match config.terminator {
            LineTerminator::Lf => Terminator::Any(b'\n'),
            LineTerminator::Crlf => Terminator::CRLF,
        };
        let writer = WriterBuilder::new()
            .delimiter(config.delimiter)
            .terminator(terminator)
            .from_writer(temp);

        Ok(Self {
            destination,
            on_existing: config.on_existing,
            index_column: config.index_column,
            writer,
            columns: None,
            rows_written: 0,
            record: Vec::new(),
        })
    }

    /// Destination path the table is committed to
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Write the header row; must be called exactly once, before any block
    ///
    /// With zero columns no header is written and the file stays empty.
    pub fn write_header<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), TableError> {
        if self.columns.is_some() {
            return Err(TableError::InvalidState("header already written"));
        }
        self.columns = Some(names.len());
        if names.is_empty() {
            return Ok(());
        }

        self.record.clear();
        if self.index_column {
            self.record.push(String::new());
        }
        self.record
            .extend(names.iter().map(|name| name.as_ref().to_string()));
        self.writer.write_record(&self.record)?;
        Ok(())
    }

    /// Write one block of column values, one entry per column
    ///
    /// The block contributes as many rows as its longest column; shorter
    /// columns leave their remaining cells empty. Returns the rows written.
    pub fn write_block(&mut self, block: &[Values]) -> Result<u64, TableError> {
        let expected = self
            .columns
            .ok_or(TableError::InvalidState("header not written"))?;
        if block.len() != expected {
            return Err(TableError::ColumnMismatch {
                expected,
                found: block.len(),
            });
        }

        let rows = block.iter().map(Values::len).max().unwrap_or(0);
        for row in 0..rows {
            self.record.resize(block.len() + usize::from(self.index_column), String::new());
            let mut cells = self.record.iter_mut();
            if self.index_column {
                if let Some(cell) = cells.next() {
                    cell.clear();
                    cell.push_str(&(self.rows_written + row as u64).to_string());
                }
            }
            for (values, cell) in block.iter().zip(cells) {
                cell.clear();
                format_cell(values, row, cell);
            }
            self.writer.write_record(&self.record)?;
        }

        self.rows_written += rows as u64;
        Ok(rows as u64)
    }

    /// Flush and atomically move the table onto its destination
    pub fn finish(self) -> Result<TableStats, TableError> {
        let columns = self.columns.unwrap_or(0);
        let temp = self
            .writer
            .into_inner()
            .map_err(|e| {
                TableError::IoError(std::io::Error::new(e.error().kind(), e.error().to_string()))
            })?;
        temp.as_file().sync_all()?;
        set_output_permissions(&temp)?;

        match self.on_existing {
            ExistingOutput::Overwrite => {
                temp.persist(&self.destination).map_err(|e| e.error)?;
            }
            ExistingOutput::Fail => {
                temp.persist_noclobber(&self.destination).map_err(|e| {
                    if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                        TableError::AlreadyExists(self.destination.clone())
                    } else {
                        TableError::IoError(e.error)
                    }
                })?;
            }
        }

        debug!(
            "Committed {} rows to {}",
            self.rows_written,
            self.destination.display()
        );
        Ok(TableStats {
            path: self.destination,
            rows_written: self.rows_written,
            columns,
        })
    }
}

/// Temporary files are created owner-only; outputs get ordinary file permissions
#[cfg(unix)]
fn set_output_permissions(temp: &NamedTempFile) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    temp.as_file()
        .set_permissions(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_output_permissions(_temp: &NamedTempFile) -> std::io::Result<()> {
    Ok(())
}
