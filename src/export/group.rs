use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use crate::table::{TableConfig, TableError, TableWriter};
use crate::tdms::{Group, TdmsFile, Values};

use super::error::{GroupExportError, NamingCollisionError};

/// Result of exporting one group
#[derive(Debug)]
pub enum OutcomeStatus {
    /// The table was committed
    Success,
    /// Nothing was written for the group
    Failed(GroupExportError),
}

/// Outcome of one (file, group) export
#[derive(Debug)]
pub struct ConversionOutcome {
    /// Group name as stored in the source file
    pub group: String,
    /// Planned output path (exists only on success)
    pub output_path: PathBuf,
    /// Data rows written
    pub rows_written: u64,
    /// Success or the reason for failure
    pub status: OutcomeStatus,
}

impl ConversionOutcome {
    /// Outcome for a group that failed before any export was attempted
    pub fn failed(group: impl Into<String>, output_path: PathBuf, error: GroupExportError) -> Self {
        Self {
            group: group.into(),
            output_path,
            rows_written: 0,
            status: OutcomeStatus::Failed(error),
        }
    }

    /// Whether the group was exported
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success)
    }

    /// Failure reason, if any
    pub fn error(&self) -> Option<&GroupExportError> {
        match &self.status {
            OutcomeStatus::Success => None,
            OutcomeStatus::Failed(error) => Some(error),
        }
    }
}

/// Streams one group's channels into one table
///
/// Channels are read in lock-step, one block of at most `chunk_size` values
/// per channel at a time, so memory stays bounded by
/// `chunk_size x channel count` whatever the file size.
#[derive(Debug, Clone)]
pub struct GroupExporter<'a> {
    chunk_size: usize,
    table: &'a TableConfig,
}

impl<'a> GroupExporter<'a> {
    /// Exporter reading `chunk_size` values per channel per block
    pub fn new(chunk_size: usize, table: &'a TableConfig) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            table,
        }
    }

    /// Export `group` of `file` to `destination`
    pub fn export<R: Read + Seek>(
        &self,
        file: &TdmsFile<R>,
        group: &Group,
        destination: &Path,
    ) -> ConversionOutcome {
        match self.write_table(file, group, destination) {
            Ok(rows_written) => ConversionOutcome {
                group: group.name().to_string(),
                output_path: destination.to_path_buf(),
                rows_written,
                status: OutcomeStatus::Success,
            },
            Err(error) => ConversionOutcome::failed(group.name(), destination.to_path_buf(), error),
        }
    }

    fn write_table<R: Read + Seek>(
        &self,
        file: &TdmsFile<R>,
        group: &Group,
        destination: &Path,
    ) -> Result<u64, GroupExportError> {
        let mut table = TableWriter::create(destination, self.table).map_err(existing_as_collision)?;

        let channels = group.channels();
        let names: Vec<&str> = channels.iter().map(|c| c.name()).collect();
        table.write_header(&names)?;

        let mut readers: Vec<_> = channels
            .iter()
            .map(|channel| channel.read_chunks(file, self.chunk_size))
            .collect();

        loop {
            let mut block = Vec::with_capacity(readers.len());
            let mut exhausted = true;
            for (channel, reader) in channels.iter().zip(readers.iter_mut()) {
                match reader.next() {
                    Some(Ok(values)) => {
                        exhausted = false;
                        block.push(values);
                    }
                    Some(Err(source)) => {
                        return Err(GroupExportError::ChannelRead {
                            channel: channel.name().to_string(),
                            source,
                        })
                    }
                    None => block.push(Values::empty(channel.data_type())),
                }
            }
            if exhausted {
                break;
            }
            table.write_block(&block)?;
        }

        let stats = table.finish().map_err(existing_as_collision)?;
        Ok(stats.rows_written)
    }
}

fn existing_as_collision(error: TableError) -> GroupExportError {
    match error {
        TableError::AlreadyExists(path) => NamingCollisionError::AlreadyExists(path).into(),
        other => other.into(),
    }
}
