use std::path::{Path, PathBuf};

use crate::export::ConversionOutcome;
use crate::tdms::TdmsError;

/// Whether the container could be opened
#[derive(Debug)]
pub enum FileStatus {
    /// Opened; see the per-group outcomes
    Opened,
    /// Opening failed; no group was attempted
    OpenFailed(TdmsError),
}

/// Classification of a converted file for the batch summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// At least one group was exported
    Succeeded,
    /// Open failed, or every group failed
    Failed,
    /// Opened, but the file has no groups
    Empty,
}

/// Everything that happened to one source file
#[derive(Debug)]
pub struct FileResult {
    path: PathBuf,
    status: FileStatus,
    outcomes: Vec<ConversionOutcome>,
}

impl FileResult {
    pub(crate) fn opened(path: PathBuf, outcomes: Vec<ConversionOutcome>) -> Self {
        Self {
            path,
            status: FileStatus::Opened,
            outcomes,
        }
    }

    pub(crate) fn open_failed(path: PathBuf, error: TdmsError) -> Self {
        Self {
            path,
            status: FileStatus::OpenFailed(error),
            outcomes: Vec::new(),
        }
    }

    /// Source file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File-level status
    pub fn status(&self) -> &FileStatus {
        &self.status
    }

    /// The open error, if opening failed
    pub fn open_error(&self) -> Option<&TdmsError> {
        match &self.status {
            FileStatus::Opened => None,
            FileStatus::OpenFailed(error) => Some(error),
        }
    }

    /// One outcome per group, in file order
    pub fn outcomes(&self) -> &[ConversionOutcome] {
        &self.outcomes
    }

    /// Groups exported
    pub fn groups_succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Groups that failed
    pub fn groups_failed(&self) -> usize {
        self.outcomes.len() - self.groups_succeeded()
    }

    /// Paths of the tables this file produced
    pub fn output_paths(&self) -> impl Iterator<Item = &Path> {
        self.outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(|o| o.output_path.as_path())
    }

    /// Summary classification
    pub fn kind(&self) -> FileKind {
        match self.status {
            FileStatus::OpenFailed(_) => FileKind::Failed,
            FileStatus::Opened if self.outcomes.is_empty() => FileKind::Empty,
            FileStatus::Opened if self.groups_succeeded() > 0 => FileKind::Succeeded,
            FileStatus::Opened => FileKind::Failed,
        }
    }
}
