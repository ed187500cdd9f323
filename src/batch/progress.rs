use std::path::Path;

use crate::converter::FileResult;
use crate::tdms::TdmsError;

/// Progress notification emitted once per completed unit of work
#[derive(Debug, Clone, Copy)]
pub enum ProgressEvent<'a> {
    /// A container file was converted (successfully or not)
    FileConverted {
        /// Zero-based completion order
        index: usize,
        /// The file's result
        result: &'a FileResult,
    },
    /// A directory could not be listed and was skipped
    DirectoryUnreadable {
        /// The directory
        path: &'a Path,
        /// Why it was skipped
        reason: &'a str,
    },
}

impl<'a> ProgressEvent<'a> {
    /// Path the event refers to
    pub fn path(&self) -> &'a Path {
        match *self {
            ProgressEvent::FileConverted { result, .. } => result.path(),
            ProgressEvent::DirectoryUnreadable { path, .. } => path,
        }
    }

    /// Groups exported by the file, zero for other events
    pub fn groups_succeeded(&self) -> usize {
        match *self {
            ProgressEvent::FileConverted { result, .. } => result.groups_succeeded(),
            ProgressEvent::DirectoryUnreadable { .. } => 0,
        }
    }

    /// Groups that failed in the file, zero for other events
    pub fn groups_failed(&self) -> usize {
        match *self {
            ProgressEvent::FileConverted { result, .. } => result.groups_failed(),
            ProgressEvent::DirectoryUnreadable { .. } => 0,
        }
    }

    /// The file's open error, if it could not be opened
    pub fn open_error(&self) -> Option<&'a TdmsError> {
        match *self {
            ProgressEvent::FileConverted { result, .. } => result.open_error(),
            ProgressEvent::DirectoryUnreadable { .. } => None,
        }
    }
}
