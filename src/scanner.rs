//! # Directory Scanner
//!
//! Lazily walks a directory tree and yields container files by extension.
//! Entries are visited depth-first in file-name order; symbolic links are
//! never followed.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::WalkDir;

/// Errors about the scan root itself; the only errors that abort a run
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// The root does not exist
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The root exists but is not a directory
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The root cannot be read
    #[error("Cannot access {}: {source}", path.display())]
    Inaccessible {
        /// The root path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// One item produced by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A regular file with the container extension
    Candidate(PathBuf),
    /// A directory (or entry) that could not be read; the scan goes on
    Unreadable {
        /// The entry that failed
        path: PathBuf,
        /// Why it failed
        reason: String,
    },
}

/// Recursive scanner for container files under a root directory
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    root: PathBuf,
    extension: String,
}

impl DirectoryScanner {
    /// Scanner for `.tdms` files under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: "tdms".to_string(),
        }
    }

    /// Match files with `extension` instead (without the dot, any ASCII case)
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Root directory of the scan
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate the root and start the walk
    pub fn scan(&self) -> Result<ScanIter, PathError> {
        let metadata = fs::metadata(&self.root).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PathError::NotFound(self.root.clone()),
            _ => PathError::Inaccessible {
                path: self.root.clone(),
                source: e,
            },
        })?;
        if !metadata.is_dir() {
            return Err(PathError::NotADirectory(self.root.clone()));
        }
        fs::read_dir(&self.root).map_err(|source| PathError::Inaccessible {
            path: self.root.clone(),
            source,
        })?;

        debug!("Scanning {} for .{} files", self.root.display(), self.extension);
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        Ok(ScanIter {
            root: self.root.clone(),
            extension: self.extension.clone(),
            walker,
        })
    }
}

/// Lazy, one-pass sequence of [`ScanEvent`]s
pub struct ScanIter {
    root: PathBuf,
    extension: String,
    walker: walkdir::IntoIter,
}

impl ScanIter {
    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }
}

impl Iterator for ScanIter {
    type Item = ScanEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.walker.next()? {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.matches(entry.path()) {
                        return Some(ScanEvent::Candidate(entry.into_path()));
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    warn!("Skipping unreadable entry {}: {}", path.display(), e);
                    return Some(ScanEvent::Unreadable {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}
