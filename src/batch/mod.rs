//! # Batch Orchestrator
//!
//! Walks a directory tree, converts every container file it finds and folds
//! the per-file results into a [`BatchSummary`]. Only an unusable root
//! aborts a run; every other failure is recorded and the run goes on.
//!
//! ```rust,no_run
//! use tdms_csv::batch::{BatchConverter, ProgressEvent};
//!
//! let summary = BatchConverter::new().run_with_progress("recordings", |event| {
//!     if let ProgressEvent::FileConverted { index, result } = event {
//!         println!("{:>4} {}", index + 1, result.path().display());
//!     }
//! })?;
//! println!("{}", summary);
//! # Ok::<(), tdms_csv::batch::PathError>(())
//! ```

#[cfg(feature = "parallel")]
mod parallel;
mod progress;
mod summary;


use std::path::Path;

use log::{info, warn};

use crate::config::ConversionConfig;
use crate::converter::{FileConverter, OutputClaims};
use crate::scanner::{DirectoryScanner, ScanEvent, ScanIter};

pub use crate::scanner::PathError;
pub use progress::ProgressEvent;
pub use summary::{BatchSummary, FailureKind, FailureRecord};

/// Converts every container file under a root directory
#[derive(Debug, Clone, Default)]
pub struct BatchConverter {
    config: ConversionConfig,
}

impl BatchConverter {
    /// Converter with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Converter with explicit settings
    pub fn with_config(config: ConversionConfig) -> Self {
        Self { config }
    }

    /// Active settings
    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert everything under `root`
    pub fn run(&self, root: impl AsRef<Path>) -> Result<BatchSummary, PathError> {
        self.run_with_progress(root, |_| {})
    }

    /// Convert everything under `root`, reporting each finished file
    ///
    /// `on_progress` is always called from the calling thread, once per file
    /// and once per unreadable directory, before the item is added to the
    /// summary.
    pub fn run_with_progress<F>(
        &self,
        root: impl AsRef<Path>,
        mut on_progress: F,
    ) -> Result<BatchSummary, PathError>
    where
        F: FnMut(&ProgressEvent<'_>),
    {
        let root = root.as_ref();
        let scan = DirectoryScanner::new(root)
            .with_extension(self.config.extension.as_str())
            .scan()?;
        let claims = OutputClaims::new();
        let mut summary = BatchSummary::new(root);

        info!("Converting .{} files under {}", self.config.extension, root.display());

        if self.config.parallel {
            #[cfg(feature = "parallel")]
            {
                parallel::run(scan, &self.config, &claims, &mut summary, &mut on_progress);
                summary.sort();
                log_totals(&summary);
                return Ok(summary);
            }
            #[cfg(not(feature = "parallel"))]
            warn!("Parallel conversion requested but the `parallel` feature is disabled; converting sequentially");
        }

        run_sequential(scan, &self.config, &claims, &mut summary, &mut on_progress);
        log_totals(&summary);
        Ok(summary)
    }
}

/// Convert everything under `root` with `config`
///
/// Shorthand for [`BatchConverter::run_with_progress`] with an optional
/// progress callback.
pub fn convert_directory(
    root: impl AsRef<Path>,
    config: &ConversionConfig,
    on_progress: Option<&mut dyn FnMut(&ProgressEvent<'_>)>,
) -> Result<BatchSummary, PathError> {
    let converter = BatchConverter::with_config(config.clone());
    match on_progress {
        Some(callback) => converter.run_with_progress(root, callback),
        None => converter.run(root),
    }
}

fn run_sequential<F>(
    scan: ScanIter,
    config: &ConversionConfig,
    claims: &OutputClaims,
    summary: &mut BatchSummary,
    on_progress: &mut F,
) where
    F: FnMut(&ProgressEvent<'_>),
{
    let converter = FileConverter::new(config, claims);
    for event in scan {
        match event {
            ScanEvent::Candidate(path) => {
                let result = converter.convert(&path);
                on_progress(&ProgressEvent::FileConverted {
                    index: summary.files_scanned(),
                    result: &result,
                });
                summary.record_file(&result);
            }
            ScanEvent::Unreadable { path, reason } => {
                on_progress(&ProgressEvent::DirectoryUnreadable {
                    path: &path,
                    reason: &reason,
                });
                summary.record_unreadable(path, reason);
            }
        }
    }
}

fn log_totals(summary: &BatchSummary) {
    info!(
        "Converted {} of {} files ({} groups exported, {} failed)",
        summary.files_succeeded(),
        summary.files_scanned(),
        summary.groups_exported(),
        summary.groups_failed()
    );
    if summary.has_failures() {
        warn!("{} failures recorded", summary.failures().len());
    }
}
