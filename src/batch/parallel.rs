//! Worker-pool conversion.
//!
//! Workers convert whole files and send the results to the calling thread,
//! which alone reports progress and updates the summary.

use std::path::PathBuf;

use crossbeam_channel::unbounded;
use log::{debug, warn};
use rayon::prelude::*;

use crate::config::ConversionConfig;
use crate::converter::{FileConverter, FileResult, OutputClaims};
use crate::scanner::{ScanEvent, ScanIter};

use super::progress::ProgressEvent;
use super::summary::BatchSummary;

enum Completed {
    File(FileResult),
    Unreadable { path: PathBuf, reason: String },
}

pub(super) fn run<F>(
    scan: ScanIter,
    config: &ConversionConfig,
    claims: &OutputClaims,
    summary: &mut BatchSummary,
    on_progress: &mut F,
) where
    F: FnMut(&ProgressEvent<'_>),
{
    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.unwrap_or(0))
        .build()
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            warn!("Cannot build worker pool ({}); using the global pool", e);
            None
        }
    };
    let converter = FileConverter::new(config, claims);
    let (sender, receiver) = unbounded();

    std::thread::scope(|scope| {
        scope.spawn(move || {
            let work = move || {
                scan.par_bridge().for_each_with(sender, |sender, event| {
                    let completed = match event {
                        ScanEvent::Candidate(path) => Completed::File(converter.convert(&path)),
                        ScanEvent::Unreadable { path, reason } => {
                            Completed::Unreadable { path, reason }
                        }
                    };
                    // The receiver lives until every sender is gone
                    let _ = sender.send(completed);
                });
            };
            match pool {
                Some(pool) => {
                    debug!("Converting on {} workers", pool.current_num_threads());
                    pool.install(work)
                }
                None => work(),
            }
        });

        for completed in receiver {
            match completed {
                Completed::File(result) => {
                    on_progress(&ProgressEvent::FileConverted {
                        index: summary.files_scanned(),
                        result: &result,
                    });
                    summary.record_file(&result);
                }
                Completed::Unreadable { path, reason } => {
                    on_progress(&ProgressEvent::DirectoryUnreadable {
                        path: &path,
                        reason: &reason,
                    });
                    summary.record_unreadable(path, reason);
                }
            }
        }
    });
}
