use std::path::Path;

use log::{info, warn};

use crate::config::ConversionConfig;
use crate::export::{
    ConversionOutcome, GroupExportError, GroupExporter, NamingCollisionError, OutputNamer,
};
use crate::tdms::TdmsFile;

use super::claims::OutputClaims;
use super::result::FileResult;

/// Converts one container file into one table per group
#[derive(Debug, Clone, Copy)]
pub struct FileConverter<'a> {
    config: &'a ConversionConfig,
    claims: &'a OutputClaims,
}

impl<'a> FileConverter<'a> {
    /// Converter sharing `claims` with the rest of the run
    pub fn new(config: &'a ConversionConfig, claims: &'a OutputClaims) -> Self {
        Self { config, claims }
    }

    /// Convert `path`
    ///
    /// Never fails as a whole: an open error or per-group failures are
    /// recorded in the returned [`FileResult`]. The container is closed
    /// before this returns.
    pub fn convert(&self, path: &Path) -> FileResult {
        let file = match TdmsFile::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!("Cannot open {}: {}", path.display(), e);
                return FileResult::open_failed(path.to_path_buf(), e);
            }
        };

        let mut namer = OutputNamer::for_source(path, &self.config.table.extension);
        let exporter = GroupExporter::new(self.config.chunk_size, &self.config.table);
        let mut outcomes = Vec::with_capacity(file.groups().len());

        for group in file.groups() {
            let outcome = match namer.next_path(group.name()) {
                Err(collision) => failed_naming(group.name(), collision),
                Ok(destination) if !self.claims.claim(&destination) => failed_naming(
                    group.name(),
                    NamingCollisionError::ClaimedInRun(destination),
                ),
                Ok(destination) => exporter.export(&file, group, &destination),
            };

            match outcome.error() {
                None => info!(
                    "Exported group '{}' of {} ({} rows) to {}",
                    outcome.group,
                    path.display(),
                    outcome.rows_written,
                    outcome.output_path.display()
                ),
                Some(e) => warn!(
                    "Failed to export group '{}' of {}: {}",
                    outcome.group,
                    path.display(),
                    e
                ),
            }
            outcomes.push(outcome);
        }

        drop(file);
        FileResult::opened(path.to_path_buf(), outcomes)
    }
}

fn failed_naming(group: &str, collision: NamingCollisionError) -> ConversionOutcome {
    let path = collision.path().to_path_buf();
    ConversionOutcome::failed(group, path, GroupExportError::Collision(collision))
}
