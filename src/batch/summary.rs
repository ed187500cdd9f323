use std::fmt;
use std::path::{Path, PathBuf};

#[cfg(feature = "colorized_output")]
use console::style;
use serde::Serialize;

use crate::converter::{FileKind, FileResult};
use crate::export::GroupExportError;

/// Category of a recorded failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The container could not be opened
    ContainerOpen,
    /// A group could not be read or written
    GroupExport,
    /// A group's output path was unusable
    NamingCollision,
    /// A directory could not be listed
    UnreadableDirectory,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::ContainerOpen => "open",
            FailureKind::GroupExport => "export",
            FailureKind::NamingCollision => "collision",
            FailureKind::UnreadableDirectory => "scan",
        };
        f.write_str(name)
    }
}

/// One failure with enough context to act on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    /// Source file or directory
    pub path: PathBuf,
    /// Group name for group-level failures
    pub group: Option<String>,
    /// Failure category
    pub kind: FailureKind,
    /// Human-readable reason
    pub reason: String,
}

/// Aggregate result of a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    root: PathBuf,
    files_scanned: usize,
    files_succeeded: usize,
    files_failed: usize,
    files_empty: usize,
    groups_exported: usize,
    groups_failed: usize,
    rows_written: u64,
    outputs: Vec<PathBuf>,
    failures: Vec<FailureRecord>,
}

impl BatchSummary {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Fold one file's result into the totals
    pub(crate) fn record_file(&mut self, result: &FileResult) {
        self.files_scanned += 1;
        match result.kind() {
            FileKind::Succeeded => self.files_succeeded += 1,
            FileKind::Failed => self.files_failed += 1,
            FileKind::Empty => self.files_empty += 1,
        }

        if let Some(error) = result.open_error() {
            self.failures.push(FailureRecord {
                path: result.path().to_path_buf(),
                group: None,
                kind: FailureKind::ContainerOpen,
                reason: error.to_string(),
            });
        }

        for outcome in result.outcomes() {
            self.rows_written += outcome.rows_written;
            match outcome.error() {
                None => {
                    self.groups_exported += 1;
                    self.outputs.push(outcome.output_path.clone());
                }
                Some(error) => {
                    self.groups_failed += 1;
                    let kind = match error {
                        GroupExportError::Collision(_) => FailureKind::NamingCollision,
                        _ => FailureKind::GroupExport,
                    };
                    self.failures.push(FailureRecord {
                        path: result.path().to_path_buf(),
                        group: Some(outcome.group.clone()),
                        kind,
                        reason: error.to_string(),
                    });
                }
            }
        }
    }

    pub(crate) fn record_unreadable(&mut self, path: PathBuf, reason: String) {
        self.failures.push(FailureRecord {
            path,
            group: None,
            kind: FailureKind::UnreadableDirectory,
            reason,
        });
    }

    /// Order outputs and failures by path, for runs that finish files out of order
    pub(crate) fn sort(&mut self) {
        self.outputs.sort();
        self.failures
            .sort_by(|a, b| (&a.path, &a.group).cmp(&(&b.path, &b.group)));
    }

    /// Root directory of the run
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Container files found and attempted
    pub fn files_scanned(&self) -> usize {
        self.files_scanned
    }

    /// Files with at least one exported group
    pub fn files_succeeded(&self) -> usize {
        self.files_succeeded
    }

    /// Files that failed to open or whose every group failed
    pub fn files_failed(&self) -> usize {
        self.files_failed
    }

    /// Files that opened but contain no groups
    pub fn files_empty(&self) -> usize {
        self.files_empty
    }

    /// Groups written to a table
    pub fn groups_exported(&self) -> usize {
        self.groups_exported
    }

    /// Groups that failed
    pub fn groups_failed(&self) -> usize {
        self.groups_failed
    }

    /// Data rows written across all tables
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Every table created by the run
    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    /// Every recorded failure
    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    /// Whether anything failed, including unreadable directories
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Format the summary with colors (requires console feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            use console::Emoji;

            static OK: Emoji<'_, '_> = Emoji("✓", "[OK]");
            static FAIL: Emoji<'_, '_> = Emoji("✗", "[FAIL]");

            let mut output = String::new();
            output.push_str(&format!("{}\n", style("TDMS Conversion Summary").bold().cyan()));
            output.push_str(&format!("{}\n", style("=======================").cyan()));
            output.push_str(&format!("{}: {}\n\n", style("Root").bold(), self.root.display()));

            output.push_str(&format!(
                "{}: {} scanned, {} succeeded, {} failed, {} empty\n",
                style("Files").bold(),
                self.files_scanned,
                style(self.files_succeeded).green(),
                style(self.files_failed).red(),
                style(self.files_empty).yellow()
            ));
            output.push_str(&format!(
                "{}: {} exported, {} failed ({} rows)\n",
                style("Groups").bold(),
                style(self.groups_exported).green(),
                style(self.groups_failed).red(),
                self.rows_written
            ));

            if !self.failures.is_empty() {
                output.push('\n');
                for failure in &self.failures {
                    output.push_str(&format!(
                        "[{}] {} {}",
                        FAIL,
                        style(failure.kind).red(),
                        failure.path.display()
                    ));
                    if let Some(group) = &failure.group {
                        output.push_str(&format!(" [{}]", group));
                    }
                    output.push_str(&format!(": {}\n", failure.reason));
                }
            }

            output.push('\n');
            if self.has_failures() {
                output.push_str(&format!("{}\n", style("Conversion finished with failures").red().bold()));
            } else {
                output.push_str(&format!("[{}] {}\n", OK, style("Conversion succeeded").green().bold()));
            }
            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TDMS Conversion Summary")?;
        writeln!(f, "=======================")?;
        writeln!(f, "Root: {}", self.root.display())?;
        writeln!(f)?;
        writeln!(
            f,
            "Files: {} scanned, {} succeeded, {} failed, {} empty",
            self.files_scanned, self.files_succeeded, self.files_failed, self.files_empty
        )?;
        writeln!(
            f,
            "Groups: {} exported, {} failed ({} rows)",
            self.groups_exported, self.groups_failed, self.rows_written
        )?;

        if !self.failures.is_empty() {
            writeln!(f)?;
            for failure in &self.failures {
                write!(f, "[✗] {} {}", failure.kind, failure.path.display())?;
                if let Some(group) = &failure.group {
                    write!(f, " [{}]", group)?;
                }
                writeln!(f, ": {}", failure.reason)?;
            }
        }

        writeln!(f)?;
        if self.has_failures() {
            writeln!(f, "Conversion finished with failures")
        } else {
            writeln!(f, "Conversion succeeded")
        }
    }
}
