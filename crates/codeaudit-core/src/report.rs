//! Run inputs, per-file reports and run metadata.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::role::Role;
use crate::stamp::RunStamp;

/// What a run analyzes, decided once when the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisTarget {
    /// A pre-existing whole-codebase report document.
    Document(PathBuf),
    /// A directory tree to walk.
    Directory(PathBuf),
    /// The input did not exist; the working directory is walked instead.
    WorkingDirectory(PathBuf),
}

/// Serializable discriminant of [`AnalysisTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Document,
    Directory,
    WorkingDirectory,
}

impl AnalysisTarget {
    /// Inspect `input` once and pick the target kind.
    ///
    /// An existing file is a document, an existing directory is walked, and
    /// anything else falls back to `cwd`.
    pub fn resolve(input: &Path, cwd: &Path) -> Self {
        if input.is_file() {
            Self::Document(input.to_path_buf())
        } else if input.is_dir() {
            Self::Directory(input.to_path_buf())
        } else {
            Self::WorkingDirectory(cwd.to_path_buf())
        }
    }

    /// The path the run reads from.
    pub fn path(&self) -> &Path {
        match self {
            Self::Document(p) | Self::Directory(p) | Self::WorkingDirectory(p) => p,
        }
    }

    /// Kind of this target.
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::Document(_) => TargetKind::Document,
            Self::Directory(_) => TargetKind::Directory,
            Self::WorkingDirectory(_) => TargetKind::WorkingDirectory,
        }
    }

    /// Whether this target is walked file by file.
    pub fn is_tree(&self) -> bool {
        !matches!(self, Self::Document(_))
    }
}

/// A file that passed the eligibility filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleFile {
    /// Absolute path on disk.
    pub absolute_path: PathBuf,
    /// Path relative to the walked root.
    pub relative_path: PathBuf,
    /// Size in bytes at discovery time.
    pub size_bytes: u64,
    /// Lowercase extension without the dot.
    pub extension: String,
}

impl EligibleFile {
    /// Relative path rendered with `/` separators.
    pub fn display_path(&self) -> String {
        display_relative(&self.relative_path)
    }
}

/// One stored per-file report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// Source file path relative to the walked root.
    pub relative_path: PathBuf,
    /// Where the report was written.
    pub report_path: PathBuf,
    /// Full report text as written (header included).
    pub content: String,
}

impl FileReport {
    /// Relative path rendered with `/` separators.
    pub fn display_path(&self) -> String {
        display_relative(&self.relative_path)
    }

    /// Reference recorded in run metadata.
    pub fn to_ref(&self) -> ReportRef {
        ReportRef {
            file: self.display_path(),
            report_path: self.report_path.clone(),
        }
    }
}

/// File path to report path association recorded in metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRef {
    pub file: String,
    pub report_path: PathBuf,
}

/// Structured record of one run, written once at the end.
///
/// The analyzed count is recomputed from the report list when a record is
/// read back, whatever the file says.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StoredRunMetadata")]
pub struct RunMetadata {
    /// Run stamp shared by every artifact of the run.
    pub timestamp: RunStamp,
    /// How the input was interpreted.
    pub target: TargetKind,
    /// Walked root or input document.
    pub root_or_input: PathBuf,
    /// Consolidated report path.
    pub output_file: PathBuf,
    per_file_reports: Vec<ReportRef>,
    total_files_analyzed: usize,
    /// Roles whose prompts were used during the run.
    pub roles_used: Vec<Role>,
    /// Model identifier reported by the service.
    pub model: String,
    /// Files left out because of size or read problems.
    pub skipped_files: usize,
    /// Whether the fallback aggregator produced the final report.
    pub fallback: bool,
    /// Consolidation error captured when `fallback` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunMetadata {
    /// Create metadata for a run; the analyzed count is derived from `reports`.
    pub fn new(
        timestamp: RunStamp,
        target: &AnalysisTarget,
        output_file: impl Into<PathBuf>,
        reports: &[FileReport],
    ) -> Self {
        let per_file_reports: Vec<ReportRef> = reports.iter().map(FileReport::to_ref).collect();
        Self {
            timestamp,
            target: target.kind(),
            root_or_input: target.path().to_path_buf(),
            output_file: output_file.into(),
            total_files_analyzed: per_file_reports.len(),
            per_file_reports,
            roles_used: Vec::new(),
            model: String::new(),
            skipped_files: 0,
            fallback: false,
            error: None,
        }
    }

    /// Record the roles used.
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles_used = roles.into_iter().collect();
        self
    }

    /// Record the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Record how many files were skipped.
    pub fn with_skipped(mut self, skipped: usize) -> Self {
        self.skipped_files = skipped;
        self
    }

    /// Mark the run as having used the fallback aggregator.
    pub fn with_fallback(mut self, error: impl Into<String>) -> Self {
        self.fallback = true;
        self.error = Some(error.into());
        self
    }

    /// Per-file report references in discovery order.
    pub fn per_file_reports(&self) -> &[ReportRef] {
        &self.per_file_reports
    }

    /// Number of files analyzed; always equals `per_file_reports().len()`.
    pub fn total_files_analyzed(&self) -> usize {
        self.total_files_analyzed
    }
}

/// On-disk form of [`RunMetadata`]; any stored count is ignored.
#[derive(Deserialize)]
struct StoredRunMetadata {
    timestamp: RunStamp,
    target: TargetKind,
    root_or_input: PathBuf,
    output_file: PathBuf,
    per_file_reports: Vec<ReportRef>,
    roles_used: Vec<Role>,
    model: String,
    skipped_files: usize,
    fallback: bool,
    #[serde(default)]
    error: Option<String>,
}

impl From<StoredRunMetadata> for RunMetadata {
    fn from(stored: StoredRunMetadata) -> Self {
        Self {
            timestamp: stored.timestamp,
            target: stored.target,
            root_or_input: stored.root_or_input,
            output_file: stored.output_file,
            total_files_analyzed: stored.per_file_reports.len(),
            per_file_reports: stored.per_file_reports,
            roles_used: stored.roles_used,
            model: stored.model,
            skipped_files: stored.skipped_files,
            fallback: stored.fallback,
            error: stored.error,
        }
    }
}

fn display_relative(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
