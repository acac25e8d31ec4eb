//! Pipeline progress reporting.

use std::path::PathBuf;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Scanning,
    Filtering,
    Loading,
    Executing,
    Storing,
    /// Running the whole-document analyses.
    Specialized,
    Consolidating,
    Fallback,
    Done,
    /// The walk finished without storing a single report.
    Aborted,
}

impl RunState {
    /// Whether the run has ended.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

/// Snapshot published on every state transition.
#[derive(Debug, Clone)]
pub struct PipelineProgress {
    pub state: RunState,
    /// Reports stored so far.
    pub files_analyzed: usize,
    /// Ceiling on stored reports.
    pub max_files: usize,
    /// File or document being worked on.
    pub current_path: Option<PathBuf>,
}
