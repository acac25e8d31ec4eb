//! Run-level error types.

use std::path::PathBuf;

use thiserror::Error;

use codeaudit_core::ScanError;

/// Errors that end a run.
///
/// Per-file problems never surface here: unreadable files become skip
/// warnings, failed analyses become error-embedded reports and storage
/// failures are logged and left out of the tally.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A credential required by the analysis service is missing.
    #[error("Missing credential: set {name} or pass it explicitly")]
    MissingCredential { name: &'static str },

    /// The service client could not be constructed.
    #[error("Failed to set up analysis service: {message}")]
    ServiceSetup { message: String },

    /// A full walk produced no stored report.
    #[error("No eligible files found for analysis under {root}")]
    NoEligibleFiles { root: PathBuf },

    /// The walk could not start.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Writing or reading a run artifact failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Run metadata could not be serialized.
    #[error("Failed to serialize run metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
