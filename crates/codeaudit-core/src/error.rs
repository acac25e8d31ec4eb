//! Error types for discovery and loading.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while discovering or loading source files.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// URL is not a GitHub repository URL.
    #[error("Invalid GitHub URL: {url}")]
    InvalidUrl { url: String },

    /// Cloning a remote repository failed.
    #[error("Failed to clone {url}: {message}")]
    Clone { url: String, message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Why a file was left out of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    /// File exceeds the size ceiling.
    TooLarge,
    /// File size could not be determined.
    MetadataError,
    /// File content could not be read.
    ReadError,
    /// The walker could not read a directory entry.
    WalkError,
}

/// Non-fatal condition encountered while discovering or loading files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipWarning {
    /// Path the warning refers to.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: SkipKind,
}

impl SkipWarning {
    /// Create a new skip warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: SkipKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning for a file over the size ceiling.
    pub fn too_large(path: impl Into<PathBuf>, size: u64, limit: u64) -> Self {
        let path = path.into();
        Self {
            message: format!(
                "File too large: {} ({size} bytes > {limit} bytes)",
                path.display()
            ),
            path,
            kind: SkipKind::TooLarge,
        }
    }

    /// Create a warning for a file whose metadata could not be read.
    pub fn metadata_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self {
            path: path.into(),
            message: format!("Could not read file size: {error}"),
            kind: SkipKind::MetadataError,
        }
    }

    /// Create a warning for a file whose content could not be read.
    pub fn read_error(path: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        Self {
            path: path.into(),
            message: format!("Read error: {error}"),
            kind: SkipKind::ReadError,
        }
    }
}
