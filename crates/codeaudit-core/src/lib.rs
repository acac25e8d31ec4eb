//! Core types and configuration for codeaudit.
//!
//! This crate provides the data model shared by the scanning and analysis
//! crates: run configuration, the settings file, the role/prompt catalog,
//! per-file report records and run metadata.

mod artifact;
mod config;
mod error;
mod report;
mod role;
mod settings;
mod stamp;

pub use artifact::{
    FALLBACK_REPORT_PREFIX, FINAL_REPORT_PREFIX, METADATA_PREFIX, REPORTS_DIR_PREFIX,
    is_reports_dir_name, is_run_artifact_name,
};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, DEFAULT_EXTENSIONS, DEFAULT_SKIP_DIRS};
pub use error::{ScanError, SkipKind, SkipWarning};
pub use report::{
    AnalysisTarget, EligibleFile, FileReport, ReportRef, RunMetadata, TargetKind,
};
pub use role::Role;
pub use settings::{Settings, SettingsError};
pub use stamp::RunStamp;
