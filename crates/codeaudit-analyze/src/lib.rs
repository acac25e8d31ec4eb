//! Analysis pipeline for codeaudit.
//!
//! This crate turns eligible files into per-file reports and reconciles
//! them into one consolidated report:
//!
//! - **Service boundary** ([`AnalysisService`]) with a blocking Gemini client
//! - **Unit execution** that always yields report text, embedding failures
//! - **Collision-free storage** of per-file reports, final reports and metadata
//! - **Consolidation** through one synthesis call, with an offline fallback
//!   that concatenates stored reports in discovery order
//! - **Progress updates** via broadcast channels
//!
//! # Example
//!
//! ```rust,no_run
//! use codeaudit_analyze::{AnalysisPipeline, GeminiClient};
//! use codeaudit_core::AnalysisConfig;
//!
//! let key = std::env::var("GEMINI_API_KEY").ok();
//! let config = AnalysisConfig::default();
//! let client = GeminiClient::new(key.as_deref(), config.model.clone()).unwrap();
//! let outcome = AnalysisPipeline::new(client, config)
//!     .run(std::path::Path::new("."))
//!     .unwrap();
//! println!("{} files analyzed", outcome.total_files_analyzed());
//! ```

mod cleanup;
mod consolidate;
mod error;
mod executor;
mod fallback;
mod gemini;
mod metadata;
mod pipeline;
mod progress;
mod service;
mod store;

pub use cleanup::{CleanupSummary, clean_reports};
pub use consolidate::{Consolidator, SpecializedAnalysis, report_index};
pub use error::AnalysisError;
pub use executor::{UnitExecutor, UnitOutcome};
pub use fallback::{FALLBACK_TITLE, FallbackAggregator};
pub use gemini::{API_KEY_ENV, GeminiClient};
pub use metadata::MetadataWriter;
pub use pipeline::{AnalysisPipeline, RunOutcome};
pub use progress::{PipelineProgress, RunState};
pub use service::{AnalysisRequest, AnalysisService, ServiceError};
pub use store::{ReportStore, report_header, safe_name};

// Artifact names are shared with the walker, which skips earlier output.
pub use codeaudit_core::{
    FALLBACK_REPORT_PREFIX, FINAL_REPORT_PREFIX, METADATA_PREFIX, REPORTS_DIR_PREFIX,
};
