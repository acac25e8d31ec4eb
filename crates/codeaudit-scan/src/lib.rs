//! Source discovery for codeaudit.
//!
//! This crate decides which files of a codebase take part in an analysis
//! run and loads their content:
//!
//! - **Eligibility** via an extension allow-list, a directory skip-list and
//!   a per-file size ceiling
//! - **Deterministic traversal** via jwalk in serial mode with sorted
//!   directory listings; skip-listed directories are never read
//! - **Permissive loading** that replaces invalid UTF-8 and truncates to a
//!   character budget
//! - **GitHub clones** (feature `git`) for analyzing remote repositories
//!
//! # Example
//!
//! ```rust,no_run
//! use codeaudit_scan::{AnalysisConfig, ContentLoader, EligibilityFilter, SourceWalker, WalkItem};
//!
//! let config = AnalysisConfig::default();
//! let walker = SourceWalker::new(EligibilityFilter::from_config(&config));
//! let loader = ContentLoader::new(config.max_chars);
//!
//! for item in walker.walk(std::path::Path::new(".")).unwrap() {
//!     if let WalkItem::Eligible(file) = item {
//!         let text = loader.load(&file.absolute_path).unwrap();
//!         println!("{}: {} chars", file.display_path(), text.chars().count());
//!     }
//! }
//! ```

mod filter;
mod loader;
#[cfg(feature = "git")]
mod remote;
mod walker;

pub use filter::{Eligibility, EligibilityFilter};
pub use loader::{ContentLoader, TRUNCATION_MARKER, truncate_chars};
#[cfg(feature = "git")]
pub use remote::{ClonedRepo, clone_github_repo, is_github_url, repo_name};
pub use walker::{SourceFiles, SourceWalker, WalkItem};

// Re-export core types for convenience
pub use codeaudit_core::{AnalysisConfig, EligibleFile, ScanError, SkipKind, SkipWarning};
