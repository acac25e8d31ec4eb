//! Run configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// File extensions analyzed by default (lowercase, without the dot).
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "py", "md", "txt", "json", "yaml", "yml", "ini", "cfg", "sh", "tsx", "ts", "js", "rs", "toml",
];

/// Directory names pruned from the walk by default.
pub const DEFAULT_SKIP_DIRS: &[&str] = &[
    ".git",
    "__pycache__",
    "node_modules",
    "venv",
    ".venv",
    ".idea",
    ".vscode",
    ".env",
    "target",
];

/// Configuration for an analysis run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct AnalysisConfig {
    /// Hard ceiling on the number of per-file reports stored.
    #[builder(default = "20")]
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Files larger than this are never analyzed.
    #[builder(default = "2 * 1024 * 1024")]
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,

    /// Character budget for a single file's content in a prompt.
    #[builder(default = "50_000")]
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Allowed extensions, lowercase without the leading dot.
    #[builder(default = "default_extensions()")]
    #[serde(default = "default_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Directory names that are never descended into.
    #[builder(default = "default_skip_dirs()")]
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,

    /// Directory receiving reports, the final artifact and metadata.
    #[builder(default = "PathBuf::from(\".\")")]
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Model identifier passed to the analysis service.
    #[builder(default = "\"gemini-2.5-flash\".to_string()")]
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_max_files() -> usize {
    20
}

fn default_max_size_bytes() -> u64 {
    2 * 1024 * 1024
}

fn default_max_chars() -> usize {
    50_000
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_skip_dirs() -> Vec<String> {
    DEFAULT_SKIP_DIRS.iter().map(|d| d.to_string()).collect()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

impl AnalysisConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.max_files == Some(0) {
            return Err("max_files must be at least 1".to_string());
        }
        if self.max_size_bytes == Some(0) {
            return Err("max_size_bytes must be at least 1".to_string());
        }
        if self.max_chars == Some(0) {
            return Err("max_chars must be at least 1".to_string());
        }
        if let Some(ref model) = self.model {
            if model.trim().is_empty() {
                return Err("model cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl AnalysisConfig {
    /// Create a new config builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Check whether an extension (with or without a leading dot) is allowed.
    pub fn allows_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    /// Check whether a directory name is on the skip list.
    pub fn skips_dir(&self, name: &str) -> bool {
        self.skip_dirs.iter().any(|d| d == name)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_size_bytes: default_max_size_bytes(),
            max_chars: default_max_chars(),
            allowed_extensions: default_extensions(),
            skip_dirs: default_skip_dirs(),
            output_dir: default_output_dir(),
            model: default_model(),
        }
    }
}
