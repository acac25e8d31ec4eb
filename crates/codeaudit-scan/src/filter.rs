//! File eligibility rules.

use std::path::{Component, Path};

use codeaudit_core::AnalysisConfig;

/// Result of checking one path against the eligibility rules.
#[derive(Debug)]
pub enum Eligibility {
    /// The file participates in the run.
    Eligible { size: u64 },
    /// A component of the path is on the skip list.
    SkippedDirectory,
    /// The extension is missing or not allowed.
    WrongExtension,
    /// The file exceeds the size ceiling.
    TooLarge { size: u64 },
    /// The size could not be read.
    Unreadable(std::io::Error),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible { .. })
    }
}

/// Extension allow-list, directory skip-list and size ceiling.
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    allowed_extensions: Vec<String>,
    skip_dirs: Vec<String>,
    max_size_bytes: u64,
}

impl EligibilityFilter {
    /// Create a filter from explicit lists.
    pub fn new(
        allowed_extensions: impl IntoIterator<Item = impl Into<String>>,
        skip_dirs: impl IntoIterator<Item = impl Into<String>>,
        max_size_bytes: u64,
    ) -> Self {
        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            skip_dirs: skip_dirs.into_iter().map(Into::into).collect(),
            max_size_bytes,
        }
    }

    /// Create a filter from run configuration.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.allowed_extensions.iter().cloned(),
            config.skip_dirs.iter().cloned(),
            config.max_size_bytes,
        )
    }

    /// Size ceiling in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Whether a directory with this name is pruned from the walk.
    pub fn is_skipped_dir(&self, name: &str) -> bool {
        self.skip_dirs.iter().any(|d| d == name)
    }

    /// Lowercase extension of `path` if it is on the allow-list.
    pub fn allowed_extension(&self, path: &Path) -> Option<String> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.allowed_extensions.contains(&ext).then_some(ext)
    }

    /// Check the extension and skip-list only, without touching the disk.
    pub fn check_name(&self, path: &Path) -> Eligibility {
        if self.has_skipped_component(path) {
            return Eligibility::SkippedDirectory;
        }
        if self.allowed_extension(path).is_none() {
            return Eligibility::WrongExtension;
        }
        Eligibility::Eligible { size: 0 }
    }

    /// Check the size of a file whose name already passed.
    pub fn check_size(&self, size: u64) -> Eligibility {
        if size > self.max_size_bytes {
            Eligibility::TooLarge { size }
        } else {
            Eligibility::Eligible { size }
        }
    }

    /// Full check, reading the file size from disk.
    pub fn check(&self, path: &Path) -> Eligibility {
        match self.check_name(path) {
            Eligibility::Eligible { .. } => {}
            other => return other,
        }
        match std::fs::metadata(path) {
            Ok(metadata) => self.check_size(metadata.len()),
            Err(err) => Eligibility::Unreadable(err),
        }
    }

    /// Whether `path` participates in analysis.
    pub fn is_eligible(&self, path: &Path) -> bool {
        self.check(path).is_eligible()
    }

    fn has_skipped_component(&self, path: &Path) -> bool {
        let parent = match path.parent() {
            Some(p) => p,
            None => return false,
        };
        parent.components().any(|c| match c {
            Component::Normal(name) => name.to_str().is_some_and(|n| self.is_skipped_dir(n)),
            _ => false,
        })
    }
}

impl Default for EligibilityFilter {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}
