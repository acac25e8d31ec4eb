//! Removal of artifacts left by earlier runs.

use std::path::{Path, PathBuf};

use tracing::info;

use codeaudit_core::{is_reports_dir_name, is_run_artifact_name};

use crate::error::AnalysisError;

/// What a cleanup removed.
#[derive(Debug, Default, Clone)]
pub struct CleanupSummary {
    pub removed_files: Vec<PathBuf>,
    pub removed_dirs: Vec<PathBuf>,
}

impl CleanupSummary {
    pub fn is_empty(&self) -> bool {
        self.removed_files.is_empty() && self.removed_dirs.is_empty()
    }
}

/// Remove final reports and metadata files in `dir`; per-file report
/// directories only when `include_report_dirs` is set.
pub fn clean_reports(dir: &Path, include_report_dirs: bool) -> Result<CleanupSummary, AnalysisError> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| AnalysisError::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    let mut summary = CleanupSummary::default();
    for path in entries {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };

        if path.is_dir() {
            if include_report_dirs && is_reports_dir_name(name) {
                std::fs::remove_dir_all(&path).map_err(|e| AnalysisError::io(&path, e))?;
                info!(path = %path.display(), "removed report directory");
                summary.removed_dirs.push(path);
            }
        } else if is_run_artifact_name(name) {
            std::fs::remove_file(&path).map_err(|e| AnalysisError::io(&path, e))?;
            info!(path = %path.display(), "removed run artifact");
            summary.removed_files.push(path);
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn populate() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("final_report_20240101_000000.md"), "x").unwrap();
        fs::write(root.join("final_report_fallback_20240101_000000.md"), "x").unwrap();
        fs::write(root.join("run_metadata_20240101_000000.json"), "{}").unwrap();
        fs::write(root.join("notes.md"), "keep").unwrap();
        fs::create_dir(root.join("reports_by_file_20240101_000000")).unwrap();
        fs::write(root.join("reports_by_file_20240101_000000/a.md"), "x").unwrap();
        temp
    }

    #[test]
    fn test_clean_keeps_report_dirs_by_default() {
        let temp = populate();
        let summary = clean_reports(temp.path(), false).unwrap();

        assert_eq!(summary.removed_files.len(), 3);
        assert!(summary.removed_dirs.is_empty());
        assert!(temp.path().join("notes.md").exists());
        assert!(temp.path().join("reports_by_file_20240101_000000").exists());
    }

    #[test]
    fn test_clean_all() {
        let temp = populate();
        let summary = clean_reports(temp.path(), true).unwrap();

        assert_eq!(summary.removed_dirs.len(), 1);
        assert!(!temp.path().join("reports_by_file_20240101_000000").exists());
        assert!(temp.path().join("notes.md").exists());
    }
}
