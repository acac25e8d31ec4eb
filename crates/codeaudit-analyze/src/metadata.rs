//! Run metadata persistence.

use std::path::{Path, PathBuf};

use tracing::info;

use codeaudit_core::{METADATA_PREFIX, RunMetadata};

use crate::error::AnalysisError;
use crate::store::write_unique;

/// Writes one metadata file per run.
#[derive(Debug, Clone)]
pub struct MetadataWriter {
    output_dir: PathBuf,
}

impl MetadataWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Serialize `metadata` as pretty JSON to `run_metadata_<stamp>.json`.
    pub fn write(&self, metadata: &RunMetadata) -> Result<PathBuf, AnalysisError> {
        let mut json = serde_json::to_string_pretty(metadata)?;
        json.push('\n');
        let stem = format!("{METADATA_PREFIX}_{}", metadata.timestamp);
        let path = write_unique(&self.output_dir, &stem, "json", &json)?;
        info!(path = %path.display(), "metadata written");
        Ok(path)
    }

    /// Read a metadata file back.
    pub fn read(path: &Path) -> Result<RunMetadata, AnalysisError> {
        let raw = std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeaudit_core::{AnalysisTarget, FileReport, Role, RunStamp};
    use tempfile::TempDir;

    fn stamp() -> RunStamp {
        use chrono::TimeZone;
        RunStamp::from_datetime(&chrono::Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap())
    }

    #[test]
    fn test_write_fallback_metadata() {
        let temp = TempDir::new().unwrap();
        let target = AnalysisTarget::Directory(temp.path().to_path_buf());
        let reports = vec![FileReport {
            relative_path: PathBuf::from("a.py"),
            report_path: temp.path().join("a.md"),
            content: String::new(),
        }];
        let metadata = RunMetadata::new(stamp(), &target, temp.path().join("final.md"), &reports)
            .with_roles([Role::FileAnalysis, Role::Synthesis])
            .with_model("gemini-2.5-flash")
            .with_fallback("HTTP 500: boom");

        let path = MetadataWriter::new(temp.path()).write(&metadata).unwrap();
        assert_eq!(path, temp.path().join("run_metadata_20240506_070809.json"));

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["fallback"], true);
        assert_eq!(value["error"], "HTTP 500: boom");
        assert_eq!(value["total_files_analyzed"], 1);
        assert_eq!(value["per_file_reports"][0]["file"], "a.py");
        assert_eq!(value["target"], "directory");
        assert_eq!(value["roles_used"][1], "synthesis");

        let back = MetadataWriter::read(&path).unwrap();
        assert_eq!(back.total_files_analyzed(), back.per_file_reports().len());
    }

    #[test]
    fn test_error_omitted_without_fallback() {
        let temp = TempDir::new().unwrap();
        let target = AnalysisTarget::Document(temp.path().join("doc.md"));
        let metadata = RunMetadata::new(stamp(), &target, temp.path().join("final.md"), &[]);

        let path = MetadataWriter::new(temp.path()).write(&metadata).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["fallback"], false);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_read_recomputes_count() {
        let temp = TempDir::new().unwrap();
        let target = AnalysisTarget::Directory(temp.path().to_path_buf());
        let reports = vec![FileReport {
            relative_path: PathBuf::from("a.py"),
            report_path: temp.path().join("a.md"),
            content: String::new(),
        }];
        let metadata = RunMetadata::new(stamp(), &target, temp.path().join("final.md"), &reports);
        let path = MetadataWriter::new(temp.path()).write(&metadata).unwrap();

        let mut value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        value["total_files_analyzed"] = serde_json::json!(5);
        let edited = temp.path().join("edited.json");
        std::fs::write(&edited, value.to_string()).unwrap();

        let back = MetadataWriter::read(&edited).unwrap();
        assert_eq!(back.total_files_analyzed(), 1);
        assert_eq!(back.per_file_reports().len(), 1);
    }
}
