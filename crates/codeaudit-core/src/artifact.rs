//! Names of the files and directories a run writes into its output directory.

/// Prefix of the per-run report directory.
pub const REPORTS_DIR_PREFIX: &str = "reports_by_file";
/// Prefix of a synthesized final report.
pub const FINAL_REPORT_PREFIX: &str = "final_report";
/// Prefix of a concatenated final report.
pub const FALLBACK_REPORT_PREFIX: &str = "final_report_fallback";
/// Prefix of the run metadata file.
pub const METADATA_PREFIX: &str = "run_metadata";

/// Whether `name` is a per-file report directory written by a run.
pub fn is_reports_dir_name(name: &str) -> bool {
    has_prefix(name, REPORTS_DIR_PREFIX)
}

/// Whether `name` is a final report or metadata file written by a run.
///
/// Fallback reports share the final report prefix.
pub fn is_run_artifact_name(name: &str) -> bool {
    (has_prefix(name, FINAL_REPORT_PREFIX) && name.ends_with(".md"))
        || (has_prefix(name, METADATA_PREFIX) && name.ends_with(".json"))
}

fn has_prefix(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('_'))
}
