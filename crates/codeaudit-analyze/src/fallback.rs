//! Offline concatenation of stored reports when synthesis fails.
//!
//! The aggregator makes no service calls. It re-reads every stored report
//! from disk in discovery order, so its output reflects exactly what was
//! persisted, and the same inputs always produce the same bytes.

use tracing::warn;

use codeaudit_core::FileReport;

use crate::consolidate::SpecializedAnalysis;

/// Title line of a fallback report.
pub const FALLBACK_TITLE: &str = "# Consolidated Report (fallback)";

const FALLBACK_NOTE: &str = "_Automatic consolidation failed; this fallback concatenates the \
                             reports generated earlier in the run._";

/// Builds the fallback report.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackAggregator;

impl FallbackAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Concatenate stored per-file reports, each under a `## File:` header.
    pub fn aggregate(&self, reports: &[FileReport]) -> String {
        let mut out = preamble();
        for report in reports {
            let name = report.display_path();
            match std::fs::read(&report.report_path) {
                Ok(bytes) => {
                    out.push_str(&format!("\n---\n\n## File: {name}\n\n"));
                    out.push_str(&String::from_utf8_lossy(&bytes));
                    out.push_str("\n\n");
                }
                Err(err) => {
                    warn!(file = %name, error = %err, "could not re-read stored report");
                    out.push_str(&format!("\n(Error including {name}: {err})\n"));
                }
            }
        }
        out
    }

    /// Concatenate specialized analyses, each under a `## Analysis:` header.
    pub fn aggregate_analyses(&self, analyses: &[SpecializedAnalysis]) -> String {
        let mut out = preamble();
        for analysis in analyses {
            out.push_str(&format!("\n---\n\n## Analysis: {}\n\n", analysis.role.title()));
            out.push_str(&analysis.text);
            out.push_str("\n\n");
        }
        out
    }
}

fn preamble() -> String {
    format!("{FALLBACK_TITLE}\n\n{FALLBACK_NOTE}\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeaudit_core::Role;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_aggregate_in_order_with_missing_report() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.md");
        std::fs::write(&a, "report A").unwrap();

        let reports = vec![
            FileReport {
                relative_path: PathBuf::from("a.py"),
                report_path: a,
                content: "report A".to_string(),
            },
            FileReport {
                relative_path: PathBuf::from("gone.py"),
                report_path: temp.path().join("gone.md"),
                content: String::new(),
            },
        ];

        let out = FallbackAggregator::new().aggregate(&reports);
        assert!(out.starts_with(FALLBACK_TITLE));
        assert!(out.contains("\n---\n\n## File: a.py\n\nreport A\n\n"));
        assert!(out.contains("(Error including gone.py:"));
        assert!(out.find("a.py").unwrap() < out.find("gone.py").unwrap());
    }

    #[test]
    fn test_aggregate_analyses() {
        let analyses = vec![SpecializedAnalysis {
            role: Role::Quality,
            text: "# Quality and Testing Analysis\n\nok".to_string(),
            failed: false,
        }];
        let out = FallbackAggregator::new().aggregate_analyses(&analyses);
        assert!(out.contains("## Analysis: Quality and Testing\n\n# Quality and Testing Analysis\n\nok"));
    }
}
