//! Whole-codebase analyses and the final synthesis call.

use itertools::Itertools;
use tracing::info;

use codeaudit_core::{FileReport, Role};
use codeaudit_scan::truncate_chars;

use crate::executor::UnitExecutor;
use crate::service::{AnalysisRequest, AnalysisService, ServiceError};

/// Output of one specialized analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecializedAnalysis {
    pub role: Role,
    /// Role heading followed by the answer or the embedded error.
    pub text: String,
    pub failed: bool,
}

/// Combines unit results into one synthesis request.
pub struct Consolidator<S> {
    service: S,
    body_budget: usize,
}

impl<S: AnalysisService> Consolidator<S> {
    /// `body_budget` caps the characters of report bodies embedded in the
    /// synthesis request.
    pub fn new(service: S, body_budget: usize) -> Self {
        Self {
            service,
            body_budget,
        }
    }

    /// Run the six specialized analyses over `document`, in order.
    ///
    /// A failed analysis keeps its slot with the error embedded; the others
    /// still run.
    pub fn run_specialized(&self, document: &str) -> Vec<SpecializedAnalysis> {
        let executor = UnitExecutor::new(&self.service);
        Role::SPECIALIZED
            .iter()
            .map(|&role| {
                info!(role = %role, "running specialized analysis");
                let outcome = executor.analyze(role, "codebase report", document);
                let failed = outcome.is_failure();
                SpecializedAnalysis {
                    role,
                    text: format!("{}\n\n{}", role.heading(), outcome.into_text()),
                    failed,
                }
            })
            .collect()
    }

    /// Synthesize the final report from stored per-file reports.
    pub fn consolidate_reports(&self, reports: &[FileReport]) -> Result<String, ServiceError> {
        let bodies = reports
            .iter()
            .map(|r| format!("### {}\n\n{}", r.display_path(), r.content))
            .join("\n\n");
        let material = format!(
            "Per-file reports (index):\n{}\n\nPer-file report contents:\n\n{}",
            report_index(reports),
            truncate_chars(&bodies, self.body_budget)
        );
        self.synthesize("the analyzed codebase", &material)
    }

    /// Synthesize the final report from the specialized analyses.
    pub fn consolidate_analyses(
        &self,
        analyses: &[SpecializedAnalysis],
    ) -> Result<String, ServiceError> {
        let material = analyses.iter().map(|a| a.text.as_str()).join("\n\n");
        self.synthesize("the specialized analyses", &material)
    }

    fn synthesize(&self, subject: &str, material: &str) -> Result<String, ServiceError> {
        info!(service = self.service.name(), "running consolidation");
        let request = AnalysisRequest::for_role(Role::Synthesis, subject, material);
        let text = self.service.complete(&request)?;
        if text.trim().is_empty() {
            return Err(ServiceError::EmptyResponse);
        }
        Ok(text)
    }
}

/// One `- <file>: <report path>` line per report, in discovery order.
pub fn report_index(reports: &[FileReport]) -> String {
    reports
        .iter()
        .map(|r| format!("- {}: {}", r.display_path(), r.report_path.display()))
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    /// Fails every role listed in `failing`, answers the rest with the role name.
    struct RoleScript {
        failing: Vec<Role>,
        seen: RefCell<Vec<AnalysisRequest>>,
    }

    impl AnalysisService for RoleScript {
        fn name(&self) -> &str {
            "script"
        }

        fn model(&self) -> &str {
            "script-1"
        }

        fn complete(&self, request: &AnalysisRequest) -> Result<String, ServiceError> {
            self.seen.borrow_mut().push(request.clone());
            if self.failing.contains(&request.role) {
                Err(ServiceError::other("quota exceeded"))
            } else {
                Ok(format!("answer from {}", request.role))
            }
        }
    }

    fn report(name: &str) -> FileReport {
        FileReport {
            relative_path: PathBuf::from(name),
            report_path: PathBuf::from(format!("/out/{name}.md")),
            content: format!("# Analysis of file: {name}\n\nbody of {name}"),
        }
    }

    #[test]
    fn test_specialized_failure_does_not_block_others() {
        let service = RoleScript {
            failing: vec![Role::Legal],
            seen: RefCell::new(Vec::new()),
        };
        let analyses = Consolidator::new(&service, 1000).run_specialized("DOC");

        assert_eq!(analyses.len(), 6);
        let roles: Vec<Role> = analyses.iter().map(|a| a.role).collect();
        assert_eq!(roles, Role::SPECIALIZED.to_vec());

        let legal = analyses.iter().find(|a| a.role == Role::Legal).unwrap();
        assert!(legal.failed);
        assert!(legal.text.starts_with("# Legal and Compliance Analysis"));
        assert!(legal.text.contains("quota exceeded"));
        assert_eq!(analyses.iter().filter(|a| a.failed).count(), 1);
        assert!(service.seen.borrow().iter().all(|r| r.user_prompt.contains("DOC")));
    }

    #[test]
    fn test_consolidate_reports_includes_index_and_bodies() {
        let service = RoleScript {
            failing: vec![],
            seen: RefCell::new(Vec::new()),
        };
        let reports = vec![report("a.py"), report("b.py")];
        let text = Consolidator::new(&service, 10_000)
            .consolidate_reports(&reports)
            .unwrap();

        assert_eq!(text, "answer from synthesis");
        let seen = service.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].role, Role::Synthesis);
        assert!(seen[0].user_prompt.contains("- a.py: /out/a.py.md"));
        assert!(seen[0].user_prompt.contains("body of b.py"));
    }

    #[test]
    fn test_consolidate_failure_is_returned() {
        let service = RoleScript {
            failing: vec![Role::Synthesis],
            seen: RefCell::new(Vec::new()),
        };
        let err = Consolidator::new(&service, 100)
            .consolidate_reports(&[report("a.py")])
            .unwrap_err();
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[test]
    fn test_report_index_order() {
        let index = report_index(&[report("z.py"), report("a.py")]);
        assert_eq!(index, "- z.py: /out/z.py.md\n- a.py: /out/a.py.md");
    }
}
