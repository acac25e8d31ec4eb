//! One service call per unit of work, with failures captured as text.

use tracing::warn;

use codeaudit_core::Role;

use crate::service::{AnalysisRequest, AnalysisService, ServiceError};

/// Result of analyzing one unit (a file or a whole document).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    /// The service returned a non-blank answer.
    Completed(String),
    /// The call failed; the error is kept as text.
    Failed { subject: String, error: String },
}

impl UnitOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Report text for this outcome. Never empty.
    pub fn into_text(self) -> String {
        match self {
            Self::Completed(text) => text,
            Self::Failed { subject, error } => {
                format!("**Analysis failed** for {subject}: {error}")
            }
        }
    }
}

/// Runs single analysis units against a service.
pub struct UnitExecutor<S> {
    service: S,
}

impl<S: AnalysisService> UnitExecutor<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Analyze `content` on behalf of `role`. Exactly one service call.
    pub fn analyze(&self, role: Role, subject: &str, content: &str) -> UnitOutcome {
        let request = AnalysisRequest::for_role(role, subject, content);
        let result = self
            .service
            .complete(&request)
            .and_then(|text| {
                if text.trim().is_empty() {
                    Err(ServiceError::EmptyResponse)
                } else {
                    Ok(text)
                }
            });

        match result {
            Ok(text) => UnitOutcome::Completed(text),
            Err(err) => {
                warn!(role = %role, subject, error = %err, "analysis failed");
                UnitOutcome::Failed {
                    subject: subject.to_string(),
                    error: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Fixed {
        reply: Result<String, ServiceError>,
        calls: Cell<usize>,
    }

    impl AnalysisService for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn model(&self) -> &str {
            "fixed-1"
        }

        fn complete(&self, _request: &AnalysisRequest) -> Result<String, ServiceError> {
            self.calls.set(self.calls.get() + 1);
            self.reply.clone()
        }
    }

    #[test]
    fn test_success() {
        let service = Fixed {
            reply: Ok("looks fine".to_string()),
            calls: Cell::new(0),
        };
        let outcome = UnitExecutor::new(&service).analyze(Role::FileAnalysis, "a.py", "x = 1");
        assert_eq!(outcome, UnitOutcome::Completed("looks fine".to_string()));
        assert_eq!(service.calls.get(), 1);
    }

    #[test]
    fn test_failure_is_embedded() {
        let service = Fixed {
            reply: Err(ServiceError::Timeout { seconds: 5 }),
            calls: Cell::new(0),
        };
        let outcome = UnitExecutor::new(&service).analyze(Role::FileAnalysis, "x.py", "x = 1");
        assert!(outcome.is_failure());
        let text = outcome.into_text();
        assert!(text.contains("x.py"));
        assert!(text.contains("timed out"));
        assert_eq!(service.calls.get(), 1);
    }

    #[test]
    fn test_blank_answer_is_failure() {
        let service = Fixed {
            reply: Ok("  \n".to_string()),
            calls: Cell::new(0),
        };
        let outcome = UnitExecutor::new(&service).analyze(Role::Quality, "report", "doc");
        assert!(outcome.is_failure());
        assert!(!outcome.into_text().trim().is_empty());
    }
}
