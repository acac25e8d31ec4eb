//! Boundary to the external analysis service.

use codeaudit_core::Role;
use thiserror::Error;

/// Failure of a single service call.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// The request did not complete (connection, TLS, protocol).
    #[error("request failed: {message}")]
    Transport { message: String },

    /// The request timed out.
    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("failed to decode response: {message}")]
    Decode { message: String },

    /// The response carried no text.
    #[error("service returned an empty response")]
    EmptyResponse,

    /// Any other failure.
    #[error("{message}")]
    Other { message: String },
}

impl ServiceError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// One request: a role-specific instruction plus the text to analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub role: Role,
    pub system_prompt: String,
    pub user_prompt: String,
}

impl AnalysisRequest {
    /// Render the request for `role` from the catalog.
    pub fn for_role(role: Role, subject: &str, body: &str) -> Self {
        Self {
            role,
            system_prompt: role.system_instruction().to_string(),
            user_prompt: role.prompt(subject, body),
        }
    }
}

/// Submit text with a role-specific instruction, receive text or an error.
///
/// Calls are blocking; a run makes them one at a time.
pub trait AnalysisService {
    /// Service name for logs.
    fn name(&self) -> &str;

    /// Model identifier recorded in run metadata.
    fn model(&self) -> &str;

    /// Perform one analysis call.
    fn complete(&self, request: &AnalysisRequest) -> Result<String, ServiceError>;
}

impl<T: AnalysisService + ?Sized> AnalysisService for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    fn complete(&self, request: &AnalysisRequest) -> Result<String, ServiceError> {
        (**self).complete(request)
    }
}

impl<T: AnalysisService + ?Sized> AnalysisService for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    fn complete(&self, request: &AnalysisRequest) -> Result<String, ServiceError> {
        (**self).complete(request)
    }
}
