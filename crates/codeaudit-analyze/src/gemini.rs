//! Google Gemini `generateContent` client.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AnalysisError;
use crate::service::{AnalysisRequest, AnalysisService, ServiceError};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const ERROR_BODY_CHARS: usize = 300;

/// Blocking client for the Gemini API.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Create a client. A missing or blank key is a configuration error.
    pub fn new(api_key: Option<&str>, model: impl Into<String>) -> Result<Self, AnalysisError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(AnalysisError::MissingCredential { name: API_KEY_ENV })?
            .to_string();

        let client = build_client(DEFAULT_TIMEOUT_SECS)?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model: normalize_model(&model.into()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Point the client at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Change the per-request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Result<Self, AnalysisError> {
        let secs = secs.max(1);
        self.client = build_client(secs)?;
        self.timeout_secs = secs;
        Ok(self)
    }

    /// First characters of the key, for logs.
    pub fn key_prefix(&self) -> String {
        self.api_key.chars().take(6).collect()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }

    fn map_transport(&self, err: reqwest::Error) -> ServiceError {
        if err.is_timeout() {
            ServiceError::Timeout {
                seconds: self.timeout_secs,
            }
        } else {
            // Drop the URL so the key never lands in an error message.
            ServiceError::Transport {
                message: err.without_url().to_string(),
            }
        }
    }
}

impl AnalysisService for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, request: &AnalysisRequest) -> Result<String, ServiceError> {
        debug!(role = %request.role, model = %self.model, chars = request.user_prompt.len(), "gemini request");

        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(request.system_prompt.clone()),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.user_prompt.clone()),
                }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_CHARS).collect(),
            });
        }

        let parsed: GenerateContentResponse =
            response.json().map_err(|e| ServiceError::Decode {
                message: e.without_url().to_string(),
            })?;

        extract_text(parsed)
    }
}

fn build_client(timeout_secs: u64) -> Result<Client, AnalysisError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AnalysisError::ServiceSetup {
            message: e.to_string(),
        })
}

/// Accept `gemini/<model>` as well as the bare model name.
fn normalize_model(model: &str) -> String {
    model
        .trim()
        .strip_prefix("gemini/")
        .unwrap_or(model.trim())
        .to_string()
}

fn extract_text(response: GenerateContentResponse) -> Result<String, ServiceError> {
    let text = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .flat_map(|candidate| {
            candidate
                .content
                .and_then(|content| content.parts)
                .unwrap_or_default()
        })
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("\n");

    if text.trim().is_empty() {
        return Err(ServiceError::EmptyResponse);
    }
    Ok(text)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<Part>>,
}
