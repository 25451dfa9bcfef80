use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::api::ApiConfig;
use crate::error::AppError;

// ============================================================================
// Helper
// ============================================================================

/// Convert any displayable send/decode failure into `AppError::Transport`.
fn transport_err(e: impl std::fmt::Display) -> AppError {
    AppError::Transport(e.to_string())
}

// ============================================================================
// Wire types (snake_case, as the service speaks them)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_path: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnswerRequest {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_new_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f64>,
}

impl AnswerRequest {
    /// Request with the given question and server-side sampling defaults.
    pub fn question(text: impl Into<String>) -> Self {
        Self {
            question: text.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub elapsed_sec: f64,
    pub device: String,
}

// ============================================================================
// InferenceApi
// ============================================================================

/// Seam over the inference service so chat logic can run against a
/// scripted double in tests.
#[async_trait]
pub trait InferenceApi: Send + Sync {
    async fn health(&self) -> Result<HealthResponse, AppError>;
    async fn answer(&self, request: AnswerRequest) -> Result<AnswerResponse, AppError>;
}

// ============================================================================
// InferenceClient
// ============================================================================

/// HTTP client for the TinyLlama inference service.
pub struct InferenceClient {
    http: reqwest::Client,
    base_url: String,
}

impl InferenceClient {
    /// Create a client for the given service endpoint.
    ///
    /// No request timeout is set: generation on modest hardware can
    /// outlast any fixed deadline, so only transport-level defaults apply.
    pub fn new(config: ApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and deserialize the JSON response.
    ///
    /// Non-2xx statuses become `AppError::Api`; failures to reach the
    /// service or to decode its body become `AppError::Transport`.
    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, AppError> {
        let response = req.send().await.map_err(transport_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Api {
                status: status.as_u16(),
                message: format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown Error")
                ),
            });
        }

        response.json().await.map_err(transport_err)
    }
}

#[async_trait]
impl InferenceApi for InferenceClient {
    /// `GET /health` -- liveness plus the device and model path in use.
    async fn health(&self) -> Result<HealthResponse, AppError> {
        self.send_json(self.http.get(self.url("/health"))).await
    }

    /// `POST /answer` -- run one generation for the given question.
    async fn answer(&self, request: AnswerRequest) -> Result<AnswerResponse, AppError> {
        let req = self.http.post(self.url("/answer")).json(&request);
        self.send_json(req).await
    }
}
