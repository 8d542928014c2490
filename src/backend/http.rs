//! HTTP implementation of the backend seam over reqwest.

use super::{Backend, BackendError};
use crate::model::{AnalysisRequest, AnalysisResult, BackendStatus, LogEntry};
use reqwest::Client;

/// Client for the backend's REST endpoints.
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    /// Build a client for `base_url` (e.g. `http://127.0.0.1:8000`).
    ///
    /// No request timeout is set here: an absent fetch response simply
    /// delays the next scheduled attempt, and the sequence guard discards
    /// it if it ever lands. The submission path bounds its own wait.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn fetch_logs(&self) -> Result<Vec<LogEntry>, BackendError> {
        let response = self
            .client
            .get(self.url("/logs/"))
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status().as_u16()));
        }

        response
            .json::<Vec<LogEntry>>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, BackendError> {
        let response = self
            .client
            .post(self.url("/analyze/"))
            .json(request)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status().as_u16()));
        }

        response
            .json::<AnalysisResult>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn health(&self) -> Result<BackendStatus, BackendError> {
        let response = self
            .client
            .get(self.url("/"))
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status().as_u16()));
        }

        response
            .json::<BackendStatus>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}
