//! Backend API seam -- the anomaly-detection service this tool watches.

mod http;

pub use self::http::HttpBackend;

use crate::model::{AnalysisRequest, AnalysisResult, BackendStatus, LogEntry};
use thiserror::Error;

/// Failure kinds for backend calls. The contract defines no error-body
/// schema, so any non-2xx or transport failure is opaque.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend returned HTTP {0}")]
    Status(u16),
    #[error("failed to decode backend response: {0}")]
    Decode(String),
}

/// The three operations the dashboard pipeline needs from the backend.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// `GET /logs/` -- full activity log, newest-first.
    async fn fetch_logs(&self) -> Result<Vec<LogEntry>, BackendError>;

    /// `POST /analyze/` -- score one synthetic activity record.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, BackendError>;

    /// `GET /` -- backend liveness blob.
    async fn health(&self) -> Result<BackendStatus, BackendError>;
}
