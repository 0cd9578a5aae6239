//! AloeGuard backend client
//!
//! Every screen reaches the backend through the [`Backend`] trait. Two
//! implementations are provided: [`HttpBackend`] speaks JSON over HTTP, and
//! [`MemoryBackend`] keeps all tables in memory for tests and offline use.

pub mod http;
pub mod memory;

pub use http::HttpBackend;
pub use memory::{MemoryBackend, Operation};

use ag_core::contract::{
    AnalyzeImageRequest, AnalyzeImageResponse, PersistAnalysisRequest, SignInRequest,
    SignUpRequest,
};
use ag_core::{
    DiseaseReport, NewDiseaseReport, NewUserFeedback, PlantAnalysis, UserFeedback, UserProfile,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// HTTP status of a non-success response
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// The backend understood the request and refused it
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(400..=499))
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

/// The backend collaborator, one method per endpoint
#[async_trait]
pub trait Backend: Send + Sync {
    async fn sign_in(&self, request: &SignInRequest) -> FetchResult<UserProfile>;

    async fn sign_up(&self, request: &SignUpRequest) -> FetchResult<UserProfile>;

    async fn sign_out(&self) -> FetchResult<()>;

    /// The signed-in user; a 401 status means nobody is signed in
    async fn current_user(&self) -> FetchResult<UserProfile>;

    /// Run the (mocked) classifier on an image name
    async fn analyze_image(&self, request: &AnalyzeImageRequest) -> FetchResult<AnalyzeImageResponse>;

    async fn persist_analysis(&self, request: &PersistAnalysisRequest) -> FetchResult<PlantAnalysis>;

    /// A user's analyses, most recent first
    async fn list_analyses(&self, user_id: i64) -> FetchResult<Vec<PlantAnalysis>>;

    async fn list_disease_reports(&self) -> FetchResult<Vec<DiseaseReport>>;

    async fn create_disease_report(&self, report: &NewDiseaseReport) -> FetchResult<DiseaseReport>;

    async fn submit_feedback(&self, feedback: &NewUserFeedback) -> FetchResult<UserFeedback>;
}

/// Configuration for the HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API base URL
    pub base_url: String,

    /// Request timeout (seconds)
    pub timeout_secs: u64,

    /// User agent string
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("ALOEGUARD_API_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
            timeout_secs: std::env::var("ALOEGUARD_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            user_agent: format!("AloeGuard/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_helpers() {
        let err = FetchError::Status {
            status: 409,
            message: "Username already exists".to_string(),
        };
        assert!(err.is_conflict());
        assert!(err.is_client_error());
        assert!(!err.is_unauthorized());
        assert_eq!(err.to_string(), "HTTP 409: Username already exists");
        assert!(!FetchError::Timeout.is_client_error());
    }

    #[test]
    fn test_default_timeout() {
        let config = ClientConfig::default();
        assert!(config.timeout_secs > 0);
        assert!(config.user_agent.starts_with("AloeGuard/"));
    }
}
