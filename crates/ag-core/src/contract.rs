//! Request and response shapes exchanged with the backend

use crate::models::NewUser;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Endpoint paths, relative to the API base URL
pub mod paths {
    pub const SIGN_IN: &str = "/api/auth/signin";
    pub const SIGN_UP: &str = "/api/auth/signup";
    pub const CURRENT_USER: &str = "/api/auth/user";
    pub const SIGN_OUT: &str = "/api/auth/signout";
    pub const ANALYZE_IMAGE: &str = "/api/analyze-image";
    pub const PLANT_ANALYSIS: &str = "/api/plant-analysis";
    pub const DISEASE_REPORTS: &str = "/api/disease-reports";
    pub const FEEDBACK: &str = "/api/feedback";

    /// Analyses belonging to one user
    pub fn user_analyses(user_id: i64) -> String {
        format!("{}/user/{}", PLANT_ANALYSIS, user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

pub type SignUpRequest = NewUser;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeImageRequest {
    pub image_name: String,
}

/// Overall health verdict of an analyzed image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Good,
    Warning,
    Danger,
    #[serde(other)]
    Unknown,
}

impl AnalysisStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, AnalysisStatus::Good)
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AnalysisStatus::Good => "good",
            AnalysisStatus::Warning => "warning",
            AnalysisStatus::Danger => "danger",
            AnalysisStatus::Unknown => "unknown",
        };
        f.pad(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeImageResponse {
    pub diagnosis: String,
    pub confidence: f64,
    pub status: AnalysisStatus,
    #[serde(default)]
    pub notes: String,
}

impl AnalyzeImageResponse {
    pub fn rounded_confidence(&self) -> u8 {
        self.confidence.round().clamp(0.0, 100.0) as u8
    }
}

/// Body of the persist step that follows a successful analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistAnalysisRequest {
    pub user_id: i64,
    pub image_path: String,
    pub diagnosis: String,
    pub confidence: f64,
    pub status: AnalysisStatus,
    pub notes: String,
}

impl PersistAnalysisRequest {
    pub fn from_diagnosis(user_id: i64, image_path: &str, analysis: &AnalyzeImageResponse) -> Self {
        Self {
            user_id,
            image_path: image_path.to_string(),
            diagnosis: analysis.diagnosis.clone(),
            confidence: analysis.confidence,
            status: analysis.status,
            notes: analysis.notes.clone(),
        }
    }
}

/// Error body returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}
