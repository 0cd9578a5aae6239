//! Plant analyses

use super::Insertable;
use crate::validation::ValidationErrors;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

severity_enum! {
    /// Severity the analyzer assigns to a diagnosis
    PlantSeverity {
        Low => "low",
        Moderate => "moderate",
        High => "high",
    }
}

/// A persisted analysis of one plant image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantAnalysis {
    pub id: i64,
    pub user_id: i64,
    pub image_path: String,
    pub diagnosis: String,
    /// Percentage in [0, 100]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<PlantSeverity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(default)]
    pub is_healthy: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl PlantAnalysis {
    /// Confidence rounded to a whole percentage for display
    pub fn rounded_confidence(&self) -> u8 {
        self.confidence.round().clamp(0.0, 100.0) as u8
    }
}

/// Insert shape for `plant_analyses`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewPlantAnalysis {
    pub user_id: i64,
    pub image_path: String,
    pub diagnosis: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<PlantSeverity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(default)]
    pub is_healthy: bool,
}

impl Insertable for NewPlantAnalysis {
    const TABLE: &'static str = "plant_analyses";

    fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.user_id <= 0 {
            errors.push("userId", "User id must be positive");
        }
        if self.image_path.is_empty() {
            errors.push("imagePath", "Image path is required");
        }
        if self.diagnosis.is_empty() {
            errors.push("diagnosis", "Diagnosis is required");
        }
        if !self.confidence.is_finite() || !(0.0..=100.0).contains(&self.confidence) {
            errors.push("confidence", "Confidence must be between 0 and 100");
        }
        errors.into_result()
    }
}
