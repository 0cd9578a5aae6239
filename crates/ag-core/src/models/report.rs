//! Community disease reports

use super::Insertable;
use crate::validation::ValidationErrors;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

severity_enum! {
    /// Severity a reporter assigns to an observed case
    ReportSeverity {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// A persisted disease sighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseReport {
    pub id: i64,
    pub user_id: i64,
    pub location: String,
    pub disease: String,
    pub severity: ReportSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl DiseaseReport {
    /// Coordinates when both are known
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Insert shape for `disease_reports`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewDiseaseReport {
    pub user_id: i64,
    pub location: String,
    pub disease: String,
    pub severity: ReportSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Insertable for NewDiseaseReport {
    const TABLE: &'static str = "disease_reports";

    fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.user_id <= 0 {
            errors.push("userId", "User id must be positive");
        }
        if self.location.trim().is_empty() {
            errors.push("location", "Location is required");
        }
        if self.disease.trim().is_empty() {
            errors.push("disease", "Disease is required");
        }
        if let Some(lat) = self.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                errors.push("latitude", "Latitude must be between -90 and 90");
            }
        }
        if let Some(lon) = self.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                errors.push("longitude", "Longitude must be between -180 and 180");
            }
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::conform_insert;
    use serde_json::json;

    #[test]
    fn test_report_severity_from_wire() {
        let report: NewDiseaseReport = conform_insert(&json!({
            "userId": 1,
            "location": "Nairobi",
            "disease": "Leaf Spot",
            "severity": "MEDIUM",
        }))
        .unwrap();
        assert_eq!(report.severity, ReportSeverity::Medium);
    }

    #[test]
    fn test_report_rejects_out_of_range_coordinates() {
        let result = conform_insert::<NewDiseaseReport>(&json!({
            "userId": 1,
            "location": "Nowhere",
            "disease": "Leaf Spot",
            "severity": "low",
            "latitude": 91.0,
            "longitude": -200.0,
        }));
        match result {
            Err(crate::CoreError::Validation(errors)) => {
                assert!(errors.has("latitude"));
                assert!(errors.has("longitude"));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_report_requires_location() {
        let result = conform_insert::<NewDiseaseReport>(&json!({
            "userId": 1,
            "location": "  ",
            "disease": "Leaf Spot",
            "severity": "high",
        }));
        assert!(result.is_err());
    }
}
