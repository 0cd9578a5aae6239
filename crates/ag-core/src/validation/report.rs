//! Report-a-case form

use super::{optional_text, ValidationErrors};
use crate::models::{NewDiseaseReport, ReportSeverity};
use serde::{Deserialize, Serialize};

/// Raw disease report input; coordinates are typed as text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiseaseReportForm {
    pub location: String,
    pub disease: String,
    pub severity: Option<ReportSeverity>,
    pub description: String,
    pub latitude: String,
    pub longitude: String,
}

impl DiseaseReportForm {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn validate(&self, user_id: i64) -> Result<NewDiseaseReport, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.location.trim().is_empty() {
            errors.push("location", "Location is required");
        }
        if self.disease.trim().is_empty() {
            errors.push("disease", "Disease is required");
        }
        if self.severity.is_none() {
            errors.push("severity", "Please select a severity");
        }
        let latitude = coordinate(&self.latitude, 90.0, "latitude", "Latitude", &mut errors);
        let longitude = coordinate(&self.longitude, 180.0, "longitude", "Longitude", &mut errors);

        let severity = match (self.severity, errors.is_empty()) {
            (Some(severity), true) => severity,
            _ => return Err(errors),
        };

        Ok(NewDiseaseReport {
            user_id,
            location: self.location.trim().to_string(),
            disease: self.disease.trim().to_string(),
            severity,
            description: optional_text(&self.description),
            latitude,
            longitude,
        })
    }
}

fn coordinate(
    raw: &str,
    bound: f64,
    field: &'static str,
    label: &str,
    errors: &mut ValidationErrors,
) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && (-bound..=bound).contains(&value) => Some(value),
        Ok(_) => {
            errors.push(
                field,
                format!("{} must be between -{} and {}", label, bound, bound),
            );
            None
        }
        Err(_) => {
            errors.push(field, format!("{} must be a number", label));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> DiseaseReportForm {
        DiseaseReportForm {
            location: "Kitale".to_string(),
            disease: "Aloe Rust".to_string(),
            severity: Some(ReportSeverity::Medium),
            description: String::new(),
            latitude: "1.0157".to_string(),
            longitude: "35.0062".to_string(),
        }
    }

    #[test]
    fn test_valid_report() {
        let report = filled().validate(3).unwrap();
        assert_eq!(report.user_id, 3);
        assert_eq!(report.severity, ReportSeverity::Medium);
        assert_eq!(report.latitude, Some(1.0157));
        assert_eq!(report.longitude, Some(35.0062));
        assert_eq!(report.description, None);
    }

    #[test]
    fn test_required_fields() {
        let errors = DiseaseReportForm::default().validate(3).unwrap_err();
        assert!(errors.has("location"));
        assert!(errors.has("disease"));
        assert!(errors.has("severity"));
        assert!(!errors.has("latitude"));
    }

    #[test]
    fn test_coordinates() {
        let form = DiseaseReportForm {
            latitude: "north".to_string(),
            longitude: "190".to_string(),
            ..filled()
        };
        let errors = form.validate(3).unwrap_err();
        assert_eq!(errors.first_for("latitude"), Some("Latitude must be a number"));
        assert_eq!(
            errors.first_for("longitude"),
            Some("Longitude must be between -180 and 180")
        );
    }
}
