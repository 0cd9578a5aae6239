//! Feedback on analyses

use super::Insertable;
use crate::validation::ValidationErrors;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted rating of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFeedback {
    pub id: i64,
    pub user_id: i64,
    pub analysis_id: i64,
    pub rating: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert shape for `user_feedback`, also the feedback request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUserFeedback {
    pub user_id: i64,
    pub analysis_id: i64,
    pub rating: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Insertable for NewUserFeedback {
    const TABLE: &'static str = "user_feedback";

    fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.user_id <= 0 {
            errors.push("userId", "User id must be positive");
        }
        if self.analysis_id <= 0 {
            errors.push("analysisId", "Analysis id must be positive");
        }
        if !(1..=5).contains(&self.rating) {
            errors.push("rating", "Rating must be between 1 and 5");
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
    fn test_analysis_id_is_required() {
        let result = conform_insert::<NewUserFeedback>(&json!({ "userId": 1, "rating": 4 }));
        assert!(matches!(result, Err(crate::CoreError::Schema(_))));
    }

    #[test]
    fn test_comment_is_optional() {
        let feedback: NewUserFeedback =
            conform_insert(&json!({ "userId": 1, "analysisId": 3, "rating": 5 })).unwrap();
        assert_eq!(feedback.comment, None);

        let wire = serde_json::to_value(&feedback).unwrap();
        assert_eq!(wire, json!({ "userId": 1, "analysisId": 3, "rating": 5 }));
    }
}
