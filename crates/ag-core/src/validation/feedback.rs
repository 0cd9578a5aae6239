//! Feedback form

use super::{optional_text, ValidationErrors};
use crate::models::NewUserFeedback;
use serde::{Deserialize, Serialize};

/// Star rating and comment; a rating of 0 means no star is selected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackForm {
    pub rating: u8,
    pub comment: String,
}

impl FeedbackForm {
    pub fn is_rated(&self) -> bool {
        self.rating != 0
    }

    /// Reset to no rating and an empty comment
    pub fn clear(&mut self) {
        self.rating = 0;
        self.comment.clear();
    }

    pub fn validate(
        &self,
        user_id: i64,
        analysis_id: i64,
    ) -> Result<NewUserFeedback, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !self.is_rated() {
            errors.push("rating", "Please provide a rating before submitting");
        } else if self.rating > 5 {
            errors.push("rating", "Rating must be between 1 and 5");
        }
        if analysis_id <= 0 {
            errors.push("analysisId", "Please choose an analysis to rate");
        }
        errors.into_result()?;

        Ok(NewUserFeedback {
            user_id,
            analysis_id,
            rating: i32::from(self.rating),
            comment: optional_text(&self.comment),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrated_is_rejected() {
        let errors = FeedbackForm::default().validate(1, 2).unwrap_err();
        assert_eq!(
            errors.first_for("rating"),
            Some("Please provide a rating before submitting")
        );
    }

    #[test]
    fn test_every_star_is_accepted() {
        for rating in 1..=5 {
            let form = FeedbackForm {
                rating,
                comment: String::new(),
            };
            let feedback = form.validate(1, 2).unwrap();
            assert_eq!(feedback.rating, i32::from(rating));
            assert_eq!(feedback.comment, None);
        }
        let form = FeedbackForm {
            rating: 6,
            comment: String::new(),
        };
        assert!(form.validate(1, 2).is_err());
    }

    #[test]
    fn test_missing_analysis_is_rejected() {
        let form = FeedbackForm {
            rating: 3,
            comment: String::new(),
        };
        let errors = form.validate(1, 0).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.first_for("analysisId"),
            Some("Please choose an analysis to rate")
        );

        let errors = FeedbackForm::default().validate(1, -4).unwrap_err();
        assert!(errors.has("rating"));
        assert!(errors.has("analysisId"));
    }

    #[test]
    fn test_clear() {
        let mut form = FeedbackForm {
            rating: 4,
            comment: "Spot on".to_string(),
        };
        assert_eq!(form.validate(1, 2).unwrap().comment.as_deref(), Some("Spot on"));
        form.clear();
        assert_eq!(form, FeedbackForm::default());
    }
}
