//! Form validation
//!
//! Each form type turns raw user input into a request payload, or into an
//! ordered list of field-scoped messages. Field names are the wire names so a
//! renderer can attach messages next to the matching input.

pub mod analysis;
pub mod auth;
pub mod feedback;
pub mod report;

pub use analysis::{AnalysisForm, ImageSelection};
pub use auth::{SignInForm, SignUpForm};
pub use feedback::FeedbackForm;
pub use report::DiseaseReportForm;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// A message attached to one form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Ordered field errors of a rejected form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single error on one field
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// All messages recorded for a field, in order
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.errors
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// First message recorded for a field
    pub fn first_for<'a>(&'a self, field: &'a str) -> Option<&'a str> {
        self.for_field(field).next()
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z0-9_'+\-.]*[a-z0-9_+\-]@([a-z0-9][a-z0-9\-]*\.)+[a-z]{2,}$")
        .expect("Failed to compile email pattern")
});

/// Email address syntax check
pub fn is_valid_email(candidate: &str) -> bool {
    let local = candidate.split('@').next().unwrap_or_default();
    !local.starts_with('.') && !local.contains("..") && EMAIL_PATTERN.is_match(candidate)
}

/// Empty text becomes absent
pub(crate) fn optional_text(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_syntax() {
        assert!(is_valid_email("grower@aloeguard.app"));
        assert!(is_valid_email("first.last+tag@farm.co.ke"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email(".lead@farm.com"));
        assert!(!is_valid_email("double..dot@farm.com"));
        assert!(!is_valid_email("trailing.@farm.com"));
    }

    #[test]
    fn test_errors_keep_order() {
        let mut errors = ValidationErrors::new();
        errors.push("username", "Username must be at least 3 characters");
        errors.push("password", "Password must be at least 6 characters");
        errors.push("username", "second");

        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["username", "password", "username"]);
        assert_eq!(
            errors.first_for("username"),
            Some("Username must be at least 3 characters")
        );
        assert_eq!(errors.for_field("username").count(), 2);
        assert!(!errors.has("email"));
    }

    #[test]
    fn test_first_for_with_runtime_field_name() {
        let errors = ValidationErrors::single("confirmPassword", "Passwords don't match");
        let field = String::from("confirmPassword");
        let message = errors.first_for(&field);
        assert_eq!(message, Some("Passwords don't match"));
        assert_eq!(errors.first_for("email"), None);
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(""), None);
        assert_eq!(optional_text("note").as_deref(), Some("note"));
    }
}
