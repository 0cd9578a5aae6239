//! Sign-in and sign-up forms

use super::{is_valid_email, optional_text, ValidationErrors};
use crate::contract::SignInRequest;
use crate::models::NewUser;
use serde::{Deserialize, Serialize};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Raw sign-in input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignInForm {
    pub username: String,
    pub password: String,
}

impl SignInForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<SignInRequest, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.username.is_empty() {
            errors.push("username", "Username is required");
        }
        if self.password.is_empty() {
            errors.push("password", "Password is required");
        }
        errors.into_result()?;

        Ok(SignInRequest {
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }
}

/// Raw sign-up input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
}

impl SignUpForm {
    /// Check every rule and build the sign-up request.
    ///
    /// The password confirmation is compared even when other fields fail, so
    /// every problem is reported in one pass.
    pub fn validate(&self) -> Result<NewUser, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.username.chars().count() < MIN_USERNAME_LEN {
            errors.push(
                "username",
                format!("Username must be at least {} characters", MIN_USERNAME_LEN),
            );
        }
        if !self.email.is_empty() && !is_valid_email(&self.email) {
            errors.push("email", "Invalid email address");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            );
        }
        if self.confirm_password != self.password {
            errors.push("confirmPassword", "Passwords don't match");
        }
        errors.into_result()?;

        Ok(NewUser {
            username: self.username.clone(),
            password: self.password.clone(),
            email: optional_text(&self.email),
            first_name: optional_text(&self.first_name),
            last_name: optional_text(&self.last_name),
        })
    }
}
