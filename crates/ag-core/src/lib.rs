//! AloeGuard core data model
//!
//! This crate provides the record shapes shared by every screen, the
//! per-form validation rules, and the request/response contract spoken with
//! the backend.

pub mod contract;
pub mod models;
pub mod validation;

use thiserror::Error;

pub use models::{
    conform, conform_insert, DiseaseReport, Insertable, NewDiseaseReport, NewPlantAnalysis,
    NewUser, NewUserFeedback, PlantAnalysis, PlantSeverity, ReportSeverity, User, UserFeedback,
    UserProfile,
};
pub use validation::{FieldError, ValidationErrors};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// A candidate record that does not have the structure of the expected shape
#[derive(Error, Debug)]
#[error("record does not match {shape}: {source}")]
pub struct SchemaError {
    pub shape: &'static str,
    #[source]
    pub source: serde_json::Error,
}
