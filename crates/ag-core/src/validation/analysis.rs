//! Image upload form

use super::ValidationErrors;
use crate::contract::AnalyzeImageRequest;
use serde::{Deserialize, Serialize};

/// A picked image file; only its name is ever sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSelection {
    pub file_name: String,
    pub size_bytes: u64,
}

impl ImageSelection {
    pub fn new(file_name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            file_name: file_name.into(),
            size_bytes,
        }
    }

    /// Size in megabytes, for display
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisForm {
    pub image: Option<ImageSelection>,
}

impl AnalysisForm {
    pub fn validate(&self) -> Result<AnalyzeImageRequest, ValidationErrors> {
        match &self.image {
            Some(image) => Ok(AnalyzeImageRequest {
                image_name: image.file_name.clone(),
            }),
            None => Err(ValidationErrors::single(
                "image",
                "Please select an image to analyze",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_required() {
        let errors = AnalysisForm::default().validate().unwrap_err();
        assert_eq!(errors.first_for("image"), Some("Please select an image to analyze"));
    }

    #[test]
    fn test_any_file_is_accepted() {
        let form = AnalysisForm {
            image: Some(ImageSelection::new("notes.txt", 0)),
        };
        assert_eq!(form.validate().unwrap().image_name, "notes.txt");
    }

    #[test]
    fn test_size_mb() {
        let image = ImageSelection::new("aloe.jpg", 3 * 1024 * 1024 / 2);
        assert!((image.size_mb() - 1.5).abs() < f64::EPSILON);
    }
}
