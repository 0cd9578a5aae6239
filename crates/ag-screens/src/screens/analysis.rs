//! Plant image analysis
//!
//! A submission runs two backend calls in sequence: the mocked classifier,
//! then the persist step. Either failing ends the submission as a whole; a
//! diagnosis whose persist step failed is not kept.

use super::Context;
use crate::error::{AnalysisStage, ScreenError, ScreenResult};
use crate::flow::{lock, Notice, SubmitGate};
use ag_core::contract::{AnalyzeImageRequest, AnalyzeImageResponse, PersistAnalysisRequest};
use ag_core::validation::{AnalysisForm, ImageSelection};
use ag_core::PlantAnalysis;
use serde::Serialize;
use std::sync::Mutex;
use tracing::{info, warn};

/// The classifier's answer and the record it was stored as
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub diagnosis: AnalyzeImageResponse,
    pub record: PlantAnalysis,
}

pub struct AnalysisScreen {
    ctx: Context,
    form: Mutex<AnalysisForm>,
    outcome: Mutex<Option<AnalysisOutcome>>,
    gate: SubmitGate,
}

impl AnalysisScreen {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            form: Mutex::new(AnalysisForm::default()),
            outcome: Mutex::new(None),
            gate: SubmitGate::new("analysis"),
        }
    }

    pub fn gate(&self) -> &SubmitGate {
        &self.gate
    }

    pub fn selected_image(&self) -> Option<ImageSelection> {
        lock(&self.form).image.clone()
    }

    /// Last successful analysis
    pub fn outcome(&self) -> Option<AnalysisOutcome> {
        lock(&self.outcome).clone()
    }

    pub fn select_image(&self, image: ImageSelection) {
        let description = format!("{} is ready for analysis", image.file_name);
        lock(&self.form).image = Some(image);
        *lock(&self.outcome) = None;
        self.gate.edited();
        self.gate.inform(Notice::info("Image selected", description));
    }

    pub fn clear_image(&self) {
        lock(&self.form).image = None;
        *lock(&self.outcome) = None;
        self.gate.edited();
    }

    pub async fn submit(&self) -> ScreenResult<AnalysisOutcome> {
        let request = lock(&self.form).validate().map_err(|errors| {
            self.gate.reject(
                errors,
                Some(Notice::destructive(
                    "No image selected",
                    "Please select an image to analyze",
                )),
            )
        })?;
        let user_id = self.ctx.session.user_id()?;
        let flight = self.gate.try_begin()?;

        let result = self.analyze_and_persist(user_id, &request).await;

        match result {
            Ok(outcome) => {
                info!(
                    "Analysis {} stored: {}",
                    outcome.record.id, outcome.diagnosis.diagnosis
                );
                *lock(&self.outcome) = Some(outcome.clone());
                flight.succeed(complete_notice(&outcome.diagnosis));
                Ok(outcome)
            }
            Err(e) => {
                warn!("{}", e);
                *lock(&self.outcome) = None;
                flight.fail(Notice::destructive(
                    "Analysis failed",
                    "There was an error analyzing your plant image",
                ));
                Err(e)
            }
        }
    }

    async fn analyze_and_persist(
        &self,
        user_id: i64,
        request: &AnalyzeImageRequest,
    ) -> ScreenResult<AnalysisOutcome> {
        let diagnosis = self
            .ctx
            .backend
            .analyze_image(request)
            .await
            .map_err(|source| ScreenError::Analysis {
                stage: AnalysisStage::Analyze,
                source,
            })?;

        let persist =
            PersistAnalysisRequest::from_diagnosis(user_id, &request.image_name, &diagnosis);
        let record = self
            .ctx
            .backend
            .persist_analysis(&persist)
            .await
            .map_err(|source| ScreenError::Analysis {
                stage: AnalysisStage::Persist,
                source,
            })?;

        Ok(AnalysisOutcome { diagnosis, record })
    }
}

fn complete_notice(diagnosis: &AnalyzeImageResponse) -> Notice {
    Notice::info(
        "Analysis complete",
        format!(
            "Diagnosis: {} ({}% confidence)",
            diagnosis.diagnosis, diagnosis.confidence
        ),
    )
}
