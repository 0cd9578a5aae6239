//! Disease map
//!
//! Lists community disease reports and carries the report-a-case form.

use super::Context;
use crate::error::ScreenResult;
use crate::flow::{lock, Listing, ListingState, Notice, SubmitGate};
use ag_core::validation::DiseaseReportForm;
use ag_core::{DiseaseReport, ReportSeverity};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::warn;

pub const REPORT_ACTION: &str = "Report New Case";

pub struct MappingScreen {
    ctx: Context,
    reports: Listing<DiseaseReport>,
    form: Mutex<DiseaseReportForm>,
    gate: SubmitGate,
}

impl MappingScreen {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            reports: Listing::new("disease-reports"),
            form: Mutex::new(DiseaseReportForm::default()),
            gate: SubmitGate::new("report-case"),
        }
    }

    pub fn state(&self) -> ListingState<DiseaseReport> {
        self.reports.state()
    }

    pub fn reports(&self) -> Option<Vec<DiseaseReport>> {
        self.reports.items()
    }

    /// Number of loaded reports per severity
    pub fn severity_counts(&self) -> BTreeMap<ReportSeverity, usize> {
        let mut counts = BTreeMap::new();
        for report in self.reports().unwrap_or_default() {
            *counts.entry(report.severity).or_insert(0) += 1;
        }
        counts
    }

    pub async fn load(&self) -> ScreenResult<Vec<DiseaseReport>> {
        let load = self.reports.begin()?;
        match self.ctx.backend.list_disease_reports().await {
            Ok(reports) => {
                load.finish(reports.clone());
                Ok(reports)
            }
            Err(e) => {
                warn!("Failed to load disease reports: {}", e);
                load.fail(Notice::destructive(
                    "Failed to load reports",
                    "There was an error loading disease reports",
                ));
                Err(e.into())
            }
        }
    }

    pub fn gate(&self) -> &SubmitGate {
        &self.gate
    }

    pub fn form(&self) -> DiseaseReportForm {
        lock(&self.form).clone()
    }

    pub fn edit(&self, change: impl FnOnce(&mut DiseaseReportForm)) {
        change(&mut lock(&self.form));
        self.gate.edited();
    }

    /// Submit the report form; on success the form is cleared
    pub async fn submit_report(&self) -> ScreenResult<DiseaseReport> {
        let user_id = self.ctx.session.user_id()?;
        let report = self
            .form()
            .validate(user_id)
            .map_err(|errors| self.gate.reject(errors, None))?;
        let flight = self.gate.try_begin()?;

        match self.ctx.backend.create_disease_report(&report).await {
            Ok(created) => {
                lock(&self.form).clear();
                self.reports.push(created.clone());
                flight.succeed(Notice::info(
                    "Report submitted",
                    format!("Thank you for reporting {} in {}", created.disease, created.location),
                ));
                Ok(created)
            }
            Err(e) => {
                warn!("Failed to submit disease report: {}", e);
                flight.fail(Notice::destructive(
                    "Report failed",
                    "There was an error submitting your report",
                ));
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::Phase;
    use crate::screens::testing;
    use ag_client::Operation;

    fn fill(form: &mut DiseaseReportForm) {
        form.location = "Kisumu".to_string();
        form.disease = "Aloe Rust".to_string();
        form.severity = Some(ReportSeverity::High);
    }

    #[tokio::test]
    async fn test_reload_without_writes_is_stable() {
        let (backend, ctx) = testing::signed_out();
        let screen = MappingScreen::new(ctx);
        let first = screen.load().await.unwrap();
        let second = screen.load().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.calls(Operation::ListDiseaseReports), 2);

        let counts = screen.severity_counts();
        assert_eq!(counts.get(&ReportSeverity::High), Some(&1));
        assert_eq!(counts.values().sum::<usize>(), 3);
    }

    #[tokio::test]
    async fn test_report_clears_form_and_extends_listing() {
        let (_, ctx) = testing::signed_in().await;
        let screen = MappingScreen::new(ctx);
        screen.load().await.unwrap();
        screen.edit(fill);

        let created = screen.submit_report().await.unwrap();
        assert_eq!(created.location, "Kisumu");
        assert_eq!(screen.form(), DiseaseReportForm::default());
        assert_eq!(screen.reports().unwrap().len(), 4);
        assert_eq!(screen.gate().phase(), Phase::Succeeded);
    }

    #[tokio::test]
    async fn test_failed_report_keeps_form() {
        let (backend, ctx) = testing::signed_in().await;
        let screen = MappingScreen::new(ctx);
        screen.edit(fill);
        backend.fail_next(Operation::CreateDiseaseReport, 500);

        assert!(screen.submit_report().await.is_err());
        assert_eq!(screen.form().location, "Kisumu");
        assert_eq!(screen.gate().notice().unwrap().title, "Report failed");
    }

    #[tokio::test]
    async fn test_invalid_report_makes_no_call() {
        let (backend, ctx) = testing::signed_in().await;
        let screen = MappingScreen::new(ctx);
        assert!(screen.submit_report().await.is_err());
        assert!(screen.gate().errors().has("location"));
        assert_eq!(backend.calls(Operation::CreateDiseaseReport), 0);
    }
}
