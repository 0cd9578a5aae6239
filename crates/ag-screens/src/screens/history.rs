use super::Context;
use crate::error::ScreenResult;
use crate::flow::{Listing, ListingState, Notice};
use ag_core::contract::AnalysisStatus;
use ag_core::{PlantAnalysis, PlantSeverity};
use tracing::warn;

pub const EMPTY_STATE_MESSAGE: &str = "No analysis history available yet.";
pub const EMPTY_STATE_ACTION: &str = "Start First Analysis";

/// The signed-in user's past analyses, in backend order
pub struct HistoryScreen {
    ctx: Context,
    listing: Listing<PlantAnalysis>,
}

impl HistoryScreen {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            listing: Listing::new("history"),
        }
    }

    pub fn state(&self) -> ListingState<PlantAnalysis> {
        self.listing.state()
    }

    pub fn entries(&self) -> Option<Vec<PlantAnalysis>> {
        self.listing.items()
    }

    pub fn shows_empty_state(&self) -> bool {
        self.listing.is_empty_loaded()
    }

    pub async fn load(&self) -> ScreenResult<Vec<PlantAnalysis>> {
        let user_id = self.ctx.session.user_id()?;
        let load = self.listing.begin()?;

        match self.ctx.backend.list_analyses(user_id).await {
            Ok(analyses) => {
                load.finish(analyses.clone());
                Ok(analyses)
            }
            Err(e) => {
                warn!("Failed to load history: {}", e);
                load.fail(Notice::destructive(
                    "Failed to load history",
                    "There was an error loading your analysis history",
                ));
                Err(e.into())
            }
        }
    }
}

/// Health badge for a stored analysis
pub fn display_status(analysis: &PlantAnalysis) -> AnalysisStatus {
    if analysis.is_healthy {
        return AnalysisStatus::Good;
    }
    match analysis.severity {
        Some(PlantSeverity::High) => AnalysisStatus::Danger,
        Some(_) => AnalysisStatus::Warning,
        None => AnalysisStatus::Unknown,
    }
}
