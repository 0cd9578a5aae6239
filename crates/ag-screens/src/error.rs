use ag_client::FetchError;
use ag_core::ValidationErrors;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenError {
    #[error("Invalid input: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error("A submission is already in flight")]
    Busy,

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Backend error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Analysis failed during {stage}: {source}")]
    Analysis {
        stage: AnalysisStage,
        #[source]
        source: FetchError,
    },
}

pub type ScreenResult<T> = Result<T, ScreenError>;

/// Step of the analyze-then-persist sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    Analyze,
    Persist,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisStage::Analyze => write!(f, "analyze"),
            AnalysisStage::Persist => write!(f, "persist"),
        }
    }
}
