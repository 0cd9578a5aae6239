//! AloeGuard screen state machines
//!
//! Headless view-models for each screen of the application. A renderer (the
//! CLI in this workspace) reads their state and forwards user edits; the
//! screens validate input, call the backend and expose notices.

pub mod error;
pub mod flow;
pub mod screens;
pub mod session;

pub use error::{AnalysisStage, ScreenError, ScreenResult};
pub use flow::{Listing, ListingState, Notice, Phase, SubmitGate, Tone};
pub use screens::{
    AnalysisOutcome, AnalysisScreen, Context, FeedbackScreen, HistoryScreen, MappingScreen,
    Preference, Preferences, ProfileScreen, ProfileStats, SettingsScreen, SignInScreen,
    SignUpScreen,
};
pub use session::{Session, SignOutAction};
