//! One headless view-model per screen

pub mod analysis;
pub mod feedback;
pub mod history;
pub mod mapping;
pub mod profile;
pub mod settings;
pub mod sign_in;
pub mod sign_up;

pub use analysis::{AnalysisOutcome, AnalysisScreen};
pub use feedback::FeedbackScreen;
pub use history::HistoryScreen;
pub use mapping::MappingScreen;
pub use profile::{ProfileScreen, ProfileStats};
pub use settings::{Preference, Preferences, SettingsScreen};
pub use sign_in::SignInScreen;
pub use sign_up::SignUpScreen;

use crate::session::Session;
use ag_client::Backend;
use std::sync::Arc;

/// What every screen is built from: the backend and the caller's session
#[derive(Clone)]
pub struct Context {
    pub backend: Arc<dyn Backend>,
    pub session: Arc<Session>,
}

impl Context {
    pub fn new(backend: Arc<dyn Backend>, session: Arc<Session>) -> Self {
        Self { backend, session }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Context;
    use crate::session::Session;
    use ag_client::{Backend, MemoryBackend};
    use ag_core::contract::SignInRequest;
    use std::sync::Arc;

    /// Seeded backend with the demo user signed in
    pub async fn signed_in() -> (Arc<MemoryBackend>, Context) {
        let backend = Arc::new(MemoryBackend::seeded_demo());
        let profile = backend
            .sign_in(&SignInRequest {
                username: "demo".to_string(),
                password: "aloeguard".to_string(),
            })
            .await
            .unwrap();
        let ctx = Context::new(backend.clone(), Arc::new(Session::signed_in(profile)));
        (backend, ctx)
    }

    /// Seeded backend and an empty session
    pub fn signed_out() -> (Arc<MemoryBackend>, Context) {
        let backend = Arc::new(MemoryBackend::seeded_demo());
        let ctx = Context::new(backend.clone(), Arc::new(Session::new()));
        (backend, ctx)
    }
}
