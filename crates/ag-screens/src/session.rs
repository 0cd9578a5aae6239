//! Signed-in user context
//!
//! A [`Session`] is created by the caller and handed to every screen; there
//! is no global user. Screens that act on behalf of a user read the id from
//! it and fail with [`ScreenError::NotSignedIn`] before touching the network.

use crate::error::{ScreenError, ScreenResult};
use crate::flow::{lock, Notice, SubmitGate};
use ag_client::Backend;
use ag_core::UserProfile;
use std::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct Session {
    user: Mutex<Option<UserProfile>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(profile: UserProfile) -> Self {
        Self {
            user: Mutex::new(Some(profile)),
        }
    }

    pub fn current(&self) -> Option<UserProfile> {
        lock(&self.user).clone()
    }

    pub fn is_signed_in(&self) -> bool {
        lock(&self.user).is_some()
    }

    pub fn user_id(&self) -> ScreenResult<i64> {
        lock(&self.user)
            .as_ref()
            .map(|u| u.id)
            .ok_or(ScreenError::NotSignedIn)
    }

    pub fn establish(&self, profile: UserProfile) {
        info!("Session established for {}", profile.username);
        *lock(&self.user) = Some(profile);
    }

    pub fn clear(&self) {
        *lock(&self.user) = None;
    }

    /// Ask the backend who is signed in.
    ///
    /// A 401 leaves the session empty and is not an error.
    pub async fn restore(&self, backend: &dyn Backend) -> ScreenResult<Option<UserProfile>> {
        match backend.current_user().await {
            Ok(profile) => {
                self.establish(profile.clone());
                Ok(Some(profile))
            }
            Err(e) if e.is_unauthorized() => {
                self.clear();
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// End the session on the backend, then locally
    ///
    /// On failure the local session is kept.
    pub async fn sign_out(&self, backend: &dyn Backend) -> ScreenResult<()> {
        backend.sign_out().await?;
        self.clear();
        info!("Session ended");
        Ok(())
    }
}

/// Sign-out button shared by the profile and settings screens
#[derive(Debug)]
pub struct SignOutAction {
    gate: SubmitGate,
}

impl Default for SignOutAction {
    fn default() -> Self {
        Self {
            gate: SubmitGate::new("sign-out"),
        }
    }
}

impl SignOutAction {
    pub fn gate(&self) -> &SubmitGate {
        &self.gate
    }

    pub async fn run(&self, session: &Session, backend: &dyn Backend) -> ScreenResult<()> {
        let flight = self.gate.try_begin()?;
        match session.sign_out(backend).await {
            Ok(()) => {
                flight.succeed(Notice::info(
                    "Signed out",
                    "You have been successfully signed out.",
                ));
                Ok(())
            }
            Err(e) => {
                warn!("Sign out failed: {}", e);
                flight.fail(Notice::destructive(
                    "Sign out failed",
                    "Failed to sign out. Please try again.",
                ));
                Err(e)
            }
        }
    }
}
