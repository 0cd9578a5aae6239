use super::Context;
use crate::error::ScreenResult;
use crate::flow::{lock, Notice, SubmitGate};
use ag_core::validation::SignInForm;
use ag_core::UserProfile;
use std::sync::Mutex;
use tracing::warn;

pub struct SignInScreen {
    ctx: Context,
    form: Mutex<SignInForm>,
    gate: SubmitGate,
}

impl SignInScreen {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            form: Mutex::new(SignInForm::default()),
            gate: SubmitGate::new("sign-in"),
        }
    }

    pub fn gate(&self) -> &SubmitGate {
        &self.gate
    }

    pub fn form(&self) -> SignInForm {
        lock(&self.form).clone()
    }

    pub fn set_username(&self, username: impl Into<String>) {
        lock(&self.form).username = username.into();
        self.gate.edited();
    }

    pub fn set_password(&self, password: impl Into<String>) {
        lock(&self.form).password = password.into();
        self.gate.edited();
    }

    pub async fn submit(&self) -> ScreenResult<UserProfile> {
        let request = self
            .form()
            .validate()
            .map_err(|errors| self.gate.reject(errors, None))?;
        let flight = self.gate.try_begin()?;

        match self.ctx.backend.sign_in(&request).await {
            Ok(profile) => {
                self.ctx.session.establish(profile.clone());
                flight.succeed(Notice::info(
                    "Welcome back!",
                    "You have successfully signed in.",
                ));
                Ok(profile)
            }
            Err(e) => {
                warn!("Sign in failed: {}", e);
                let description = if e.is_client_error() {
                    "Invalid credentials. Please try again."
                } else {
                    "Unable to reach the server. Please try again."
                };
                flight.fail(Notice::destructive("Sign in failed", description));
                Err(e.into())
            }
        }
    }
}
