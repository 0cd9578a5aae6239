use super::Context;
use crate::error::ScreenResult;
use crate::flow::{lock, Notice, SubmitGate};
use ag_core::validation::SignUpForm;
use ag_core::{UserProfile, ValidationErrors};
use std::sync::Mutex;
use tracing::warn;

pub struct SignUpScreen {
    ctx: Context,
    form: Mutex<SignUpForm>,
    gate: SubmitGate,
}

impl SignUpScreen {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            form: Mutex::new(SignUpForm::default()),
            gate: SubmitGate::new("sign-up"),
        }
    }

    pub fn gate(&self) -> &SubmitGate {
        &self.gate
    }

    pub fn form(&self) -> SignUpForm {
        lock(&self.form).clone()
    }

    /// Apply an edit to the form
    pub fn edit(&self, change: impl FnOnce(&mut SignUpForm)) {
        change(&mut lock(&self.form));
        self.gate.edited();
    }

    pub async fn submit(&self) -> ScreenResult<UserProfile> {
        let request = self
            .form()
            .validate()
            .map_err(|errors| self.gate.reject(errors, None))?;
        let flight = self.gate.try_begin()?;

        match self.ctx.backend.sign_up(&request).await {
            Ok(profile) => {
                self.ctx.session.establish(profile.clone());
                flight.succeed(Notice::info(
                    "Account created!",
                    "Welcome to AloeGuard. You can now start analyzing plants.",
                ));
                Ok(profile)
            }
            Err(e) => {
                warn!("Sign up failed: {}", e);
                let notice = Notice::destructive(
                    "Sign up failed",
                    "Failed to create account. Please try again.",
                );
                if e.is_conflict() {
                    flight.fail_with(
                        notice,
                        ValidationErrors::single("username", "Username is already taken"),
                    );
                } else {
                    flight.fail(notice);
                }
                Err(e.into())
            }
        }
    }
}
