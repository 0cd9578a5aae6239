use super::Context;
use crate::error::ScreenResult;
use crate::flow::{lock, Notice, SubmitGate};
use ag_core::validation::FeedbackForm;
use ag_core::UserFeedback;
use std::sync::Mutex;
use tracing::warn;

/// Star rating and comment on one analysis
pub struct FeedbackScreen {
    ctx: Context,
    analysis_id: i64,
    form: Mutex<FeedbackForm>,
    gate: SubmitGate,
}

impl FeedbackScreen {
    pub fn new(ctx: Context, analysis_id: i64) -> Self {
        Self {
            ctx,
            analysis_id,
            form: Mutex::new(FeedbackForm::default()),
            gate: SubmitGate::new("feedback"),
        }
    }

    pub fn analysis_id(&self) -> i64 {
        self.analysis_id
    }

    pub fn gate(&self) -> &SubmitGate {
        &self.gate
    }

    pub fn form(&self) -> FeedbackForm {
        lock(&self.form).clone()
    }

    pub fn set_rating(&self, rating: u8) {
        lock(&self.form).rating = rating;
        self.gate.edited();
    }

    pub fn set_comment(&self, comment: impl Into<String>) {
        lock(&self.form).comment = comment.into();
        self.gate.edited();
    }

    pub async fn submit(&self) -> ScreenResult<UserFeedback> {
        let user_id = self.ctx.session.user_id()?;
        let feedback = self
            .form()
            .validate(user_id, self.analysis_id)
            .map_err(|errors| {
                let notice = if errors.has("rating") {
                    Notice::destructive(
                        "Rating required",
                        "Please provide a rating before submitting",
                    )
                } else {
                    Notice::destructive(
                        "No analysis selected",
                        "Please choose an analysis to rate",
                    )
                };
                self.gate.reject(errors, Some(notice))
            })?;
        let flight = self.gate.try_begin()?;

        match self.ctx.backend.submit_feedback(&feedback).await {
            Ok(stored) => {
                lock(&self.form).clear();
                flight.succeed(Notice::info(
                    "Thank you!",
                    "Your feedback has been submitted successfully",
                ));
                Ok(stored)
            }
            Err(e) => {
                warn!("Failed to submit feedback: {}", e);
                flight.fail(Notice::destructive(
                    "Submission failed",
                    "There was an error submitting your feedback",
                ));
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScreenError;
    use crate::flow::Phase;
    use crate::screens::testing;
    use ag_client::Operation;

    #[tokio::test]
    async fn test_unrated_is_rejected_locally() {
        let (backend, ctx) = testing::signed_in().await;
        let screen = FeedbackScreen::new(ctx, 2);
        screen.set_comment("Looks right");

        assert!(matches!(screen.submit().await, Err(ScreenError::Invalid(_))));
        assert_eq!(screen.gate().notice().unwrap().title, "Rating required");
        assert_eq!(backend.calls(Operation::SubmitFeedback), 0);
    }

    #[tokio::test]
    async fn test_missing_analysis_is_rejected_locally() {
        let (backend, ctx) = testing::signed_in().await;
        let screen = FeedbackScreen::new(ctx, 0);
        screen.set_rating(3);

        match screen.submit().await {
            Err(ScreenError::Invalid(errors)) => assert!(errors.has("analysisId")),
            other => panic!("expected invalid feedback, got {:?}", other),
        }
        assert_eq!(screen.gate().notice().unwrap().title, "No analysis selected");
        assert_eq!(screen.gate().phase(), Phase::Idle);
        assert_eq!(backend.calls(Operation::SubmitFeedback), 0);
    }

    #[tokio::test]
    async fn test_success_clears_fields() {
        let (backend, ctx) = testing::signed_in().await;
        let screen = FeedbackScreen::new(ctx, 2);
        screen.set_rating(4);
        screen.set_comment("Accurate diagnosis");

        let stored = screen.submit().await.unwrap();
        assert_eq!(stored.analysis_id, 2);
        assert_eq!(stored.comment.as_deref(), Some("Accurate diagnosis"));
        assert_eq!(screen.form(), FeedbackForm::default());
        assert_eq!(screen.gate().notice().unwrap().title, "Thank you!");
        assert_eq!(backend.feedback().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_fields() {
        let (backend, ctx) = testing::signed_in().await;
        let screen = FeedbackScreen::new(ctx, 2);
        screen.set_rating(5);
        screen.set_comment("Great");
        backend.fail_next(Operation::SubmitFeedback, 500);

        assert!(screen.submit().await.is_err());
        assert_eq!(screen.form().rating, 5);
        assert_eq!(screen.form().comment, "Great");
        assert_eq!(screen.gate().phase(), Phase::Failed);
        assert_eq!(screen.gate().notice().unwrap().title, "Submission failed");

        screen.set_rating(4);
        assert_eq!(screen.gate().phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_single_flight() {
        let (backend, ctx) = testing::signed_in().await;
        let screen = FeedbackScreen::new(ctx, 2);
        screen.set_rating(3);
        let latch = backend.hold(Operation::SubmitFeedback);

        let (first, second) = tokio::join!(screen.submit(), async {
            tokio::task::yield_now().await;
            let second = screen.submit().await;
            latch.notify_one();
            second
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(ScreenError::Busy)));
        assert_eq!(backend.calls(Operation::SubmitFeedback), 1);
    }

    #[tokio::test]
    async fn test_dropped_submission_frees_gate() {
        let (backend, ctx) = testing::signed_in().await;
        let screen = FeedbackScreen::new(ctx, 2);
        screen.set_rating(3);
        let _latch = backend.hold(Operation::SubmitFeedback);

        {
            let pending = screen.submit();
            tokio::pin!(pending);
            assert!(poll_once(pending.as_mut()).await.is_none());
            assert!(screen.gate().is_submitting());
        }
        assert_eq!(screen.gate().phase(), Phase::Idle);
    }

    async fn poll_once<F: std::future::Future + Unpin>(fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            out = fut => Some(out),
            _ = std::future::ready(()) => None,
        }
    }
}
