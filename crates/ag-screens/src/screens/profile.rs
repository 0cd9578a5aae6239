use super::Context;
use crate::error::ScreenResult;
use crate::flow::{Listing, ListingState, Notice};
use crate::session::SignOutAction;
use ag_core::{PlantAnalysis, UserProfile};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Counters shown on the profile, derived from the user's history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProfileStats {
    pub plants_analyzed: usize,
    pub diseases_detected: usize,
    pub healthy_plants: usize,
    pub days_active: usize,
}

impl ProfileStats {
    pub fn from_history(history: &[PlantAnalysis]) -> Self {
        let healthy_plants = history.iter().filter(|a| a.is_healthy).count();
        let days: BTreeSet<_> = history
            .iter()
            .filter_map(|a| a.created_at.map(|t| t.date_naive()))
            .collect();
        Self {
            plants_analyzed: history.len(),
            diseases_detected: history.len() - healthy_plants,
            healthy_plants,
            days_active: days.len(),
        }
    }
}

pub struct ProfileScreen {
    ctx: Context,
    history: Listing<PlantAnalysis>,
    sign_out: SignOutAction,
}

impl ProfileScreen {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            history: Listing::new("profile-stats"),
            sign_out: SignOutAction::default(),
        }
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.ctx.session.current()
    }

    pub fn display_name(&self) -> String {
        display_name(self.user().as_ref())
    }

    pub fn avatar_initial(&self) -> char {
        avatar_initial(self.user().as_ref())
    }

    /// Month and year the account was created, e.g. "March 2024"
    pub fn member_since(&self) -> Option<String> {
        self.user()
            .and_then(|u| u.created_at)
            .map(|t| t.format("%B %Y").to_string())
    }

    pub fn stats_state(&self) -> ListingState<PlantAnalysis> {
        self.history.state()
    }

    pub fn stats(&self) -> Option<ProfileStats> {
        self.history
            .items()
            .map(|items| ProfileStats::from_history(&items))
    }

    pub async fn load_stats(&self) -> ScreenResult<ProfileStats> {
        let user_id = self.ctx.session.user_id()?;
        let load = self.history.begin()?;
        match self.ctx.backend.list_analyses(user_id).await {
            Ok(history) => {
                let stats = ProfileStats::from_history(&history);
                load.finish(history);
                Ok(stats)
            }
            Err(e) => {
                warn!("Failed to load profile stats: {}", e);
                load.fail(Notice::destructive(
                    "Failed to load stats",
                    "There was an error loading your activity",
                ));
                Err(e.into())
            }
        }
    }

    pub fn sign_out_action(&self) -> &SignOutAction {
        &self.sign_out
    }

    pub async fn sign_out(&self) -> ScreenResult<()> {
        self.sign_out
            .run(&self.ctx.session, self.ctx.backend.as_ref())
            .await
    }
}

/// First and last name when both are present, else the username, else "User"
pub fn display_name(user: Option<&UserProfile>) -> String {
    let Some(user) = user else {
        return "User".to_string();
    };
    match (user.first_name.as_deref(), user.last_name.as_deref()) {
        (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
            format!("{} {}", first, last)
        }
        _ if !user.username.is_empty() => user.username.clone(),
        _ => "User".to_string(),
    }
}

/// Upper-cased first letter of the username, else 'U'
pub fn avatar_initial(user: Option<&UserProfile>) -> char {
    user.and_then(|u| u.username.chars().next())
        .and_then(|c| c.to_uppercase().next())
        .unwrap_or('U')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::testing;
    use chrono::{TimeZone, Utc};

    fn profile(first: Option<&str>, last: Option<&str>, username: &str) -> UserProfile {
        UserProfile {
            id: 1,
            username: username.to_string(),
            email: None,
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).single(),
        }
    }

    #[test]
    fn test_display_name_fallbacks() {
        let both = profile(Some("Fern"), Some("Gully"), "fern");
        assert_eq!(display_name(Some(&both)), "Fern Gully");

        let first_only = profile(Some("Fern"), None, "fern");
        assert_eq!(display_name(Some(&first_only)), "fern");

        assert_eq!(display_name(None), "User");
        assert_eq!(avatar_initial(None), 'U');
    }

    #[test]
    fn test_avatar_initial_uses_username() {
        let user = profile(Some("Fern"), Some("Gully"), "zed");
        assert_eq!(display_name(Some(&user)), "Fern Gully");
        assert_eq!(avatar_initial(Some(&user)), 'Z');

        let unnamed = profile(Some("Fern"), Some("Gully"), "");
        assert_eq!(avatar_initial(Some(&unnamed)), 'U');
    }

    #[tokio::test]
    async fn test_profile_stats() {
        let (_, ctx) = testing::signed_in().await;
        let screen = ProfileScreen::new(ctx);
        assert_eq!(screen.display_name(), "Demo Grower");
        assert_eq!(screen.avatar_initial(), 'D');
        assert_eq!(screen.member_since().as_deref(), Some("January 2024"));

        let stats = screen.load_stats().await.unwrap();
        assert_eq!(stats.plants_analyzed, 3);
        assert_eq!(stats.healthy_plants + stats.diseases_detected, 3);
        assert_eq!(stats.days_active, 3);
        assert_eq!(screen.stats(), Some(stats));
    }

    #[tokio::test]
    async fn test_sign_out_from_profile() {
        let (_, ctx) = testing::signed_in().await;
        let screen = ProfileScreen::new(ctx.clone());
        screen.sign_out().await.unwrap();
        assert!(!ctx.session.is_signed_in());
        assert_eq!(screen.display_name(), "User");
    }
}
