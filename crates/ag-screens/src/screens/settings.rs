use super::Context;
use crate::error::ScreenResult;
use crate::flow::lock;
use crate::session::SignOutAction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use tracing::info;

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preference {
    PushNotifications,
    DiseaseAlerts,
    MaintenanceReminders,
    DataSharing,
    LocationServices,
}

impl Preference {
    pub const ALL: [Preference; 5] = [
        Preference::PushNotifications,
        Preference::DiseaseAlerts,
        Preference::MaintenanceReminders,
        Preference::DataSharing,
        Preference::LocationServices,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Preference::PushNotifications => "Push Notifications",
            Preference::DiseaseAlerts => "Disease Alerts",
            Preference::MaintenanceReminders => "Maintenance Reminders",
            Preference::DataSharing => "Data Sharing",
            Preference::LocationServices => "Location Services",
        }
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Local preference toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub push_notifications: bool,
    pub disease_alerts: bool,
    pub maintenance_reminders: bool,
    pub data_sharing: bool,
    pub location_services: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            push_notifications: true,
            disease_alerts: true,
            maintenance_reminders: false,
            data_sharing: true,
            location_services: false,
        }
    }
}

impl Preferences {
    pub fn get(&self, preference: Preference) -> bool {
        *self.slot(preference)
    }

    pub fn set(&mut self, preference: Preference, enabled: bool) {
        *self.slot_mut(preference) = enabled;
    }

    fn slot(&self, preference: Preference) -> &bool {
        match preference {
            Preference::PushNotifications => &self.push_notifications,
            Preference::DiseaseAlerts => &self.disease_alerts,
            Preference::MaintenanceReminders => &self.maintenance_reminders,
            Preference::DataSharing => &self.data_sharing,
            Preference::LocationServices => &self.location_services,
        }
    }

    fn slot_mut(&mut self, preference: Preference) -> &mut bool {
        match preference {
            Preference::PushNotifications => &mut self.push_notifications,
            Preference::DiseaseAlerts => &mut self.disease_alerts,
            Preference::MaintenanceReminders => &mut self.maintenance_reminders,
            Preference::DataSharing => &mut self.data_sharing,
            Preference::LocationServices => &mut self.location_services,
        }
    }
}

pub struct SettingsScreen {
    ctx: Context,
    preferences: Mutex<Preferences>,
    sign_out: SignOutAction,
}

impl SettingsScreen {
    pub fn new(ctx: Context) -> Self {
        Self::with_preferences(ctx, Preferences::default())
    }

    pub fn with_preferences(ctx: Context, preferences: Preferences) -> Self {
        Self {
            ctx,
            preferences: Mutex::new(preferences),
            sign_out: SignOutAction::default(),
        }
    }

    pub fn preferences(&self) -> Preferences {
        *lock(&self.preferences)
    }

    /// Flip one toggle and return its new value
    pub fn toggle(&self, preference: Preference) -> bool {
        let mut preferences = lock(&self.preferences);
        let enabled = !preferences.get(preference);
        preferences.set(preference, enabled);
        info!("{} {}", preference, if enabled { "enabled" } else { "disabled" });
        enabled
    }

    pub fn app_version(&self) -> &'static str {
        APP_VERSION
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
