//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's global role, independent of any channel.
///
/// Global admins bypass channel membership checks entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlobalRole {
    Admin,
    Organizer,
    Volunteer,
}

impl Default for GlobalRole {
    fn default() -> Self {
        GlobalRole::Volunteer
    }
}

/// Global permission flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub can_create_channels: bool,
    pub can_manage_users: bool,
    pub can_access_analytics: bool,
    pub can_export_data: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            can_create_channels: true,
            can_manage_users: false,
            can_access_analytics: false,
            can_export_data: false,
        }
    }
}

/// Per-user notification channel preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    /// Receive deliveries through the external bot sink.
    pub bot: bool,
    /// Receive in-app (live transport) deliveries.
    pub in_app: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            bot: true,
            in_app: true,
        }
    }
}

/// A registered user.
///
/// Created on first external sign-in; never hard-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// External sign-in identity key.
    pub google_id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub profile_picture: String,
    #[serde(default)]
    pub global_role: GlobalRole,
    /// Contact id for the external message bot, supplied by the user.
    #[serde(default)]
    pub bot_contact_id: Option<String>,
    #[serde(default)]
    pub bot_username: Option<String>,
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(default)]
    pub notifications: NotificationPreferences,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with default role and permissions.
    pub fn new(
        google_id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            google_id: google_id.into(),
            email: email.into(),
            name: name.into(),
            profile_picture: String::new(),
            global_role: GlobalRole::default(),
            bot_contact_id: None,
            bot_username: None,
            permissions: Permissions::default(),
            notifications: NotificationPreferences::default(),
            created_at: Utc::now(),
        }
    }

    /// The bot contact id to deliver notifications to, if the user has one
    /// configured and has not opted out of bot deliveries.
    pub fn bot_contact(&self) -> Option<&str> {
        if !self.notifications.bot {
            return None;
        }
        self.bot_contact_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }
}
