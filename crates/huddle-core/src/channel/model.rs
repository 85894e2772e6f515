//! Channel domain model.
//!
//! The channel document embeds its memberships and invitations; it is the
//! single point of contention for concurrent membership mutations and is
//! always updated as one aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::ChannelRole;

/// Kind of event a channel is planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Hackathon,
    Wedding,
    Conference,
    Workshop,
    Meeting,
    Festival,
    Other,
}

impl Default for EventType {
    fn default() -> Self {
        EventType::Other
    }
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Hackathon => "hackathon",
            EventType::Wedding => "wedding",
            EventType::Conference => "conference",
            EventType::Workshop => "workshop",
            EventType::Meeting => "meeting",
            EventType::Festival => "festival",
            EventType::Other => "other",
        }
    }
}

/// Channel lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    Planning,
    Active,
    Completed,
    Cancelled,
}

impl Default for ChannelStatus {
    fn default() -> Self {
        ChannelStatus::Planning
    }
}

/// One user's membership in a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: String,
    pub role: ChannelRole,
    pub joined_at: DateTime<Utc>,
}

/// Status of an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
}

/// An invitation to join a channel, addressed by email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub email: String,
    /// Proposed role; never `admin`.
    pub role: ChannelRole,
    pub status: InvitationStatus,
    pub invited_by: String,
    pub invited_at: DateTime<Utc>,
}

/// Free-form planning metadata consumed only by the AI responder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiContext {
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub challenges: Option<String>,
}

impl AiContext {
    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        let populated = |f: &Option<String>| f.as_deref().is_some_and(|v| !v.is_empty());
        !(populated(&self.objective)
            || populated(&self.target_audience)
            || populated(&self.budget)
            || populated(&self.timeline)
            || populated(&self.challenges))
    }
}

/// A stored AI-generated event plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiPlan {
    pub event_details: serde_json::Value,
    pub action_plan: serde_json::Value,
    pub generated_at: DateTime<Utc>,
}

/// A channel: the collaboration space for planning one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default)]
    pub status: ChannelStatus,
    /// The owning user. Always present in `members` with role `admin`.
    pub admin_id: String,
    pub members: Vec<Membership>,
    pub invitations: Vec<Invitation>,
    #[serde(default)]
    pub ai_context: Option<AiContext>,
    #[serde(default)]
    pub ai_plan: Option<AiPlan>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Channel {
    /// Creates a channel with a single admin membership for the owner.
    pub fn new(
        admin_id: &str,
        name: impl Into<String>,
        description: impl Into<String>,
        event_type: EventType,
        ai_context: Option<AiContext>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            event_type,
            status: ChannelStatus::default(),
            admin_id: admin_id.to_string(),
            members: vec![Membership {
                user_id: admin_id.to_string(),
                role: ChannelRole::Admin,
                joined_at: now,
            }],
            invitations: Vec::new(),
            ai_context,
            ai_plan: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn membership_of(&self, user_id: &str) -> Option<&Membership> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.membership_of(user_id).is_some()
    }

    /// Appends a membership. Callers uphold the one-membership-per-user
    /// invariant before calling.
    pub fn add_member(&mut self, user_id: &str, role: ChannelRole) {
        self.members.push(Membership {
            user_id: user_id.to_string(),
            role,
            joined_at: Utc::now(),
        });
    }

    pub fn pending_invitation(&self, email: &str) -> Option<&Invitation> {
        self.invitations
            .iter()
            .find(|inv| inv.email == email && inv.status == InvitationStatus::Pending)
    }

    pub fn pending_invitation_mut(&mut self, email: &str) -> Option<&mut Invitation> {
        self.invitations
            .iter_mut()
            .find(|inv| inv.email == email && inv.status == InvitationStatus::Pending)
    }

    /// Member user ids, in membership order.
    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.user_id.clone()).collect()
    }

    /// Number of memberships carrying the `admin` role.
    pub fn admin_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.role == ChannelRole::Admin)
            .count()
    }
}
