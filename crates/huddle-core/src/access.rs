//! Access control: role resolution and hierarchy checks.
//!
//! The hierarchy is a plain value handed to the services that need it, not a
//! shared singleton, so deployments and tests can swap it out.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::channel::Channel;
use crate::error::{HuddleError, Result};
use crate::user::{GlobalRole, User};

/// A user's role within one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelRole {
    Admin,
    Organizer,
    Volunteer,
}

impl ChannelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelRole::Admin => "admin",
            ChannelRole::Organizer => "organizer",
            ChannelRole::Volunteer => "volunteer",
        }
    }
}

impl fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelRole {
    type Err = HuddleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(ChannelRole::Admin),
            "organizer" => Ok(ChannelRole::Organizer),
            "volunteer" => Ok(ChannelRole::Volunteer),
            other => Err(HuddleError::InvalidRole(other.to_string())),
        }
    }
}

/// Ordering of channel roles for minimum-role checks.
///
/// Default levels: volunteer(1) < organizer(2) < admin(3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleHierarchy {
    pub volunteer: u8,
    pub organizer: u8,
    pub admin: u8,
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self {
            volunteer: 1,
            organizer: 2,
            admin: 3,
        }
    }
}

impl RoleHierarchy {
    pub fn level(&self, role: ChannelRole) -> u8 {
        match role {
            ChannelRole::Volunteer => self.volunteer,
            ChannelRole::Organizer => self.organizer,
            ChannelRole::Admin => self.admin,
        }
    }

    /// Fails with `InsufficientRole` when `role` ranks below `min`.
    pub fn require_minimum(&self, role: ChannelRole, min: ChannelRole) -> Result<()> {
        if self.level(role) < self.level(min) {
            return Err(HuddleError::InsufficientRole {
                required: min,
                actual: role,
            });
        }
        Ok(())
    }
}

/// Resolves a caller's effective role for a channel.
///
/// Global admins get the top access level unconditionally; the channel's
/// designated admin is `admin`; otherwise the membership role applies.
/// Non-members fail with `AccessDenied`. Callers re-resolve on every mutating
/// operation; the result is never cached across requests.
pub fn resolve_role(user: &User, channel: &Channel) -> Result<ChannelRole> {
    if user.global_role == GlobalRole::Admin {
        return Ok(ChannelRole::Admin);
    }
    if channel.admin_id == user.id {
        return Ok(ChannelRole::Admin);
    }
    channel
        .membership_of(&user.id)
        .map(|m| m.role)
        .ok_or(HuddleError::AccessDenied)
}
