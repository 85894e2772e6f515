//! Membership and invitation lifecycle.
//!
//! All mutations go through `ChannelRepository::update` so that concurrent
//! invites, accepts, and removals on the same channel are applied as atomic
//! read-modify-write updates on the one aggregate.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::model::{Channel, EventType, Invitation, InvitationStatus};
use super::repository::ChannelRepository;
use crate::access::{self, ChannelRole, RoleHierarchy};
use crate::error::{HuddleError, Result};
use crate::user::{User, UserRepository};

/// A pending invitation projected for the invitee's listing.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InvitationSummary {
    pub channel_id: String,
    pub channel_name: String,
    pub channel_description: String,
    pub event_type: EventType,
    pub role: ChannelRole,
    pub invited_by: String,
    pub invited_at: chrono::DateTime<Utc>,
}

/// Owns channel membership, pending invitations, and their transitions.
pub struct MembershipService {
    channels: Arc<dyn ChannelRepository>,
    users: Arc<dyn UserRepository>,
    hierarchy: RoleHierarchy,
}

impl MembershipService {
    pub fn new(
        channels: Arc<dyn ChannelRepository>,
        users: Arc<dyn UserRepository>,
        hierarchy: RoleHierarchy,
    ) -> Self {
        Self {
            channels,
            users,
            hierarchy,
        }
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    async fn load_channel(&self, channel_id: &str) -> Result<Channel> {
        self.channels
            .find_by_id(channel_id)
            .await?
            .ok_or_else(|| HuddleError::not_found("channel", channel_id))
    }

    /// Records a pending invitation for a registered user.
    ///
    /// Invitees must already own an account; invitations address an email
    /// that resolves to a registered user.
    pub async fn invite(
        &self,
        channel_id: &str,
        inviter: &User,
        email: &str,
        role: ChannelRole,
    ) -> Result<Invitation> {
        if role == ChannelRole::Admin {
            return Err(HuddleError::InvalidRole("admin".to_string()));
        }

        let channel = self.load_channel(channel_id).await?;
        if access::resolve_role(inviter, &channel)? != ChannelRole::Admin {
            return Err(HuddleError::forbidden("only the channel admin can invite members"));
        }

        let invitee = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| HuddleError::not_found("user", email))?;

        let invitation = Invitation {
            email: email.to_string(),
            role,
            status: InvitationStatus::Pending,
            invited_by: inviter.id.clone(),
            invited_at: Utc::now(),
        };

        // Membership/duplicate checks run inside the atomic update so a
        // concurrent accept or invite cannot slip in between.
        let recorded = invitation.clone();
        self.channels
            .update(channel_id, &mut |ch: &mut Channel| {
                if ch.is_member(&invitee.id) {
                    return Err(HuddleError::invalid_operation("user is already a member"));
                }
                if ch.pending_invitation(&recorded.email).is_some() {
                    return Err(HuddleError::invalid_operation("invitation already pending"));
                }
                ch.invitations.push(recorded.clone());
                Ok(())
            })
            .await?;

        info!(channel = channel_id, email, role = %role, "invitation recorded");
        Ok(invitation)
    }

    /// Accepts the caller's pending invitation.
    ///
    /// Membership append and invitation flip land in one atomic channel
    /// update. A second accept finds no pending invitation and fails
    /// `NotFound`; it never double-adds a membership.
    pub async fn accept_invitation(
        &self,
        channel_id: &str,
        user: &User,
    ) -> Result<(Channel, ChannelRole)> {
        // Touch the channel first so an unknown id reports the channel, not
        // the invitation.
        self.load_channel(channel_id).await?;

        let mut joined_role: Option<ChannelRole> = None;
        let user_id = user.id.clone();
        let email = user.email.clone();
        let channel = self
            .channels
            .update(channel_id, &mut |ch: &mut Channel| {
                let invitation = ch
                    .pending_invitation_mut(&email)
                    .ok_or_else(|| HuddleError::not_found("invitation", &email))?;
                let role = invitation.role;
                invitation.status = InvitationStatus::Accepted;
                ch.add_member(&user_id, role);
                joined_role = Some(role);
                Ok(())
            })
            .await?;

        let role =
            joined_role.ok_or_else(|| HuddleError::data_access("accept update did not apply"))?;
        info!(channel = channel_id, user = %user.id, role = %role, "invitation accepted");
        Ok((channel, role))
    }

    /// Declines the caller's pending invitation, freeing the
    /// (channel, email) pair for a future re-invite.
    pub async fn decline_invitation(&self, channel_id: &str, user: &User) -> Result<()> {
        self.load_channel(channel_id).await?;

        let email = user.email.clone();
        self.channels
            .update(channel_id, &mut |ch: &mut Channel| {
                let invitation = ch
                    .pending_invitation_mut(&email)
                    .ok_or_else(|| HuddleError::not_found("invitation", &email))?;
                invitation.status = InvitationStatus::Declined;
                Ok(())
            })
            .await?;

        info!(channel = channel_id, user = %user.id, "invitation declined");
        Ok(())
    }

    /// Removes a member. The channel admin cannot be removed.
    pub async fn remove_member(
        &self,
        channel_id: &str,
        requester: &User,
        target_user_id: &str,
    ) -> Result<Channel> {
        let channel = self.load_channel(channel_id).await?;
        if access::resolve_role(requester, &channel)? != ChannelRole::Admin {
            return Err(HuddleError::forbidden("only the channel admin can remove members"));
        }
        if target_user_id == channel.admin_id {
            return Err(HuddleError::invalid_operation(
                "the channel admin cannot be removed",
            ));
        }

        let target = target_user_id.to_string();
        let channel = self
            .channels
            .update(channel_id, &mut |ch: &mut Channel| {
                let before = ch.members.len();
                ch.members.retain(|m| m.user_id != target);
                if ch.members.len() == before {
                    return Err(HuddleError::not_found("membership", &target));
                }
                Ok(())
            })
            .await?;

        info!(channel = channel_id, user = target_user_id, "member removed");
        Ok(channel)
    }

    /// Lists the caller's pending invitations across all channels.
    pub async fn pending_invitations(&self, user: &User) -> Result<Vec<InvitationSummary>> {
        let channels = self
            .channels
            .list_with_pending_invitation(&user.email)
            .await?;

        let summaries = channels
            .iter()
            .filter_map(|ch| {
                ch.pending_invitation(&user.email).map(|inv| InvitationSummary {
                    channel_id: ch.id.clone(),
                    channel_name: ch.name.clone(),
                    channel_description: ch.description.clone(),
                    event_type: ch.event_type,
                    role: inv.role,
                    invited_by: inv.invited_by.clone(),
                    invited_at: inv.invited_at,
                })
            })
            .collect();
        Ok(summaries)
    }
}
