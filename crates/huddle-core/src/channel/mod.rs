//! Channel aggregate: membership, invitations, and their lifecycle.

pub mod model;
pub mod repository;
pub mod service;

pub use model::{
    AiContext, AiPlan, Channel, ChannelStatus, EventType, Invitation, InvitationStatus, Membership,
};
pub use repository::{ChannelMutator, ChannelRepository};
pub use service::{InvitationSummary, MembershipService};
