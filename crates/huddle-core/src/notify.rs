//! Domain events and external sink traits.
//!
//! The engine talks to the outside world through these traits: a room-scoped
//! live transport, a per-contact bot sink, and a request/response AI
//! responder. All of them are best-effort from the caller's point of view:
//! the triggering operation has already succeeded by the time they run
//! (plan generation excepted, where the responder call is the operation).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::access::ChannelRole;
use crate::channel::{AiContext, EventType};
use crate::error::Result;
use crate::message::Message;
use crate::task::{Task, TaskStatus};

/// A completed domain mutation handed to notification fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A message was persisted to a channel.
    MessageSent {
        message: Message,
        sender_name: String,
    },
    /// A task moved between statuses.
    TaskStatusChanged {
        task: Task,
        previous: TaskStatus,
        updated_by: String,
    },
    /// A user accepted an invitation and joined a channel.
    MemberJoined {
        channel_id: String,
        user_id: String,
        user_name: String,
        role: ChannelRole,
    },
    /// An AI event plan was generated and stored on a channel.
    PlanGenerated {
        channel_id: String,
        event_type: EventType,
    },
}

impl DomainEvent {
    /// The channel this event is scoped to; doubles as the live room id.
    pub fn channel_id(&self) -> &str {
        match self {
            DomainEvent::MessageSent { message, .. } => &message.channel_id,
            DomainEvent::TaskStatusChanged { task, .. } => &task.channel_id,
            DomainEvent::MemberJoined { channel_id, .. } => channel_id,
            DomainEvent::PlanGenerated { channel_id, .. } => channel_id,
        }
    }

    /// Event name published to the live transport.
    pub fn event_name(&self) -> &'static str {
        match self {
            DomainEvent::MessageSent { .. } => "message:new",
            DomainEvent::TaskStatusChanged { .. } => "task:status",
            DomainEvent::MemberJoined { .. } => "member:joined",
            DomainEvent::PlanGenerated { .. } => "plan:generated",
        }
    }
}

/// Room-scoped publish/subscribe primitive used for live delivery.
///
/// At-most-once, best-effort, no persistence.
#[async_trait]
pub trait LiveTransport: Send + Sync {
    async fn join_room(&self, room_id: &str, client_id: &str) -> Result<()>;

    async fn leave_room(&self, room_id: &str, client_id: &str) -> Result<()>;

    /// Publishes an event to everyone currently in the room.
    async fn publish(&self, room_id: &str, event: &str, payload: serde_json::Value) -> Result<()>;
}

/// Fire-and-forget delivery sink keyed by an external contact id.
///
/// Deliveries are independent per contact; one failure never affects the
/// others. May be rate-limited externally.
#[async_trait]
pub trait BotSink: Send + Sync {
    async fn deliver(&self, contact_id: &str, text: &str) -> Result<()>;
}

/// Black-box text-completion service.
///
/// Callers bound every invocation with a timeout; a timeout is an ordinary
/// failure of this sink.
#[async_trait]
pub trait AiResponder: Send + Sync {
    /// Completes a prompt, optionally steered by a channel's AI context.
    async fn complete(&self, prompt: &str, context: Option<&AiContext>) -> Result<String>;

    /// Produces a structured event plan for the given details.
    async fn structured_plan(&self, event_details: &serde_json::Value)
    -> Result<serde_json::Value>;
}
