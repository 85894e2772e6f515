//! Message domain model.
//!
//! Messages are append-only; only reactions and read receipts are mutated
//! after the fact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of message. Consumers match exhaustively so a new variant is a
/// compile-time-visible change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    Text,
    AiResponse,
    System,
    TaskUpdate,
    File,
}

impl Default for MessageKind {
    fn default() -> Self {
        MessageKind::Text
    }
}

/// Optional metadata attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub ai_context: Option<serde_json::Value>,
}

/// An emoji reaction from one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub user_id: String,
    pub emoji: String,
}

/// Read receipt for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub user_id: String,
    pub read_at: DateTime<Utc>,
}

/// A message in a channel's chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    /// Absent for system- and AI-authored messages.
    #[serde(default)]
    pub sender: Option<String>,
    pub content: String,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub is_ai: bool,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub read_by: Vec<ReadReceipt>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn base(channel_id: &str, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            channel_id: channel_id.to_string(),
            sender: None,
            content: content.into(),
            kind: MessageKind::Text,
            is_ai: false,
            metadata: None,
            reactions: Vec::new(),
            read_by: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// A user-authored message.
    pub fn from_user(
        channel_id: &str,
        sender_id: &str,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            sender: Some(sender_id.to_string()),
            kind,
            ..Self::base(channel_id, content)
        }
    }

    /// A system-authored message (no sender).
    pub fn system(channel_id: &str, content: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::System,
            ..Self::base(channel_id, content)
        }
    }

    /// An AI-authored message (no sender, `is_ai` set).
    pub fn ai(channel_id: &str, content: impl Into<String>, metadata: Option<MessageMetadata>) -> Self {
        Self {
            kind: MessageKind::AiResponse,
            is_ai: true,
            metadata,
            ..Self::base(channel_id, content)
        }
    }

    pub fn add_reaction(&mut self, user_id: &str, emoji: &str) {
        self.reactions.push(Reaction {
            user_id: user_id.to_string(),
            emoji: emoji.to_string(),
        });
    }

    /// Records a read receipt once per user.
    pub fn mark_read(&mut self, user_id: &str) {
        if self.read_by.iter().any(|r| r.user_id == user_id) {
            return;
        }
        self.read_by.push(ReadReceipt {
            user_id: user_id.to_string(),
            read_at: Utc::now(),
        });
    }
}
