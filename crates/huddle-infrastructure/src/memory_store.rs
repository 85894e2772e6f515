//! In-memory document store.
//!
//! One store backs all four collections. Channel updates clone the document,
//! apply the mutator, and only then commit, all under the collection's write
//! lock; a failed mutator leaves the stored document untouched and two
//! concurrent updates never lose each other's writes. Messages live in one
//! append-ordered list, so per-channel ordering follows insertion.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use huddle_core::channel::{Channel, ChannelMutator, ChannelRepository};
use huddle_core::error::{HuddleError, Result};
use huddle_core::message::{Message, MessageRepository};
use huddle_core::task::{Task, TaskRepository};
use huddle_core::user::{User, UserRepository};

#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, User>>,
    channels: RwLock<HashMap<String, Channel>>,
    tasks: RwLock<HashMap<String, Task>>,
    messages: RwLock<Vec<Message>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_ids(&self, user_ids: &[String]) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| users.get(id).cloned())
            .collect())
    }

    async fn save(&self, user: &User) -> Result<()> {
        self.users
            .write()
            .await
            .insert(user.id.clone(), user.clone());
        Ok(())
    }
}

#[async_trait]
impl ChannelRepository for InMemoryStore {
    async fn find_by_id(&self, channel_id: &str) -> Result<Option<Channel>> {
        Ok(self.channels.read().await.get(channel_id).cloned())
    }

    async fn insert(&self, channel: &Channel) -> Result<()> {
        self.channels
            .write()
            .await
            .insert(channel.id.clone(), channel.clone());
        Ok(())
    }

    async fn update(&self, channel_id: &str, mutate: ChannelMutator<'_>) -> Result<Channel> {
        let mut channels = self.channels.write().await;
        let stored = channels
            .get_mut(channel_id)
            .ok_or_else(|| HuddleError::not_found("channel", channel_id))?;

        let mut draft = stored.clone();
        mutate(&mut draft)?;
        draft.updated_at = Utc::now();
        *stored = draft.clone();
        Ok(draft)
    }

    async fn delete(&self, channel_id: &str) -> Result<()> {
        self.channels.write().await.remove(channel_id);
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Channel>> {
        let channels = self.channels.read().await;
        let mut found: Vec<Channel> = channels
            .values()
            .filter(|ch| ch.admin_id == user_id || ch.is_member(user_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(found)
    }

    async fn list_with_pending_invitation(&self, email: &str) -> Result<Vec<Channel>> {
        let channels = self.channels.read().await;
        Ok(channels
            .values()
            .filter(|ch| ch.pending_invitation(email).is_some())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn find_by_id(&self, task_id: &str) -> Result<Option<Task>> {
        Ok(self.tasks.read().await.get(task_id).cloned())
    }

    async fn save(&self, task: &Task) -> Result<()> {
        self.tasks
            .write()
            .await
            .insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn list_by_channel(&self, channel_id: &str) -> Result<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let mut found: Vec<Task> = tasks
            .values()
            .filter(|t| t.channel_id == channel_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn list_by_assignee(&self, user_id: &str) -> Result<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let mut found: Vec<Task> = tasks
            .values()
            .filter(|t| t.assignee.as_deref() == Some(user_id))
            .cloned()
            .collect();
        // Earliest due date first, undated last, then newest created.
        found.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(da), Some(db)) => da.cmp(&db),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => b.created_at.cmp(&a.created_at),
        });
        Ok(found)
    }

    async fn delete_by_channel(&self, channel_id: &str) -> Result<usize> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, t| t.channel_id != channel_id);
        Ok(before - tasks.len())
    }
}

#[async_trait]
impl MessageRepository for InMemoryStore {
    async fn find_by_id(&self, message_id: &str) -> Result<Option<Message>> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .find(|m| m.id == message_id)
            .cloned())
    }

    async fn insert(&self, message: &Message) -> Result<()> {
        self.messages.write().await.push(message.clone());
        Ok(())
    }

    async fn save(&self, message: &Message) -> Result<()> {
        let mut messages = self.messages.write().await;
        match messages.iter_mut().find(|m| m.id == message.id) {
            Some(stored) => {
                *stored = message.clone();
                Ok(())
            }
            None => Err(HuddleError::not_found("message", &message.id)),
        }
    }

    async fn list_by_channel(&self, channel_id: &str, limit: usize) -> Result<Vec<Message>> {
        let messages = self.messages.read().await;
        let scoped: Vec<Message> = messages
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .cloned()
            .collect();
        let skip = scoped.len().saturating_sub(limit);
        Ok(scoped.into_iter().skip(skip).collect())
    }

    async fn delete_by_channel(&self, channel_id: &str) -> Result<usize> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|m| m.channel_id != channel_id);
        Ok(before - messages.len())
    }
}
