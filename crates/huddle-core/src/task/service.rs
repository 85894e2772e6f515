//! Task lifecycle: creation, status transitions, comments.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::model::{NewTask, Task, TaskComment, TaskStatus};
use super::repository::TaskRepository;
use crate::access;
use crate::channel::{Channel, ChannelRepository};
use crate::error::{HuddleError, Result};
use crate::user::User;

/// Owns task creation, the status state machine, and comment threads.
///
/// Every operation re-reads the owning channel and re-resolves the caller's
/// role; nothing is cached across requests.
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    channels: Arc<dyn ChannelRepository>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskRepository>, channels: Arc<dyn ChannelRepository>) -> Self {
        Self { tasks, channels }
    }

    async fn require_membership(&self, channel_id: &str, requester: &User) -> Result<Channel> {
        let channel = self
            .channels
            .find_by_id(channel_id)
            .await?
            .ok_or_else(|| HuddleError::not_found("channel", channel_id))?;
        access::resolve_role(requester, &channel)?;
        Ok(channel)
    }

    async fn load_task(&self, task_id: &str) -> Result<Task> {
        self.tasks
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| HuddleError::not_found("task", task_id))
    }

    /// Creates a task in `todo` for a channel the requester belongs to.
    pub async fn create(&self, requester: &User, input: NewTask) -> Result<Task> {
        if input.title.is_empty() {
            return Err(HuddleError::invalid_operation("task title is required"));
        }
        self.require_membership(&input.channel_id, requester).await?;

        let task = Task::new(input, &requester.id);
        self.tasks.save(&task).await?;
        info!(task = %task.id, channel = %task.channel_id, "task created");
        Ok(task)
    }

    /// Moves a task to `new_status` and returns the updated task together
    /// with the prior status (both are required by notification fan-out).
    ///
    /// Any member may move a task in any direction among the four states;
    /// there is no forward-only constraint.
    pub async fn update_status(
        &self,
        task_id: &str,
        requester: &User,
        new_status: TaskStatus,
    ) -> Result<(Task, TaskStatus)> {
        let mut task = self.load_task(task_id).await?;
        self.require_membership(&task.channel_id, requester).await?;

        let previous = task.status;
        task.status = new_status;
        task.updated_at = Utc::now();
        self.tasks.save(&task).await?;

        info!(
            task = task_id,
            from = %previous,
            to = %new_status,
            "task status updated"
        );
        Ok((task, previous))
    }

    /// Appends an immutable comment to a task's thread.
    pub async fn add_comment(
        &self,
        task_id: &str,
        requester: &User,
        text: &str,
    ) -> Result<TaskComment> {
        if text.is_empty() {
            return Err(HuddleError::invalid_operation("comment text is required"));
        }
        let mut task = self.load_task(task_id).await?;
        self.require_membership(&task.channel_id, requester).await?;

        let comment = TaskComment {
            user_id: requester.id.clone(),
            text: text.to_string(),
            created_at: Utc::now(),
        };
        task.comments.push(comment.clone());
        task.updated_at = comment.created_at;
        self.tasks.save(&task).await?;
        Ok(comment)
    }

    /// Lists a channel's tasks (membership required).
    pub async fn list_by_channel(&self, channel_id: &str, requester: &User) -> Result<Vec<Task>> {
        self.require_membership(channel_id, requester).await?;
        self.tasks.list_by_channel(channel_id).await
    }

    /// Lists the caller's assigned tasks across all channels.
    pub async fn list_by_assignee(&self, requester: &User) -> Result<Vec<Task>> {
        self.tasks.list_by_assignee(&requester.id).await
    }
}
