//! Task repository trait.

use async_trait::async_trait;

use super::model::Task;
use crate::error::Result;

/// An abstract repository for task persistence.
///
/// Tasks are independent aggregates: no cross-document locking is required,
/// a plain save suffices.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Finds a task by id. `Ok(None)` when the id does not resolve.
    async fn find_by_id(&self, task_id: &str) -> Result<Option<Task>>;

    /// Inserts or replaces a task.
    async fn save(&self, task: &Task) -> Result<()>;

    /// Tasks of one channel, most recently created first.
    async fn list_by_channel(&self, channel_id: &str) -> Result<Vec<Task>>;

    /// Tasks assigned to one user across all channels, ordered by due date
    /// (earliest first, undated last), then most recently created.
    async fn list_by_assignee(&self, user_id: &str) -> Result<Vec<Task>>;

    /// Deletes every task scoped to the channel. Returns the count removed.
    async fn delete_by_channel(&self, channel_id: &str) -> Result<usize>;
}
