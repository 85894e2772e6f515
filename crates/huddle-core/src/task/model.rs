//! Task domain model.
//!
//! The status machine is a lightweight kanban: all transitions among the
//! four states are permitted in either direction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{HuddleError, Result};

/// Status of a task on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Review,
    Done,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = HuddleError;

    /// Parse boundary for the enumerated set; anything else is
    /// `InvalidStatus`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in-progress" => Ok(TaskStatus::InProgress),
            "review" => Ok(TaskStatus::Review),
            "done" => Ok(TaskStatus::Done),
            other => Err(HuddleError::InvalidStatus(other.to_string())),
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// An immutable comment on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskComment {
    pub user_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A task scoped to one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub channel_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assignee: Option<String>,
    pub created_by: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_hours: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub comments: Vec<TaskComment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for task creation. Status is not part of it: tasks always start
/// `todo`.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub assignee: Option<String>,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<u32>,
    pub tags: Vec<String>,
}

impl Task {
    pub fn new(input: NewTask, created_by: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            channel_id: input.channel_id,
            title: input.title,
            description: input.description,
            assignee: input.assignee,
            created_by: created_by.to_string(),
            status: TaskStatus::Todo,
            priority: input.priority,
            due_date: input.due_date,
            estimated_hours: input.estimated_hours,
            tags: input.tags,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A channel's tasks grouped by status, for the kanban consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskBoard {
    pub todo: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub review: Vec<Task>,
    pub done: Vec<Task>,
}

impl TaskBoard {
    pub fn group(tasks: &[Task]) -> Self {
        let mut board = TaskBoard::default();
        for task in tasks {
            match task.status {
                TaskStatus::Todo => board.todo.push(task.clone()),
                TaskStatus::InProgress => board.in_progress.push(task.clone()),
                TaskStatus::Review => board.review.push(task.clone()),
                TaskStatus::Done => board.done.push(task.clone()),
            }
        }
        board
    }
}
