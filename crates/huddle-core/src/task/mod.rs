//! Task domain: model, repository trait, and lifecycle service.

pub mod model;
pub mod repository;
pub mod service;

pub use model::{NewTask, Task, TaskBoard, TaskComment, TaskPriority, TaskStatus};
pub use repository::TaskRepository;
pub use service::TaskService;
