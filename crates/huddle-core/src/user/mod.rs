//! User domain: model and repository trait.

pub mod model;
pub mod repository;

pub use model::{GlobalRole, NotificationPreferences, Permissions, User};
pub use repository::UserRepository;
