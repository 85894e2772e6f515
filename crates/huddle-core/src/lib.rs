pub mod access;
pub mod channel;
pub mod error;
pub mod message;
pub mod notify;
pub mod task;
pub mod user;

// Re-export common error type
pub use error::{HuddleError, Result};
