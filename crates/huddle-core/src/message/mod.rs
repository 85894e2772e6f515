//! Message domain: model and repository trait.

pub mod model;
pub mod repository;

pub use model::{Message, MessageKind, MessageMetadata, Reaction, ReadReceipt};
pub use repository::MessageRepository;
