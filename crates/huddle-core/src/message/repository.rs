//! Message repository trait.

use async_trait::async_trait;

use super::model::Message;
use crate::error::Result;

/// An abstract repository for message persistence.
///
/// Insertion order within a channel is the delivery order: implementations
/// append under their own lock so per-channel ordering follows request
/// acceptance.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Finds a message by id. `Ok(None)` when the id does not resolve.
    async fn find_by_id(&self, message_id: &str) -> Result<Option<Message>>;

    /// Appends a message.
    async fn insert(&self, message: &Message) -> Result<()>;

    /// Replaces a stored message (reactions / read receipts only).
    async fn save(&self, message: &Message) -> Result<()>;

    /// The most recent `limit` messages of a channel, in chronological
    /// order.
    async fn list_by_channel(&self, channel_id: &str, limit: usize) -> Result<Vec<Message>>;

    /// Deletes every message scoped to the channel. Returns the count
    /// removed.
    async fn delete_by_channel(&self, channel_id: &str) -> Result<usize>;
}
