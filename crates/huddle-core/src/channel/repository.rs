//! Channel repository trait.

use async_trait::async_trait;

use super::model::Channel;
use crate::error::Result;

/// Mutator applied atomically to one channel document.
///
/// Returning an error aborts the update and leaves the stored document
/// untouched; outputs are communicated through the closure's captures.
pub type ChannelMutator<'a> = &'a mut (dyn FnMut(&mut Channel) -> Result<()> + Send);

/// An abstract repository for channel persistence.
///
/// # Implementation Notes
///
/// `update` is the lost-update guard for concurrent membership and
/// invitation mutations: implementations must apply the mutator as an
/// atomic read-modify-write scoped to the one document, and bump
/// `updated_at` on success. Two concurrent accepts of different
/// invitations must both land.
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    /// Finds a channel by id. `Ok(None)` when the id does not resolve.
    async fn find_by_id(&self, channel_id: &str) -> Result<Option<Channel>>;

    /// Inserts a freshly created channel.
    async fn insert(&self, channel: &Channel) -> Result<()>;

    /// Atomically mutates one channel document and returns the updated
    /// state. Fails `NotFound` when the id does not resolve.
    async fn update(&self, channel_id: &str, mutate: ChannelMutator<'_>) -> Result<Channel>;

    /// Deletes a channel document.
    async fn delete(&self, channel_id: &str) -> Result<()>;

    /// Channels where the user is the admin or a member, most recently
    /// updated first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Channel>>;

    /// Channels holding a pending invitation addressed to the email.
    async fn list_with_pending_invitation(&self, email: &str) -> Result<Vec<Channel>>;
}
