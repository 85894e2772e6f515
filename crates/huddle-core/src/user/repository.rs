//! User repository trait.

use async_trait::async_trait;

use super::model::User;
use crate::error::Result;

/// An abstract repository for user persistence.
///
/// Implementations back this with the document store; the engine never
/// assumes anything beyond find/save semantics.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by id. `Ok(None)` when the id does not resolve.
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>>;

    /// Finds a user by registered email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Resolves a batch of user ids. Unknown ids are silently skipped.
    async fn find_by_ids(&self, user_ids: &[String]) -> Result<Vec<User>>;

    /// Inserts or replaces a user record.
    async fn save(&self, user: &User) -> Result<()>;
}
