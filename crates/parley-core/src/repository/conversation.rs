//! Conversation repository trait definition.

use parley_types::conversation::{Conversation, ConversationId};
use parley_types::error::RepositoryError;
use parley_types::user::UserId;

/// Repository trait for conversation persistence.
///
/// Implementations must enforce that at most one personal conversation exists
/// per unordered user pair, returning `Conflict` on a duplicate insert.
pub trait ConversationRepository: Send + Sync {
    /// Create a conversation together with its membership.
    fn create(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Get a conversation by its unique ID, membership included.
    fn get_by_id(
        &self,
        id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// Find the personal conversation owned by `owner` with `participant`.
    ///
    /// Matches only this ordering; callers check both.
    fn find_personal(
        &self,
        owner: &UserId,
        participant: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// List conversations where the user is owner, personal participant, or
    /// group member, ordered by created_at ASC.
    fn list_for_user(
        &self,
        user_id: &UserId,
        limit: i64,
        offset: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    /// Count the conversations `list_for_user` would return.
    fn count_for_user(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
