//! Message repository trait definition.

use chrono::{DateTime, Utc};
use parley_types::conversation::ConversationId;
use parley_types::error::RepositoryError;
use parley_types::message::{Message, MessageId};
use parley_types::user::UserId;

/// Repository trait for conversation message persistence.
///
/// All list operations return messages ordered by created_at ASC.
pub trait MessageRepository: Send + Sync {
    /// Persist a new message.
    fn save(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a message by its unique ID.
    fn get_by_id(
        &self,
        id: &MessageId,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// Get a page of messages for a conversation.
    fn list(
        &self,
        conversation_id: &ConversationId,
        limit: i64,
        offset: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Count the messages of a conversation.
    fn count(
        &self,
        conversation_id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Most recent message in the conversation, from anyone.
    fn latest(
        &self,
        conversation_id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// Most recent message in the conversation authored by `owner`.
    fn latest_by_owner(
        &self,
        conversation_id: &ConversationId,
        owner: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// Every message of the conversation created strictly after `after`.
    fn list_after(
        &self,
        conversation_id: &ConversationId,
        after: &DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;
}
