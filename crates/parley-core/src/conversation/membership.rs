//! Conversation membership checks.

use parley_types::conversation::{Conversation, Membership};
use parley_types::error::ChatError;
use parley_types::user::UserId;

/// Whether `user_id` belongs to the conversation.
///
/// Personal: the owner or the participant. Group: any member of the set.
pub fn is_member(conversation: &Conversation, user_id: &UserId) -> bool {
    match &conversation.membership {
        Membership::Personal { participant } => {
            conversation.owner == *user_id || participant == user_id
        }
        Membership::Group { members } => members.contains(user_id),
    }
}

/// Gate used before any read or write on a conversation or its messages.
pub fn require_member(conversation: &Conversation, user_id: &UserId) -> Result<(), ChatError> {
    if is_member(conversation, user_id) {
        Ok(())
    } else {
        tracing::debug!(
            conversation_id = %conversation.id,
            user_id = %user_id,
            "membership check failed"
        );
        Err(ChatError::AccessDenied)
    }
}
