//! Request validation for conversation and message use cases.
//!
//! Each check is a plain function returning a typed result; the service runs
//! them in sequence and stops at the first failure, before any write.

use parley_types::error::ChatError;
use parley_types::user::{User, UserId};

use crate::repository::user::UserRepository;

use super::storage_failure;

/// The participant list must name at least one user.
pub fn require_participants(ids: &[UserId]) -> Result<(), ChatError> {
    if ids.is_empty() {
        return Err(ChatError::Validation(
            "participants is required".to_string(),
        ));
    }
    Ok(())
}

/// Resolve every referenced id to a stored user.
///
/// Fails closed: a single unknown id invalidates the whole list.
pub async fn resolve_participants<U: UserRepository>(
    users: &U,
    ids: &[UserId],
) -> Result<Vec<User>, ChatError> {
    let mut resolved = Vec::with_capacity(ids.len());
    for id in ids {
        match users.get_by_id(id).await.map_err(storage_failure)? {
            Some(user) => resolved.push(user),
            None => {
                tracing::warn!(user_id = %id, "participant not found");
                return Err(ChatError::Validation(
                    "conversation can only occur with at least one valid user".to_string(),
                ));
            }
        }
    }
    Ok(resolved)
}

/// A personal conversation takes exactly one participant other than the caller.
pub fn require_single_participant(caller: &UserId, mut participants: Vec<User>) -> Result<User, ChatError> {
    if participants.len() != 1 {
        return Err(ChatError::Validation(
            "personal conversation can only occur with one valid user".to_string(),
        ));
    }
    let participant = participants.remove(0);
    if participant.id == *caller {
        return Err(ChatError::Validation(
            "personal conversation requires a user other than yourself".to_string(),
        ));
    }
    Ok(participant)
}

/// A group needs a non-blank name. Returns the trimmed name.
pub fn require_group_name(name: Option<&str>) -> Result<String, ChatError> {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ChatError::Validation("group_name is required".to_string())),
    }
}

/// Message content must contain something besides whitespace.
pub fn require_content(content: &str) -> Result<&str, ChatError> {
    if content.trim().is_empty() {
        return Err(ChatError::Validation("content is required".to_string()));
    }
    Ok(content)
}
