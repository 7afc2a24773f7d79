//! Conversation access control, registry, and the orchestrating service.
//!
//! - [`membership`]: decides who belongs to a conversation.
//! - [`registry`]: creates and looks up conversations, deduplicating
//!   personal conversations per unordered user pair.
//! - [`validation`]: request checks run before any write.
//! - [`service`]: composes the above with the message timeline into the use
//!   cases exposed over HTTP.

pub mod membership;
pub mod registry;
pub mod service;
pub mod validation;

use parley_types::error::{ChatError, RepositoryError};

/// Log a storage failure and reduce it to a detail-free internal error.
pub(crate) fn storage_failure(err: RepositoryError) -> ChatError {
    tracing::error!(error = %err, "storage operation failed");
    ChatError::Internal
}
