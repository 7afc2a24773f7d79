//! Conversation creation and lookup.
//!
//! At most one personal conversation exists per unordered pair of users. The
//! registry checks both orderings before creating one, and the storage layer
//! backs that with a unique pair key so two concurrent creators still end up
//! sharing a single record.

use std::collections::BTreeSet;

use chrono::Utc;
use parley_types::conversation::{
    Conversation, ConversationId, CreateOutcome, Membership,
};
use parley_types::error::{ChatError, RepositoryError};
use parley_types::user::{User, UserId};

use crate::pagination::{Page, PageWindow, paginate};
use crate::repository::conversation::ConversationRepository;

use super::storage_failure;

/// Creates and finds conversations on top of a [`ConversationRepository`].
pub struct ConversationRegistry<C: ConversationRepository> {
    repo: C,
}

impl<C: ConversationRepository> ConversationRegistry<C> {
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    /// The personal conversation between `a` and `b`, whichever of them owns it.
    pub async fn find_personal(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Conversation>, ChatError> {
        if let Some(found) = self
            .repo
            .find_personal(a, b)
            .await
            .map_err(storage_failure)?
        {
            return Ok(Some(found));
        }
        self.repo
            .find_personal(b, a)
            .await
            .map_err(storage_failure)
    }

    /// Create the personal conversation between `owner` and `participant`, or
    /// return the one that already exists for the pair.
    ///
    /// The new conversation is named after the participant's username.
    pub async fn create_personal(
        &self,
        owner: &UserId,
        participant: &User,
    ) -> Result<CreateOutcome<Conversation>, ChatError> {
        if let Some(existing) = self.find_personal(owner, &participant.id).await? {
            tracing::debug!(conversation_id = %existing.id, "personal conversation already exists");
            return Ok(CreateOutcome::Existing(existing));
        }

        let conversation = Conversation {
            id: ConversationId::new(),
            name: participant.username.clone(),
            owner: *owner,
            membership: Membership::Personal {
                participant: participant.id,
            },
            created_at: Utc::now(),
        };

        match self.repo.create(&conversation).await {
            Ok(created) => {
                tracing::info!(
                    conversation_id = %created.id,
                    owner = %owner,
                    participant = %participant.id,
                    "personal conversation created"
                );
                Ok(CreateOutcome::Created(created))
            }
            Err(RepositoryError::Conflict(_)) => {
                // Lost the race against a concurrent creator of the same pair.
                match self.find_personal(owner, &participant.id).await? {
                    Some(existing) => Ok(CreateOutcome::Existing(existing)),
                    None => {
                        tracing::error!(
                            owner = %owner,
                            participant = %participant.id,
                            "pair conflict reported but no conversation found"
                        );
                        Err(ChatError::Internal)
                    }
                }
            }
            Err(other) => Err(storage_failure(other)),
        }
    }

    /// Create a named group. The owner is always a member; duplicate
    /// participants collapse.
    pub async fn create_group(
        &self,
        owner: &UserId,
        name: &str,
        participants: &[User],
    ) -> Result<Conversation, ChatError> {
        let mut members: BTreeSet<UserId> = participants.iter().map(|u| u.id).collect();
        members.insert(*owner);

        let conversation = Conversation {
            id: ConversationId::new(),
            name: name.to_string(),
            owner: *owner,
            membership: Membership::Group { members },
            created_at: Utc::now(),
        };

        let created = self
            .repo
            .create(&conversation)
            .await
            .map_err(storage_failure)?;
        tracing::info!(
            conversation_id = %created.id,
            owner = %owner,
            members = created.participant_ids().len(),
            "group conversation created"
        );
        Ok(created)
    }

    pub async fn get_by_id(&self, id: &ConversationId) -> Result<Conversation, ChatError> {
        self.repo
            .get_by_id(id)
            .await
            .map_err(storage_failure)?
            .ok_or_else(|| ChatError::NotFound("conversation not found".to_string()))
    }

    /// Conversations the user takes part in, oldest first.
    pub async fn list_for_user(
        &self,
        user_id: &UserId,
        window: PageWindow,
    ) -> Result<Page<Conversation>, ChatError> {
        let total = self
            .repo
            .count_for_user(user_id)
            .await
            .map_err(storage_failure)?;
        paginate(window, total, |limit, offset| async move {
            self.repo
                .list_for_user(user_id, limit, offset)
                .await
                .map_err(storage_failure)
        })
        .await
    }
}
