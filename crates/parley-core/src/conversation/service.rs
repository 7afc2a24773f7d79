//! Conversation service: the use cases surfaced to the HTTP layer.
//!
//! Every operation runs its checks in a fixed order (validation, then
//! membership) and returns before touching storage when one fails.

use chrono::{DateTime, Utc};
use serde::Serialize;

use parley_types::conversation::{
    Conversation, ConversationId, ConversationKind, CreateOutcome,
};
use parley_types::error::ChatError;
use parley_types::message::{Message, MessageId};
use parley_types::user::UserId;

use crate::pagination::{Page, PageWindow};
use crate::repository::conversation::ConversationRepository;
use crate::repository::message::MessageRepository;
use crate::repository::user::UserRepository;
use crate::timeline::MessageTimeline;

use super::membership::require_member;
use super::registry::ConversationRegistry;
use super::storage_failure;
use super::validation::{
    require_group_name, require_participants, require_single_participant, resolve_participants,
};

/// A participant as shown inside a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantView {
    pub id: UserId,
    pub username: String,
    pub name: String,
    /// When this participant last sent a message here.
    pub last_seen: Option<DateTime<Utc>>,
}

/// Full conversation detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationView {
    pub id: ConversationId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ConversationKind,
    pub owner: UserId,
    pub participants: Vec<ParticipantView>,
    pub created_at: DateTime<Utc>,
}

/// One row of a user's conversation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ConversationKind,
    pub owner: UserId,
    pub personal_participant: Option<UserId>,
    /// The listing user's own last activity in this conversation.
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

pub struct ConversationService<U, C, M>
where
    U: UserRepository,
    C: ConversationRepository,
    M: MessageRepository,
{
    users: U,
    registry: ConversationRegistry<C>,
    timeline: MessageTimeline<M>,
    per_page: u32,
}

impl<U, C, M> ConversationService<U, C, M>
where
    U: UserRepository,
    C: ConversationRepository,
    M: MessageRepository,
{
    pub fn new(users: U, conversations: C, messages: M, per_page: u32) -> Self {
        Self {
            users,
            registry: ConversationRegistry::new(conversations),
            timeline: MessageTimeline::new(messages),
            per_page,
        }
    }

    fn window(&self, page: i64) -> PageWindow {
        PageWindow::new(page, self.per_page)
    }

    /// Start (or reopen) a personal conversation with exactly one other user.
    ///
    /// An existing conversation for the pair comes back as
    /// [`CreateOutcome::Existing`], never as an error.
    pub async fn create_personal(
        &self,
        caller: &UserId,
        participant_ids: &[UserId],
    ) -> Result<CreateOutcome<ConversationView>, ChatError> {
        require_participants(participant_ids)?;
        let resolved = resolve_participants(&self.users, participant_ids).await?;
        let participant = require_single_participant(caller, resolved)?;

        let outcome = self.registry.create_personal(caller, &participant).await?;
        match outcome {
            CreateOutcome::Created(c) => Ok(CreateOutcome::Created(self.view(&c).await?)),
            CreateOutcome::Existing(c) => Ok(CreateOutcome::Existing(self.view(&c).await?)),
        }
    }

    /// Create a named group owned by the caller.
    pub async fn create_group(
        &self,
        caller: &UserId,
        group_name: Option<&str>,
        participant_ids: &[UserId],
    ) -> Result<ConversationView, ChatError> {
        let name = require_group_name(group_name)?;
        require_participants(participant_ids)?;
        let resolved = resolve_participants(&self.users, participant_ids).await?;

        let conversation = self.registry.create_group(caller, &name, &resolved).await?;
        self.view(&conversation).await
    }

    /// Conversation detail with each participant's last activity. Members only.
    pub async fn get_conversation(
        &self,
        caller: &UserId,
        id: &ConversationId,
    ) -> Result<ConversationView, ChatError> {
        let conversation = self.registry.get_by_id(id).await?;
        require_member(&conversation, caller)?;
        self.view(&conversation).await
    }

    /// Conversations `user_id` takes part in. Callers may only list their own.
    pub async fn list_user_conversations(
        &self,
        caller: &UserId,
        user_id: &UserId,
        page: i64,
    ) -> Result<Page<ConversationSummary>, ChatError> {
        if caller != user_id {
            tracing::debug!(caller = %caller, user_id = %user_id, "listing another user's conversations");
            return Err(ChatError::AccessDenied);
        }

        let conversations = self
            .registry
            .list_for_user(user_id, self.window(page))
            .await?;

        let mut summaries = Vec::with_capacity(conversations.items.len());
        for conversation in &conversations.items {
            let last_seen = self.timeline.last_seen(&conversation.id, user_id).await?;
            summaries.push(ConversationSummary {
                id: conversation.id,
                name: conversation.name.clone(),
                kind: conversation.kind(),
                owner: conversation.owner,
                personal_participant: conversation.personal_participant(),
                last_seen,
                created_at: conversation.created_at,
            });
        }

        Ok(Page {
            items: summaries,
            page: conversations.page,
            per_page: conversations.per_page,
            total: conversations.total,
            pages: conversations.pages,
            has_next: conversations.has_next,
            has_prev: conversations.has_prev,
        })
    }

    pub async fn send_message(
        &self,
        caller: &UserId,
        conversation_id: &ConversationId,
        content: &str,
    ) -> Result<Message, ChatError> {
        let conversation = self.registry.get_by_id(conversation_id).await?;
        self.timeline.send(&conversation, caller, content).await
    }

    pub async fn list_messages(
        &self,
        caller: &UserId,
        conversation_id: &ConversationId,
        page: i64,
    ) -> Result<Page<Message>, ChatError> {
        let conversation = self.registry.get_by_id(conversation_id).await?;
        self.timeline
            .page(&conversation, caller, self.window(page))
            .await
    }

    /// Messages newer than `last_msg_id`, which must belong to this conversation.
    pub async fn poll_messages(
        &self,
        caller: &UserId,
        conversation_id: &ConversationId,
        last_msg_id: &MessageId,
    ) -> Result<Vec<Message>, ChatError> {
        let conversation = self.registry.get_by_id(conversation_id).await?;
        require_member(&conversation, caller)?;
        self.timeline.poll_since(&conversation, last_msg_id).await
    }

    async fn view(&self, conversation: &Conversation) -> Result<ConversationView, ChatError> {
        let ids = conversation.participant_ids();
        let mut participants = Vec::with_capacity(ids.len());
        for id in &ids {
            let Some(user) = self.users.get_by_id(id).await.map_err(storage_failure)? else {
                tracing::warn!(
                    conversation_id = %conversation.id,
                    user_id = %id,
                    "conversation references a missing user"
                );
                continue;
            };
            let last_seen = self.timeline.last_seen(&conversation.id, id).await?;
            participants.push(ParticipantView {
                id: user.id,
                username: user.username,
                name: user.name,
                last_seen,
            });
        }

        Ok(ConversationView {
            id: conversation.id,
            name: conversation.name.clone(),
            kind: conversation.kind(),
            owner: conversation.owner,
            participants,
            created_at: conversation.created_at,
        })
    }
}
