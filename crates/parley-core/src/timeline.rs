//! Message timeline of a conversation.
//!
//! Messages are append-only and ordered by `created_at`. Timestamps are kept
//! strictly increasing within a conversation, so "everything after message X"
//! is always well defined for pollers.

use chrono::{DateTime, Duration, Utc};
use parley_types::conversation::{Conversation, ConversationId};
use parley_types::error::{ChatError, RepositoryError};
use parley_types::message::{Message, MessageId};
use parley_types::user::UserId;

use crate::conversation::membership::require_member;
use crate::conversation::storage_failure;
use crate::conversation::validation::require_content;
use crate::pagination::{Page, PageWindow, paginate};
use crate::repository::message::MessageRepository;

/// Saves attempted per send before a timestamp collision is reported.
const SEND_ATTEMPTS: u32 = 3;

/// Send, page, and poll messages on top of a [`MessageRepository`].
pub struct MessageTimeline<M: MessageRepository> {
    repo: M,
}

impl<M: MessageRepository> MessageTimeline<M> {
    pub fn new(repo: M) -> Self {
        Self { repo }
    }

    /// Append a message from `sender`.
    ///
    /// Checks membership first, then content. Nothing is written when either
    /// check fails. Storage rejects a second message with the same
    /// `created_at` in one conversation; the send then recomputes the
    /// timestamp and tries again.
    pub async fn send(
        &self,
        conversation: &Conversation,
        sender: &UserId,
        content: &str,
    ) -> Result<Message, ChatError> {
        require_member(conversation, sender)?;
        let content = require_content(content)?;

        let id = MessageId::new();
        let mut attempt = 1;
        loop {
            let latest = self
                .repo
                .latest(&conversation.id)
                .await
                .map_err(storage_failure)?;
            let message = Message {
                id,
                conversation_id: conversation.id,
                owner: *sender,
                content: content.to_string(),
                created_at: next_timestamp(Utc::now(), latest.map(|m| m.created_at)),
                updated_at: None,
            };

            match self.repo.save(&message).await {
                Ok(()) => {
                    tracing::debug!(
                        conversation_id = %conversation.id,
                        message_id = %message.id,
                        sender = %sender,
                        "message sent"
                    );
                    return Ok(message);
                }
                // Another writer took the timestamp between `latest` and `save`.
                Err(RepositoryError::Conflict(_)) if attempt < SEND_ATTEMPTS => {
                    tracing::debug!(
                        conversation_id = %conversation.id,
                        attempt,
                        "message timestamp taken, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(storage_failure(e)),
            }
        }
    }

    /// A page of the conversation's messages, oldest first. Members only.
    pub async fn page(
        &self,
        conversation: &Conversation,
        caller: &UserId,
        window: PageWindow,
    ) -> Result<Page<Message>, ChatError> {
        require_member(conversation, caller)?;

        let total = self
            .repo
            .count(&conversation.id)
            .await
            .map_err(storage_failure)?;
        paginate(window, total, |limit, offset| async move {
            self.repo
                .list(&conversation.id, limit, offset)
                .await
                .map_err(storage_failure)
        })
        .await
    }

    /// When `user_id` last wrote in the conversation, if ever.
    pub async fn last_seen(
        &self,
        conversation_id: &ConversationId,
        user_id: &UserId,
    ) -> Result<Option<DateTime<Utc>>, ChatError> {
        let latest = self
            .repo
            .latest_by_owner(conversation_id, user_id)
            .await
            .map_err(storage_failure)?;
        Ok(latest.map(|m| m.created_at))
    }

    /// Every message created after `last_msg_id`, oldest first.
    ///
    /// The reference message must exist and belong to `conversation`.
    pub async fn poll_since(
        &self,
        conversation: &Conversation,
        last_msg_id: &MessageId,
    ) -> Result<Vec<Message>, ChatError> {
        let reference = self
            .repo
            .get_by_id(last_msg_id)
            .await
            .map_err(storage_failure)?
            .filter(|m| m.conversation_id == conversation.id)
            .ok_or_else(|| ChatError::NotFound("message not found".to_string()))?;

        self.repo
            .list_after(&conversation.id, &reference.created_at)
            .await
            .map_err(storage_failure)
    }
}

/// Storage keeps microsecond precision, so successive messages are spaced at
/// least one microsecond apart even when the clock stalls or steps back.
fn next_timestamp(now: DateTime<Utc>, latest: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = truncate_to_micros(now);
    match latest {
        Some(latest) if latest >= now => latest + Duration::microseconds(1),
        _ => now,
    }
}

fn truncate_to_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    let excess = i64::from(ts.timestamp_subsec_nanos() % 1_000);
    ts - Duration::nanoseconds(excess)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;
    use parley_types::conversation::Membership;

    use super::*;
    use crate::testing::InMemoryStore;

    fn group(owner: UserId, others: &[UserId]) -> Conversation {
        let mut members: BTreeSet<UserId> = others.iter().copied().collect();
        members.insert(owner);
        Conversation {
            id: ConversationId::new(),
            name: "Team".to_string(),
            owner,
            membership: Membership::Group { members },
            created_at: Utc::now(),
        }
    }

    /// Answers `latest` with an outdated message a fixed number of times, as
    /// if another writer slipped in between the read and the save.
    #[derive(Clone)]
    struct LaggingReads {
        inner: InMemoryStore,
        stale: Message,
        remaining: Arc<AtomicUsize>,
    }

    impl MessageRepository for LaggingReads {
        async fn save(&self, message: &Message) -> Result<(), RepositoryError> {
            self.inner.save(message).await
        }

        async fn get_by_id(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError> {
            MessageRepository::get_by_id(&self.inner, id).await
        }

        async fn list(
            &self,
            conversation_id: &ConversationId,
            limit: i64,
            offset: i64,
        ) -> Result<Vec<Message>, RepositoryError> {
            MessageRepository::list(&self.inner, conversation_id, limit, offset).await
        }

        async fn count(&self, conversation_id: &ConversationId) -> Result<u64, RepositoryError> {
            MessageRepository::count(&self.inner, conversation_id).await
        }

        async fn latest(
            &self,
            conversation_id: &ConversationId,
        ) -> Result<Option<Message>, RepositoryError> {
            let lagging = self
                .remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if lagging {
                return Ok(Some(self.stale.clone()));
            }
            self.inner.latest(conversation_id).await
        }

        async fn latest_by_owner(
            &self,
            conversation_id: &ConversationId,
            owner: &UserId,
        ) -> Result<Option<Message>, RepositoryError> {
            self.inner.latest_by_owner(conversation_id, owner).await
        }

        async fn list_after(
            &self,
            conversation_id: &ConversationId,
            after: &DateTime<Utc>,
        ) -> Result<Vec<Message>, RepositoryError> {
            self.inner.list_after(conversation_id, after).await
        }
    }

    fn message_at(conversation: &Conversation, created_at: DateTime<Utc>) -> Message {
        Message {
            id: MessageId::new(),
            conversation_id: conversation.id,
            owner: conversation.owner,
            content: "earlier".to_string(),
            created_at,
            updated_at: None,
        }
    }

    /// A store holding one message one hour ahead, plus a reader that reports
    /// the message one microsecond before it for `lag` calls.
    async fn raced_timeline(
        conversation: &Conversation,
        lag: usize,
    ) -> (MessageTimeline<LaggingReads>, InMemoryStore, DateTime<Utc>) {
        let store = InMemoryStore::new();
        let taken = truncate_to_micros(Utc::now() + Duration::hours(1));
        store.save(&message_at(conversation, taken)).await.unwrap();

        let reads = LaggingReads {
            inner: store.clone(),
            stale: message_at(conversation, taken - Duration::microseconds(1)),
            remaining: Arc::new(AtomicUsize::new(lag)),
        };
        (MessageTimeline::new(reads), store, taken)
    }

    #[test]
    fn test_next_timestamp_is_strictly_increasing() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(next_timestamp(now, None), now);
        assert_eq!(
            next_timestamp(now, Some(now)),
            now + Duration::microseconds(1)
        );
        let ahead = now + Duration::seconds(5);
        assert_eq!(
            next_timestamp(now, Some(ahead)),
            ahead + Duration::microseconds(1)
        );
        let behind = now - Duration::seconds(5);
        assert_eq!(next_timestamp(now, Some(behind)), now);
    }

    #[test]
    fn test_truncate_to_micros_drops_nanos() {
        let ts = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        assert_eq!(truncate_to_micros(ts).timestamp_subsec_nanos(), 123_456_000);
    }

    #[tokio::test]
    async fn test_non_member_send_is_denied_and_not_persisted() {
        let store = InMemoryStore::new();
        let timeline = MessageTimeline::new(store.clone());
        let conversation = group(UserId::new(), &[UserId::new()]);

        let err = timeline
            .send(&conversation, &UserId::new(), "hello")
            .await
            .unwrap_err();
        assert_eq!(err, ChatError::AccessDenied);
        assert_eq!(store.message_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_content_is_rejected() {
        let store = InMemoryStore::new();
        let timeline = MessageTimeline::new(store.clone());
        let owner = UserId::new();
        let conversation = group(owner, &[]);

        let err = timeline.send(&conversation, &owner, "   ").await.unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
        assert_eq!(store.message_count(), 0);
    }

    #[tokio::test]
    async fn test_poll_returns_strictly_later_messages_in_order() {
        let timeline = MessageTimeline::new(InMemoryStore::new());
        let owner = UserId::new();
        let conversation = group(owner, &[]);

        let m1 = timeline.send(&conversation, &owner, "one").await.unwrap();
        let m2 = timeline.send(&conversation, &owner, "two").await.unwrap();
        let m3 = timeline.send(&conversation, &owner, "three").await.unwrap();
        assert!(m1.created_at < m2.created_at && m2.created_at < m3.created_at);

        let delta = timeline.poll_since(&conversation, &m1.id).await.unwrap();
        let ids: Vec<_> = delta.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![m2.id, m3.id]);

        let empty = timeline.poll_since(&conversation, &m3.id).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_poll_with_unknown_or_foreign_message_is_not_found() {
        let timeline = MessageTimeline::new(InMemoryStore::new());
        let owner = UserId::new();
        let here = group(owner, &[]);
        let elsewhere = group(owner, &[]);

        let foreign = timeline.send(&elsewhere, &owner, "hi").await.unwrap();

        let missing = timeline
            .poll_since(&here, &MessageId::new())
            .await
            .unwrap_err();
        assert!(matches!(missing, ChatError::NotFound(_)));

        let crossed = timeline.poll_since(&here, &foreign.id).await.unwrap_err();
        assert!(matches!(crossed, ChatError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_page_requires_membership() {
        let timeline = MessageTimeline::new(InMemoryStore::new());
        let owner = UserId::new();
        let conversation = group(owner, &[]);
        timeline.send(&conversation, &owner, "hi").await.unwrap();

        let page = timeline
            .page(&conversation, &owner, PageWindow::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].content, "hi");

        let err = timeline
            .page(&conversation, &UserId::new(), PageWindow::default())
            .await
            .unwrap_err();
        assert_eq!(err, ChatError::AccessDenied);
    }

    #[tokio::test]
    async fn test_last_seen_tracks_latest_own_message() {
        let timeline = MessageTimeline::new(InMemoryStore::new());
        let ada = UserId::new();
        let bob = UserId::new();
        let conversation = group(ada, &[bob]);

        assert_eq!(timeline.last_seen(&conversation.id, &ada).await.unwrap(), None);

        timeline.send(&conversation, &ada, "first").await.unwrap();
        let second = timeline.send(&conversation, &ada, "second").await.unwrap();
        timeline.send(&conversation, &bob, "reply").await.unwrap();

        assert_eq!(
            timeline.last_seen(&conversation.id, &ada).await.unwrap(),
            Some(second.created_at)
        );
    }

    #[tokio::test]
    async fn test_send_retries_when_timestamp_is_taken() {
        let owner = UserId::new();
        let conversation = group(owner, &[]);
        let (timeline, store, taken) = raced_timeline(&conversation, 1).await;

        let sent = timeline.send(&conversation, &owner, "late").await.unwrap();
        assert_eq!(sent.created_at, taken + Duration::microseconds(1));
        assert_eq!(store.message_count(), 2);
    }

    #[tokio::test]
    async fn test_send_gives_up_after_repeated_collisions() {
        let owner = UserId::new();
        let conversation = group(owner, &[]);
        let (timeline, store, _) = raced_timeline(&conversation, usize::MAX).await;

        let err = timeline.send(&conversation, &owner, "late").await.unwrap_err();
        assert_eq!(err, ChatError::Internal);
        assert_eq!(store.message_count(), 1);
    }
}
