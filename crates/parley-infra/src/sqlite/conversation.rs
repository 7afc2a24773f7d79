//! SQLite conversation repository implementation.
//!
//! Personal conversations keep their participant in a column and carry a
//! canonical `pair_key` under a UNIQUE constraint. Group members live in
//! `group_members`; a group and its members are written in one transaction.

use std::collections::BTreeSet;

use parley_core::repository::conversation::ConversationRepository;
use parley_types::conversation::{Conversation, ConversationId, ConversationKind, Membership};
use parley_types::error::RepositoryError;
use parley_types::user::UserId;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, parse_datetime, query_error};

/// SQLite-backed implementation of `ConversationRepository`.
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn group_members(
        &self,
        conversation_id: &str,
    ) -> Result<BTreeSet<UserId>, RepositoryError> {
        let rows = sqlx::query("SELECT user_id FROM group_members WHERE conversation_id = ?")
            .bind(conversation_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let mut members = BTreeSet::new();
        for row in &rows {
            let raw: String = row.try_get("user_id").map_err(query_error)?;
            members.insert(parse_user_id(&raw)?);
        }
        Ok(members)
    }

    /// Attach membership to a row, loading group members when needed.
    async fn hydrate(&self, row: ConversationRow) -> Result<Conversation, RepositoryError> {
        let kind: ConversationKind = row.kind.parse().map_err(RepositoryError::Query)?;
        let membership = match kind {
            ConversationKind::Personal => {
                let participant = row.personal_participant.as_deref().ok_or_else(|| {
                    RepositoryError::Query(format!(
                        "personal conversation {} has no participant",
                        row.id
                    ))
                })?;
                Membership::Personal {
                    participant: parse_user_id(participant)?,
                }
            }
            ConversationKind::Group => Membership::Group {
                members: self.group_members(&row.id).await?,
            },
        };

        Ok(Conversation {
            id: row
                .id
                .parse()
                .map_err(|e| RepositoryError::Query(format!("invalid conversation id: {e}")))?,
            name: row.name,
            owner: parse_user_id(&row.owner)?,
            membership,
            created_at: parse_datetime(&row.created_at)?,
        })
    }

    async fn hydrate_all(
        &self,
        rows: Vec<sqlx::sqlite::SqliteRow>,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let mut conversations = Vec::with_capacity(rows.len());
        for row in &rows {
            let conversation_row = ConversationRow::from_row(row).map_err(query_error)?;
            conversations.push(self.hydrate(conversation_row).await?);
        }
        Ok(conversations)
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ConversationRow {
    id: String,
    name: String,
    owner: String,
    kind: String,
    personal_participant: Option<String>,
    created_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            owner: row.try_get("owner")?,
            kind: row.try_get("kind")?,
            personal_participant: row.try_get("personal_participant")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

fn parse_user_id(raw: &str) -> Result<UserId, RepositoryError> {
    raw.parse()
        .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))
}

/// Membership filter shared by the list and count queries. Binds the user id
/// three times.
const MEMBER_FILTER: &str = "c.owner = ?
       OR c.personal_participant = ?
       OR EXISTS (SELECT 1 FROM group_members gm
                  WHERE gm.conversation_id = c.id AND gm.user_id = ?)";

// ---------------------------------------------------------------------------
// ConversationRepository implementation
// ---------------------------------------------------------------------------

impl ConversationRepository for SqliteConversationRepository {
    async fn create(&self, conversation: &Conversation) -> Result<Conversation, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let result = sqlx::query(
            "INSERT INTO conversations (id, name, owner, kind, personal_participant, pair_key, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(conversation.id.to_string())
        .bind(&conversation.name)
        .bind(conversation.owner.to_string())
        .bind(conversation.kind().to_string())
        .bind(conversation.personal_participant().map(|p| p.to_string()))
        .bind(conversation.pair_key())
        .bind(format_datetime(&conversation.created_at))
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(RepositoryError::Conflict(format!(
                    "personal conversation '{}' already exists",
                    conversation.pair_key().unwrap_or_default()
                )));
            }
            Err(e) => return Err(query_error(e)),
        }

        if let Membership::Group { members } = &conversation.membership {
            for member in members {
                sqlx::query("INSERT INTO group_members (conversation_id, user_id) VALUES (?, ?)")
                    .bind(conversation.id.to_string())
                    .bind(member.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(query_error)?;
            }
        }

        tx.commit().await.map_err(query_error)?;
        Ok(conversation.clone())
    }

    async fn get_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let conversation_row = ConversationRow::from_row(&row).map_err(query_error)?;
                Ok(Some(self.hydrate(conversation_row).await?))
            }
            None => Ok(None),
        }
    }

    async fn find_personal(
        &self,
        owner: &UserId,
        participant: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM conversations
             WHERE kind = 'Personal' AND owner = ? AND personal_participant = ?",
        )
        .bind(owner.to_string())
        .bind(participant.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;

        match row {
            Some(row) => {
                let conversation_row = ConversationRow::from_row(&row).map_err(query_error)?;
                Ok(Some(self.hydrate(conversation_row).await?))
            }
            None => Ok(None),
        }
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let user = user_id.to_string();
        let rows = sqlx::query(&format!(
            "SELECT c.* FROM conversations c
             WHERE {MEMBER_FILTER}
             ORDER BY c.created_at ASC, c.id ASC
             LIMIT ? OFFSET ?"
        ))
        .bind(&user)
        .bind(&user)
        .bind(&user)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        self.hydrate_all(rows).await
    }

    async fn count_for_user(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
        let user = user_id.to_string();
        let row = sqlx::query(&format!(
            "SELECT COUNT(*) AS cnt FROM conversations c WHERE {MEMBER_FILTER}"
        ))
        .bind(&user)
        .bind(&user)
        .bind(&user)
        .fetch_one(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let count: i64 = row.try_get("cnt").map_err(query_error)?;
        Ok(count as u64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
