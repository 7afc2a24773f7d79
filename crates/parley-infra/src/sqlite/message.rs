//! SQLite message repository implementation.
//!
//! `created_at` is stored in fixed-width form, so ordering and the strict
//! "after" comparison used by polling run directly on the text column.

use chrono::{DateTime, Utc};
use parley_core::repository::message::MessageRepository;
use parley_types::conversation::ConversationId;
use parley_types::error::RepositoryError;
use parley_types::message::{Message, MessageId};
use parley_types::user::UserId;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, parse_datetime, query_error};

/// SQLite-backed implementation of `MessageRepository`.
pub struct SqliteMessageRepository {
    pool: DatabasePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct MessageRow {
    id: String,
    conversation_id: String,
    owner: String,
    content: String,
    created_at: String,
    updated_at: Option<String>,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            owner: row.try_get("owner")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let id: MessageId = self
            .id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let conversation_id: ConversationId = self
            .conversation_id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid conversation_id: {e}")))?;
        let owner: UserId = self
            .owner
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid owner: {e}")))?;

        Ok(Message {
            id,
            conversation_id,
            owner,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: self.updated_at.as_deref().map(parse_datetime).transpose()?,
        })
    }
}

fn into_messages(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Message>, RepositoryError> {
    let mut messages = Vec::with_capacity(rows.len());
    for row in rows {
        let msg_row = MessageRow::from_row(row).map_err(query_error)?;
        messages.push(msg_row.into_message()?);
    }
    Ok(messages)
}

fn into_optional(row: Option<sqlx::sqlite::SqliteRow>) -> Result<Option<Message>, RepositoryError> {
    match row {
        Some(row) => Ok(Some(
            MessageRow::from_row(&row).map_err(query_error)?.into_message()?,
        )),
        None => Ok(None),
    }
}

impl MessageRepository for SqliteMessageRepository {
    async fn save(&self, message: &Message) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO messages (id, conversation_id, owner, content, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(message.id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(message.owner.to_string())
        .bind(&message.content)
        .bind(format_datetime(&message.created_at))
        .bind(message.updated_at.as_ref().map(format_datetime))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "message timestamp {} already used in conversation {}",
                format_datetime(&message.created_at),
                message.conversation_id
            ))),
            Err(e) => Err(query_error(e)),
        }
    }

    async fn get_by_id(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        into_optional(row)
    }

    async fn list(
        &self,
        conversation_id: &ConversationId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE conversation_id = ?
             ORDER BY created_at ASC, id ASC
             LIMIT ? OFFSET ?",
        )
        .bind(conversation_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        into_messages(&rows)
    }

    async fn count(&self, conversation_id: &ConversationId) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM messages WHERE conversation_id = ?")
            .bind(conversation_id.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let count: i64 = row.try_get("cnt").map_err(query_error)?;
        Ok(count as u64)
    }

    async fn latest(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<Message>, RepositoryError> {
        // Read through the writer so a send sees the message committed just before it.
        let row = sqlx::query(
            "SELECT * FROM messages WHERE conversation_id = ?
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(conversation_id.to_string())
        .fetch_optional(&self.pool.writer)
        .await
        .map_err(query_error)?;
        into_optional(row)
    }

    async fn latest_by_owner(
        &self,
        conversation_id: &ConversationId,
        owner: &UserId,
    ) -> Result<Option<Message>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM messages WHERE conversation_id = ? AND owner = ?
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(conversation_id.to_string())
        .bind(owner.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;
        into_optional(row)
    }

    async fn list_after(
        &self,
        conversation_id: &ConversationId,
        after: &DateTime<Utc>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE conversation_id = ? AND created_at > ?
             ORDER BY created_at ASC, id ASC",
        )
        .bind(conversation_id.to_string())
        .bind(format_datetime(after))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        into_messages(&rows)
    }
}
