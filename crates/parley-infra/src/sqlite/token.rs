//! SQLite revoked-token repository implementation.

use chrono::{DateTime, Utc};
use parley_core::repository::token::RevokedTokenRepository;
use parley_types::auth::RevokedToken;
use parley_types::error::RepositoryError;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, query_error};

/// SQLite-backed implementation of `RevokedTokenRepository`.
pub struct SqliteRevokedTokenRepository {
    pool: DatabasePool,
}

impl SqliteRevokedTokenRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl RevokedTokenRepository for SqliteRevokedTokenRepository {
    async fn revoke(&self, token: &RevokedToken) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO revoked_tokens (jti, revoked_at, expires_at) VALUES (?, ?, ?)
             ON CONFLICT (jti) DO NOTHING",
        )
        .bind(&token.jti)
        .bind(format_datetime(&token.revoked_at))
        .bind(format_datetime(&token.expires_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM revoked_tokens WHERE jti = ?")
            .bind(jti)
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let count: i64 = row.try_get("cnt").map_err(query_error)?;
        Ok(count > 0)
    }

    async fn purge_expired(&self, now: &DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < ?")
            .bind(format_datetime(now))
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected())
    }
}
