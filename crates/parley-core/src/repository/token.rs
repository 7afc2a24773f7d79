//! Revoked access token repository trait definition.

use chrono::{DateTime, Utc};
use parley_types::auth::RevokedToken;
use parley_types::error::RepositoryError;

/// Repository trait for the access token revocation list.
pub trait RevokedTokenRepository: Send + Sync {
    /// Record a token as revoked (idempotent).
    fn revoke(
        &self,
        token: &RevokedToken,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Whether the token with this jti has been revoked.
    fn is_revoked(
        &self,
        jti: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete revocations whose token expired before `now`. Returns the
    /// number of records removed.
    fn purge_expired(
        &self,
        now: &DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
