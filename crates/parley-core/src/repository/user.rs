//! User repository trait definition.

use parley_types::error::RepositoryError;
use parley_types::user::{StoredCredentials, User, UserId};

/// Repository trait for user account persistence.
///
/// Implementations live in parley-infra (e.g., SqliteUserRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait UserRepository: Send + Sync {
    /// Create a new user with its password hash. Returns `Conflict` when the
    /// username or email is already taken.
    fn create(
        &self,
        user: &User,
        password_hash: &str,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Get a user by its unique ID.
    fn get_by_id(
        &self,
        id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Look up a user and password hash by username or email.
    fn find_credentials(
        &self,
        login: &str,
    ) -> impl std::future::Future<Output = Result<Option<StoredCredentials>, RepositoryError>> + Send;

    /// List users ordered by created_at ASC.
    fn list(
        &self,
        limit: i64,
        offset: i64,
    ) -> impl std::future::Future<Output = Result<Vec<User>, RepositoryError>> + Send;

    /// Count all users.
    fn count(&self) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
