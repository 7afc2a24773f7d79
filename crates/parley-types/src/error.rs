use thiserror::Error;

/// Errors related to conversation and message operations.
///
/// `Internal` deliberately carries no detail: the underlying cause is logged
/// where it is caught and never reaches the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("access denied")]
    AccessDenied,

    #[error("{0}")]
    NotFound(String),

    #[error("internal error")]
    Internal,
}

/// Errors related to signup, login, and token handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("token has been revoked")]
    TokenRevoked,

    #[error("internal error")]
    Internal,
}

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}
