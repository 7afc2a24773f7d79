//! Account signup, login, and access-token handling.
//!
//! Password hashing and token signing are ports here; the Argon2 and JWT
//! adapters live in parley-infra.

pub mod service;

use parley_types::auth::{AccessToken, AuthenticatedUser};
use parley_types::error::AuthError;
use parley_types::identity::Identity;

/// One-way password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password into a self-describing string (salt included).
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Check a plaintext password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Issues and verifies signed access tokens.
pub trait TokenIssuer: Send + Sync {
    /// Issue a token asserting `identity`, with a fresh unique jti.
    fn issue(&self, identity: &Identity) -> Result<AccessToken, AuthError>;

    /// Check signature and expiry. Revocation is not consulted here.
    fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
