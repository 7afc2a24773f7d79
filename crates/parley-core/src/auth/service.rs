//! Authentication service.
//!
//! Owns the account lifecycle (signup, login) and the token lifecycle
//! (authenticate, logout, sweeping expired revocations).

use chrono::Utc;

use parley_types::auth::{
    AuthenticatedUser, LoginRequest, LoginResponse, MIN_PASSWORD_LEN, RevokedToken,
    SignupRequest,
};
use parley_types::error::{AuthError, RepositoryError};
use parley_types::identity::Identity;
use parley_types::user::{User, UserId};

use crate::repository::token::RevokedTokenRepository;
use crate::repository::user::UserRepository;

use super::{PasswordHasher, TokenIssuer};

fn storage_failure(err: RepositoryError) -> AuthError {
    tracing::error!(error = %err, "auth storage operation failed");
    AuthError::Internal
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::Validation(format!("{field} is required")));
    }
    Ok(value)
}

/// Service for accounts and access tokens.
///
/// Generic over the storage and crypto ports so parley-core stays free of
/// database and hashing dependencies.
pub struct AuthService<U, T, H, I>
where
    U: UserRepository,
    T: RevokedTokenRepository,
    H: PasswordHasher,
    I: TokenIssuer,
{
    users: U,
    revoked: T,
    hasher: H,
    issuer: I,
}

impl<U, T, H, I> AuthService<U, T, H, I>
where
    U: UserRepository,
    T: RevokedTokenRepository,
    H: PasswordHasher,
    I: TokenIssuer,
{
    pub fn new(users: U, revoked: T, hasher: H, issuer: I) -> Self {
        Self {
            users,
            revoked,
            hasher,
            issuer,
        }
    }

    /// Register a new account.
    pub async fn signup(&self, request: SignupRequest) -> Result<User, AuthError> {
        let name = required("name", &request.name)?;
        let username = required("username", &request.username)?;
        let email = required("email", &request.email)?;
        if request.password.trim().is_empty() {
            return Err(AuthError::Validation("password is required".to_string()));
        }
        if !email.contains('@') {
            return Err(AuthError::Validation("email is invalid".to_string()));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password_hash = self.hasher.hash(&request.password)?;
        let user = User {
            id: UserId::new(),
            name: name.to_string(),
            email: email.to_lowercase(),
            username: username.to_string(),
            created_at: Utc::now(),
        };

        let created = self
            .users
            .create(&user, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    AuthError::Conflict("username or email already exists".to_string())
                }
                other => storage_failure(other),
            })?;
        tracing::info!(user_id = %created.id, username = %created.username, "user signed up");
        Ok(created)
    }

    /// Exchange a username or email plus password for an access token.
    ///
    /// Unknown accounts and wrong passwords fail identically.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        let login = required("login", &request.login)?;
        if request.password.is_empty() {
            return Err(AuthError::Validation("password is required".to_string()));
        }

        let credentials = self
            .users
            .find_credentials(login)
            .await
            .map_err(storage_failure)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self
            .hasher
            .verify(&request.password, &credentials.password_hash)?
        {
            tracing::info!(user_id = %credentials.user.id, "login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issuer.issue(&Identity::from(&credentials.user))?;
        tracing::info!(user_id = %credentials.user.id, "user logged in");
        Ok(LoginResponse {
            token,
            user: credentials.user,
        })
    }

    /// Resolve a bearer token to its caller. Revoked tokens are rejected.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let authenticated = self.issuer.verify(token)?;
        if self
            .revoked
            .is_revoked(&authenticated.jti)
            .await
            .map_err(storage_failure)?
        {
            return Err(AuthError::TokenRevoked);
        }
        Ok(authenticated)
    }

    /// Revoke the caller's current token until it would have expired anyway.
    pub async fn logout(&self, current: &AuthenticatedUser) -> Result<(), AuthError> {
        let record = RevokedToken {
            jti: current.jti.clone(),
            revoked_at: Utc::now(),
            expires_at: current.expires_at,
        };
        self.revoked.revoke(&record).await.map_err(storage_failure)?;
        tracing::info!(user_id = %current.identity.id, "access token revoked");
        Ok(())
    }

    /// Drop revocation records for tokens that have expired on their own.
    pub async fn purge_expired_revocations(&self) -> Result<u64, AuthError> {
        let removed = self
            .revoked
            .purge_expired(&Utc::now())
            .await
            .map_err(storage_failure)?;
        if removed > 0 {
            tracing::debug!(removed, "expired token revocations purged");
        }
        Ok(removed)
    }
}
