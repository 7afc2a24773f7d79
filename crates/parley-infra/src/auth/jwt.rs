//! HS256 JWT access tokens.
//!
//! Implements the `TokenIssuer` port from `parley-core` with `jsonwebtoken`.
//! Each token carries the caller's identity and a unique `jti` so it can be
//! revoked individually on logout.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use parley_core::auth::TokenIssuer;
use parley_types::auth::{AccessToken, AuthenticatedUser};
use parley_types::error::AuthError;
use parley_types::identity::Identity;
use parley_types::user::UserId;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims carried by a Parley access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    /// User id.
    sub: String,
    username: String,
    name: String,
    email: String,
    jti: String,
    iat: i64,
    exp: i64,
}

pub struct JwtTokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtTokenIssuer {
    /// Build an issuer signing with `secret`; tokens live for `ttl`.
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl,
        }
    }
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>, AuthError> {
    DateTime::from_timestamp(seconds, 0).ok_or(AuthError::InvalidToken)
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, identity: &Identity) -> Result<AccessToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: identity.id.to_string(),
            username: identity.username.clone(),
            name: identity.name.clone(),
            email: identity.email.clone(),
            jti: uuid::Uuid::now_v7().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, "failed to sign access token");
            AuthError::Internal
        })?;

        Ok(AccessToken {
            access_token: token,
            token_type: "Bearer",
            expires_at: timestamp(claims.exp)?,
            jti: claims.jti,
        })
    }

    fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!(error = %e, "access token rejected");
            AuthError::InvalidToken
        })?;
        let claims = data.claims;

        let id: UserId = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthenticatedUser {
            identity: Identity {
                id,
                username: claims.username,
                name: claims.name,
                email: claims.email,
            },
            jti: claims.jti,
            expires_at: timestamp(claims.exp)?,
        })
    }
}
