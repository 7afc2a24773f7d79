//! Signup, login, and access-token types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::user::User;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Request body for creating a new account.
///
/// Fields default to empty so that missing values surface as validation
/// errors naming the field instead of a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for logging in. `login` matches a username or an email.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default, alias = "username", alias = "email")]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

/// A freshly issued access token.
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    #[serde(skip)]
    pub jti: String,
}

/// Successful login payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub token: AccessToken,
    pub user: User,
}

/// A verified token: who the caller is plus the token's own identity.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub identity: Identity,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

/// A token revoked through logout.
///
/// Kept until `expires_at`; after that the token is rejected on expiry alone
/// and the record can be swept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokedToken {
    pub jti: String,
    pub revoked_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_accepts_username_alias() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"username":"ada","password":"secret-pass"}"#).unwrap();
        assert_eq!(req.login, "ada");
    }

    #[test]
    fn test_login_request_accepts_email_alias() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"ada@example.com","password":"x"}"#).unwrap();
        assert_eq!(req.login, "ada@example.com");
    }

    #[test]
    fn test_signup_request_missing_fields_default_to_empty() {
        let req: SignupRequest = serde_json::from_str(r#"{"name":"Ada"}"#).unwrap();
        assert_eq!(req.name, "Ada");
        assert!(req.username.is_empty());
        assert!(req.password.is_empty());
    }
}
