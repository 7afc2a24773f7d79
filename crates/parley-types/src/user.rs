//! User account types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

uuid_id!(
    /// Unique identifier for a user account.
    UserId
);

/// A registered user.
///
/// Identity fields (username, email) are unique and never change after
/// signup. The password credential never lives on this type; see
/// [`StoredCredentials`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A user together with the stored password hash, as returned by a
/// credential lookup during login.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user: User,
    /// PHC-format password hash.
    pub password_hash: String,
}

/// Reference to a user inside a request body (`{"id": "..."}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_roundtrip() {
        let id = UserId::new();
        let parsed: UserId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        let id = UserId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn test_user_ref_deserialize() {
        let id = UserId::new();
        let json = format!("{{\"id\":\"{id}\"}}");
        let parsed: UserRef = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, id);
    }
}
