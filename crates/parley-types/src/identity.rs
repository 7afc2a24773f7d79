//! The authenticated caller of a request.

use serde::{Deserialize, Serialize};

use crate::user::{User, UserId};

/// Identity context supplied by the auth layer for every authenticated call.
///
/// Carries only what the token asserts; the core never reads token contents
/// beyond this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}
