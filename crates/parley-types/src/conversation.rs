//! Conversation types: personal (two users) and group (named member set).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::{UserId, UserRef};

uuid_id!(
    /// Unique identifier for a conversation.
    ConversationId
);

/// Kind of a conversation.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (kind IN ('Personal', 'Group'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversationKind {
    Personal,
    Group,
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationKind::Personal => write!(f, "Personal"),
            ConversationKind::Group => write!(f, "Group"),
        }
    }
}

impl FromStr for ConversationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Personal" => Ok(ConversationKind::Personal),
            "Group" => Ok(ConversationKind::Group),
            other => Err(format!(
                "conversation type can either be Personal or Group, got '{other}'"
            )),
        }
    }
}

/// Who belongs to a conversation.
///
/// The variant fixes the conversation kind for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Membership {
    /// Exactly one participant besides the owner.
    Personal { participant: UserId },
    /// Named group; the owner is always part of `members`.
    Group { members: BTreeSet<UserId> },
}

/// A conversation between users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub name: String,
    pub owner: UserId,
    #[serde(flatten)]
    pub membership: Membership,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn kind(&self) -> ConversationKind {
        match self.membership {
            Membership::Personal { .. } => ConversationKind::Personal,
            Membership::Group { .. } => ConversationKind::Group,
        }
    }

    /// The non-owner participant of a personal conversation.
    pub fn personal_participant(&self) -> Option<UserId> {
        match self.membership {
            Membership::Personal { participant } => Some(participant),
            Membership::Group { .. } => None,
        }
    }

    /// Every user taking part, owner first for personal conversations and in
    /// id order for groups.
    pub fn participant_ids(&self) -> Vec<UserId> {
        match &self.membership {
            Membership::Personal { participant } => vec![self.owner, *participant],
            Membership::Group { members } => members.iter().copied().collect(),
        }
    }

    /// Canonical key for the unordered {owner, participant} pair of a
    /// personal conversation; `None` for groups.
    pub fn pair_key(&self) -> Option<String> {
        self.personal_participant()
            .map(|participant| personal_pair_key(&self.owner, &participant))
    }
}

/// Canonical `min:max` key of an unordered user pair.
pub fn personal_pair_key(a: &UserId, b: &UserId) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("{low}:{high}")
}

/// Result of a create call that may return an already existing record
/// instead of creating a duplicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome<T> {
    Created(T),
    Existing(T),
}

impl<T> CreateOutcome<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            CreateOutcome::Created(value) | CreateOutcome::Existing(value) => value,
        }
    }
}

/// Body of `POST /conversation/personal`. Exactly one participant is expected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePersonalRequest {
    #[serde(default)]
    pub participants: Vec<UserRef>,
}

/// Body of `POST /conversation/group`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateGroupRequest {
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub participants: Vec<UserRef>,
}

impl CreateGroupRequest {
    pub fn participant_ids(&self) -> Vec<UserId> {
        self.participants.iter().map(|p| p.id).collect()
    }
}

impl CreatePersonalRequest {
    pub fn participant_ids(&self) -> Vec<UserId> {
        self.participants.iter().map(|p| p.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn personal(owner: UserId, participant: UserId) -> Conversation {
        Conversation {
            id: ConversationId::new(),
            name: "bob".to_string(),
            owner,
            membership: Membership::Personal { participant },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_kind_roundtrip() {
        for kind in [ConversationKind::Personal, ConversationKind::Group] {
            let parsed: ConversationKind = kind.to_string().parse().unwrap();
            assert_eq!(kind, parsed);
        }
        assert!("personal".parse::<ConversationKind>().is_err());
    }

    #[test]
    fn test_pair_key_is_order_independent() {
        let a = UserId::new();
        let b = UserId::new();
        assert_eq!(personal_pair_key(&a, &b), personal_pair_key(&b, &a));
        assert_eq!(personal(a, b).pair_key(), personal(b, a).pair_key());
    }

    #[test]
    fn test_group_has_no_pair_key() {
        let owner = UserId::new();
        let conversation = Conversation {
            id: ConversationId::new(),
            name: "Team".to_string(),
            owner,
            membership: Membership::Group {
                members: BTreeSet::from([owner]),
            },
            created_at: Utc::now(),
        };
        assert_eq!(conversation.kind(), ConversationKind::Group);
        assert!(conversation.pair_key().is_none());
        assert!(conversation.personal_participant().is_none());
    }

    #[test]
    fn test_membership_serializes_with_type_tag() {
        let owner = UserId::new();
        let participant = UserId::new();
        let json = serde_json::to_value(personal(owner, participant)).unwrap();
        assert_eq!(json["type"], "Personal");
        assert_eq!(json["participant"], participant.to_string());
    }

    #[test]
    fn test_create_outcome_variants() {
        let created = CreateOutcome::Created(2);
        assert!(created.is_created());
        let existing = CreateOutcome::Existing(10);
        assert!(!existing.is_created());
        assert_eq!(existing.into_inner(), 10);
    }

    #[test]
    fn test_group_request_tolerates_missing_fields() {
        let req: CreateGroupRequest = serde_json::from_str("{}").unwrap();
        assert!(req.group_name.is_none());
        assert!(req.participant_ids().is_empty());
    }

    #[test]
    fn test_personal_request_reads_participant_ids() {
        let id = UserId::new();
        let req: CreatePersonalRequest =
            serde_json::from_str(&format!(r#"{{"participants":[{{"id":"{id}"}}]}}"#)).unwrap();
        assert_eq!(req.participant_ids(), vec![id]);
    }
}
