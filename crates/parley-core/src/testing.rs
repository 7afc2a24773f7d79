//! In-memory repository used by the service tests in this crate.
//!
//! One store implements every repository trait so a single instance (cloned)
//! can back all the generics of a service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use parley_types::auth::RevokedToken;
use parley_types::conversation::{Conversation, ConversationId};
use parley_types::error::RepositoryError;
use parley_types::message::{Message, MessageId};
use parley_types::user::{StoredCredentials, User, UserId};

use crate::conversation::membership::is_member;
use crate::repository::conversation::ConversationRepository;
use crate::repository::message::MessageRepository;
use crate::repository::token::RevokedTokenRepository;
use crate::repository::user::UserRepository;

#[derive(Default)]
struct State {
    users: Vec<(User, String)>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    revoked: HashMap<String, RevokedToken>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user directly, bypassing signup.
    pub fn add_user(&self, username: &str) -> User {
        let user = User {
            id: UserId::new(),
            name: format!("{username} name"),
            email: format!("{username}@example.com"),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .unwrap()
            .users
            .push((user.clone(), "hash".to_string()));
        user
    }

    /// Make every subsequent write fail with a query error.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn message_count(&self) -> usize {
        self.state.lock().unwrap().messages.len()
    }

    pub fn conversation_count(&self) -> usize {
        self.state.lock().unwrap().conversations.len()
    }

    fn check_write(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(RepositoryError::Query("disk I/O error".to_string()))
        } else {
            Ok(())
        }
    }
}

fn sorted_messages(mut messages: Vec<Message>) -> Vec<Message> {
    messages.sort_by_key(|m| m.created_at);
    messages
}

fn window<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect()
}

impl UserRepository for InMemoryStore {
    async fn create(&self, user: &User, password_hash: &str) -> Result<User, RepositoryError> {
        self.check_write()?;
        let mut state = self.state.lock().unwrap();
        if state
            .users
            .iter()
            .any(|(u, _)| u.username == user.username || u.email == user.email)
        {
            return Err(RepositoryError::Conflict(
                "username or email already exists".to_string(),
            ));
        }
        state.users.push((user.clone(), password_hash.to_string()));
        Ok(user.clone())
    }

    async fn get_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|(u, _)| u.id == *id)
            .map(|(u, _)| u.clone()))
    }

    async fn find_credentials(
        &self,
        login: &str,
    ) -> Result<Option<StoredCredentials>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|(u, _)| u.username == login || u.email == login)
            .map(|(u, hash)| StoredCredentials {
                user: u.clone(),
                password_hash: hash.clone(),
            }))
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let users = state.users.iter().map(|(u, _)| u.clone()).collect();
        Ok(window(users, limit, offset))
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.state.lock().unwrap().users.len() as u64)
    }
}

impl ConversationRepository for InMemoryStore {
    async fn create(&self, conversation: &Conversation) -> Result<Conversation, RepositoryError> {
        self.check_write()?;
        let mut state = self.state.lock().unwrap();
        if let Some(key) = conversation.pair_key() {
            if state
                .conversations
                .iter()
                .any(|c| c.pair_key().as_ref() == Some(&key))
            {
                return Err(RepositoryError::Conflict(format!(
                    "personal conversation '{key}' already exists"
                )));
            }
        }
        state.conversations.push(conversation.clone());
        Ok(conversation.clone())
    }

    async fn get_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.conversations.iter().find(|c| c.id == *id).cloned())
    }

    async fn find_personal(
        &self,
        owner: &UserId,
        participant: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .conversations
            .iter()
            .find(|c| c.owner == *owner && c.personal_participant() == Some(*participant))
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let matching = state
            .conversations
            .iter()
            .filter(|c| is_member(c, user_id))
            .cloned()
            .collect();
        Ok(window(matching, limit, offset))
    }

    async fn count_for_user(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .conversations
            .iter()
            .filter(|c| is_member(c, user_id))
            .count() as u64)
    }
}

impl MessageRepository for InMemoryStore {
    async fn save(&self, message: &Message) -> Result<(), RepositoryError> {
        self.check_write()?;
        let mut state = self.state.lock().unwrap();
        if state.messages.iter().any(|m| {
            m.conversation_id == message.conversation_id && m.created_at == message.created_at
        }) {
            return Err(RepositoryError::Conflict(format!(
                "message timestamp {} already used",
                message.created_at
            )));
        }
        state.messages.push(message.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.messages.iter().find(|m| m.id == *id).cloned())
    }

    async fn list(
        &self,
        conversation_id: &ConversationId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let messages = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .cloned()
            .collect();
        Ok(window(sorted_messages(messages), limit, offset))
    }

    async fn count(&self, conversation_id: &ConversationId) -> Result<u64, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .messages
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .count() as u64)
    }

    async fn latest(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<Message>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .messages
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .max_by_key(|m| m.created_at)
            .cloned())
    }

    async fn latest_by_owner(
        &self,
        conversation_id: &ConversationId,
        owner: &UserId,
    ) -> Result<Option<Message>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .messages
            .iter()
            .filter(|m| m.conversation_id == *conversation_id && m.owner == *owner)
            .max_by_key(|m| m.created_at)
            .cloned())
    }

    async fn list_after(
        &self,
        conversation_id: &ConversationId,
        after: &DateTime<Utc>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let messages = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == *conversation_id && m.created_at > *after)
            .cloned()
            .collect();
        Ok(sorted_messages(messages))
    }
}

impl RevokedTokenRepository for InMemoryStore {
    async fn revoke(&self, token: &RevokedToken) -> Result<(), RepositoryError> {
        self.check_write()?;
        self.state
            .lock()
            .unwrap()
            .revoked
            .insert(token.jti.clone(), token.clone());
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, RepositoryError> {
        Ok(self.state.lock().unwrap().revoked.contains_key(jti))
    }

    async fn purge_expired(&self, now: &DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let before = state.revoked.len();
        state.revoked.retain(|_, token| token.expires_at >= *now);
        Ok((before - state.revoked.len()) as u64)
    }
}
