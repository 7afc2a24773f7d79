//! Route handlers, one module per resource.

pub mod auth;
pub mod conversation;
pub mod health;
pub mod message;
pub mod user;
