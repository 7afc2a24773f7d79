//! Business logic and repository trait definitions for Parley.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, plus the access-control and pagination rules of the chat
//! backend. It depends only on `parley-types` -- never on `parley-infra` or
//! any database/IO crate.

pub mod auth;
pub mod conversation;
pub mod directory;
pub mod pagination;
pub mod repository;
pub mod timeline;

#[cfg(test)]
pub(crate) mod testing;
