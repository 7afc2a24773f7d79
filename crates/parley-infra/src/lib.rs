//! Infrastructure layer for Parley.
//!
//! Contains implementations of the ports defined in `parley-core`: SQLite
//! repositories, Argon2 password hashing, and JWT access tokens, plus the
//! `config.toml` loader.

pub mod auth;
pub mod config;
pub mod crypto;
pub mod sqlite;
