//! Access-token adapters.

pub mod jwt;
