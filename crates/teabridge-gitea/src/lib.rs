//! Gitea identity provider for Teabridge
//!
//! Reads accounts, organizations and team memberships straight from a
//! Gitea database. Supports PostgreSQL and SQLite backends.

mod queries;
pub mod store;

pub use store::{Backend, GiteaStore};
