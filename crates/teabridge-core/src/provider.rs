//! Identity provider trait
//!
//! Defines the narrow capability set the directory bridge consumes from the
//! remote identity provider. Implementations exist for the Gitea database.

use crate::types::{OrgRecord, TeamRecord, UserRecord};
use crate::Result;
use async_trait::async_trait;
use thiserror::Error;

/// Reasons a credential check can fail
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("User does not exist: {0}")]
    UnknownUser(String),

    #[error("Invalid password")]
    InvalidPassword,

    #[error("User is prohibited from logging in: {0}")]
    LoginProhibited(String),

    #[error("Identity provider error: {0}")]
    Provider(String),
}

impl From<crate::Error> for AuthError {
    fn from(err: crate::Error) -> Self {
        AuthError::Provider(err.to_string())
    }
}

/// Identity provider capability set
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a username/password pair and return the matching account
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> std::result::Result<UserRecord, AuthError>;

    /// All individual accounts, inactive ones included, with the total count
    async fn list_users(&self) -> Result<(Vec<UserRecord>, u64)>;

    /// All organization accounts with the total count
    async fn list_organizations(&self) -> Result<(Vec<OrgRecord>, u64)>;

    /// Teams the user belongs to, in provider order
    async fn list_teams_for_user(&self, user_id: i64) -> Result<Vec<TeamRecord>>;
}
