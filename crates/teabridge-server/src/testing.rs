//! Test fixtures: a small in-memory directory

use async_trait::async_trait;
use std::sync::Arc;
use teabridge_core::{
    AuthError, BridgeConfig, IdentityProvider, OrgRecord, Result, TeamRecord, UserRecord,
};
use teabridge_directory::DirectoryBridge;

struct StaticProvider {
    users: Vec<(UserRecord, &'static str)>,
}

#[async_trait]
impl IdentityProvider for StaticProvider {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> std::result::Result<UserRecord, AuthError> {
        let (user, expected) = self
            .users
            .iter()
            .find(|(u, _)| u.username == username)
            .ok_or_else(|| AuthError::UnknownUser(username.to_string()))?;

        if *expected == password {
            Ok(user.clone())
        } else {
            Err(AuthError::InvalidPassword)
        }
    }

    async fn list_users(&self) -> Result<(Vec<UserRecord>, u64)> {
        let users: Vec<_> = self.users.iter().map(|(u, _)| u.clone()).collect();
        let count = users.len() as u64;
        Ok((users, count))
    }

    async fn list_organizations(&self) -> Result<(Vec<OrgRecord>, u64)> {
        Ok((vec![OrgRecord::new(10, "wonderland")], 1))
    }

    async fn list_teams_for_user(&self, user_id: i64) -> Result<Vec<TeamRecord>> {
        Ok(match user_id {
            2 => vec![TeamRecord::new(100, 10, "tea")],
            _ => vec![],
        })
    }
}

/// Bridge over admin/alice/bob with the default configuration
pub fn bridge() -> Arc<DirectoryBridge> {
    let mut alice = UserRecord::new(2, "alice");
    alice.display_name = "Alice Liddell".to_string();
    alice.email = "alice@domain.com".to_string();

    let provider = StaticProvider {
        users: vec![
            (UserRecord::new(1, "admin"), "secret"),
            (alice, "password"),
            (UserRecord::new(3, "bob"), "hunter2"),
        ],
    };

    Arc::new(DirectoryBridge::new(&BridgeConfig::default(), Arc::new(provider)).unwrap())
}
