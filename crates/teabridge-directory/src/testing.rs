//! In-memory identity provider for unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use teabridge_core::{
    AuthError, Error, IdentityProvider, OrgRecord, Result, TeamRecord, UserRecord,
};

#[derive(Default)]
pub struct FakeProvider {
    users: Vec<UserRecord>,
    passwords: HashMap<String, String>,
    orgs: Vec<OrgRecord>,
    teams: HashMap<i64, Vec<TeamRecord>>,
    failing_team_lookups: Vec<i64>,
    fail_listing: bool,
    listing_delay: Option<Duration>,
    pub list_users_calls: AtomicUsize,
    pub authenticate_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(id: i64, username: &str) -> UserRecord {
        UserRecord::new(id, username)
    }

    pub fn with_user(mut self, user: UserRecord) -> Self {
        self.users.push(user);
        self
    }

    pub fn with_password(mut self, username: &str, password: &str) -> Self {
        self.passwords
            .insert(username.to_string(), password.to_string());
        self
    }

    pub fn with_org(mut self, org: OrgRecord) -> Self {
        self.orgs.push(org);
        self
    }

    pub fn with_teams(mut self, user_id: i64, teams: Vec<TeamRecord>) -> Self {
        self.teams.insert(user_id, teams);
        self
    }

    pub fn fail_teams_for(mut self, user_id: i64) -> Self {
        self.failing_team_lookups.push(user_id);
        self
    }

    pub fn fail_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Make `list_users` sleep before answering
    pub fn with_listing_delay(mut self, delay: Duration) -> Self {
        self.listing_delay = Some(delay);
        self
    }

    pub fn list_users_count(&self) -> usize {
        self.list_users_calls.load(Ordering::SeqCst)
    }

    pub fn authenticate_count(&self) -> usize {
        self.authenticate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> std::result::Result<UserRecord, AuthError> {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);

        let user = self
            .users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .ok_or_else(|| AuthError::UnknownUser(username.to_string()))?;

        if !user.active {
            return Err(AuthError::LoginProhibited(user.username.clone()));
        }

        match self.passwords.get(&user.username) {
            Some(expected) if expected == password => Ok(user.clone()),
            _ => Err(AuthError::InvalidPassword),
        }
    }

    async fn list_users(&self) -> Result<(Vec<UserRecord>, u64)> {
        self.list_users_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.listing_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_listing {
            return Err(Error::Provider("user listing unavailable".to_string()));
        }
        Ok((self.users.clone(), self.users.len() as u64))
    }

    async fn list_organizations(&self) -> Result<(Vec<OrgRecord>, u64)> {
        Ok((self.orgs.clone(), self.orgs.len() as u64))
    }

    async fn list_teams_for_user(&self, user_id: i64) -> Result<Vec<TeamRecord>> {
        if self.failing_team_lookups.contains(&user_id) {
            return Err(Error::Provider(format!("teams of user {} unavailable", user_id)));
        }
        Ok(self.teams.get(&user_id).cloned().unwrap_or_default())
    }
}
