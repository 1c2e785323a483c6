//! Snapshot builder
//!
//! Materializes every user of the identity provider as a directory entry.
//! Any enumeration failure aborts the build; there are no partial snapshots.

use crate::entry::{DirectoryEntry, EntryAttribute};
use crate::layout::DirectoryLayout;
use crate::metrics;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use teabridge_core::{IdentityProvider, OrgRecord, Result, TeamRecord, UserRecord, USER_OBJECT_CLASS};
use tracing::debug;

pub struct SnapshotBuilder {
    provider: Arc<dyn IdentityProvider>,
    layout: DirectoryLayout,
}

impl SnapshotBuilder {
    pub fn new(provider: Arc<dyn IdentityProvider>, layout: DirectoryLayout) -> Self {
        Self { provider, layout }
    }

    /// Enumerate users, organizations and team memberships into entries
    pub async fn build(&self) -> Result<Vec<DirectoryEntry>> {
        let started = Instant::now();

        let (users, user_count) = self.provider.list_users().await?;
        let (orgs, org_count) = self.provider.list_organizations().await?;
        debug!(users = user_count, orgs = org_count, "Building directory snapshot");

        let orgs_by_id: HashMap<i64, &OrgRecord> = orgs.iter().map(|o| (o.id, o)).collect();

        let mut entries = Vec::with_capacity(users.len());
        for user in &users {
            let teams = self.provider.list_teams_for_user(user.id).await?;
            let member_of = self.member_of(&teams, &orgs_by_id);
            entries.push(self.user_entry(user, member_of));
        }

        metrics::record_snapshot_build(started.elapsed(), entries.len());
        debug!(
            entries = entries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Directory snapshot built"
        );

        Ok(entries)
    }

    /// Flatten team memberships into group DNs.
    ///
    /// Organizations come in the order they are first seen in `teams`, each
    /// DN immediately followed by all of that organization's teams in
    /// provider order. Teams whose organization is unknown are skipped.
    fn member_of(&self, teams: &[TeamRecord], orgs_by_id: &HashMap<i64, &OrgRecord>) -> Vec<String> {
        let mut grouped: Vec<(&OrgRecord, Vec<&TeamRecord>)> = Vec::new();
        let mut group_index: HashMap<i64, usize> = HashMap::new();

        for team in teams {
            let Some(org) = orgs_by_id.get(&team.org_id) else {
                debug!(team = %team.name, org_id = team.org_id, "Skipping team of unknown organization");
                continue;
            };
            let index = *group_index.entry(team.org_id).or_insert_with(|| {
                grouped.push((*org, Vec::new()));
                grouped.len() - 1
            });
            grouped[index].1.push(team);
        }

        let mut member_of = Vec::new();
        for (org, teams) in grouped {
            member_of.push(self.layout.org_dn(&org.name));
            for team in teams {
                member_of.push(self.layout.team_dn(&org.name, &team.name));
            }
        }

        member_of
    }

    fn user_entry(&self, user: &UserRecord, member_of: Vec<String>) -> DirectoryEntry {
        let mut entry = DirectoryEntry::new(self.layout.user_dn(&user.username));

        entry.push(EntryAttribute::single(
            self.layout.user_attribute.clone(),
            user.username.clone(),
        ));
        entry.push(EntryAttribute::single("displayName", user.display_name.clone()));
        if let Some(email) = user.visible_email() {
            entry.push(EntryAttribute::single("mail", email));
        }
        entry.push(EntryAttribute::single("loginDisabled", (!user.active).to_string()));
        if !member_of.is_empty() {
            entry.push(EntryAttribute::new("memberOf", member_of));
        }
        entry.push(EntryAttribute::single("objectClass", USER_OBJECT_CLASS));
        entry.attributes.extend(self.layout.user_parent_rdn.attributes());
        entry.attributes.extend(self.layout.base_dn.attributes());

        entry
    }
}
