//! Shape of the synthetic directory tree

use crate::dn::CanonicalName;
use teabridge_core::config::LdapConfig;

/// Where users and groups live and how they are named
#[derive(Debug, Clone)]
pub struct DirectoryLayout {
    pub base_dn: CanonicalName,
    pub user_parent_rdn: CanonicalName,
    pub user_attribute: String,
    pub group_parent_rdn: CanonicalName,
    pub group_attribute: String,
}

impl Default for DirectoryLayout {
    fn default() -> Self {
        Self::from_config(&LdapConfig::default())
    }
}

impl DirectoryLayout {
    pub fn from_config(config: &LdapConfig) -> Self {
        Self {
            base_dn: CanonicalName::parse(&config.base_dn),
            user_parent_rdn: CanonicalName::parse(&config.user_parent_rdn),
            user_attribute: config.user_attribute.clone(),
            group_parent_rdn: CanonicalName::parse(&config.group_parent_rdn),
            group_attribute: config.group_attribute.clone(),
        }
    }

    /// `uid=<username>,ou=users,<base>`
    pub fn user_dn(&self, username: &str) -> String {
        format!(
            "{}={},{},{}",
            self.user_attribute, username, self.user_parent_rdn, self.base_dn
        )
    }

    /// `cn=<org>,ou=groups,<base>`
    pub fn org_dn(&self, org: &str) -> String {
        format!(
            "{}={},{},{}",
            self.group_attribute, org, self.group_parent_rdn, self.base_dn
        )
    }

    /// `cn=<org>[<team>],ou=groups,<base>`
    pub fn team_dn(&self, org: &str, team: &str) -> String {
        format!(
            "{}={}[{}],{},{}",
            self.group_attribute, org, team, self.group_parent_rdn, self.base_dn
        )
    }
}
