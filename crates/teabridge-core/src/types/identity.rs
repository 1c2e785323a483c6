//! Identity provider records
//!
//! Read-only views of the accounts, organizations and teams pulled from the
//! identity provider on every enumeration. Nothing in Teabridge mutates them.

use serde::{Deserialize, Serialize};

/// Individual user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    /// Unique login name, used as the RDN value of the user entry
    pub username: String,
    pub display_name: String,
    pub email: String,
    /// The user asked for the email address to stay hidden
    #[serde(default)]
    pub email_private: bool,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl UserRecord {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            display_name: String::new(),
            email: String::new(),
            email_private: false,
            active: true,
        }
    }

    /// Email address that may be published, if any
    pub fn visible_email(&self) -> Option<&str> {
        if self.email_private || self.email.is_empty() {
            None
        } else {
            Some(&self.email)
        }
    }
}

/// Organization account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgRecord {
    pub id: i64,
    pub name: String,
}

impl OrgRecord {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Team inside an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: i64,
    pub org_id: i64,
    pub name: String,
}

impl TeamRecord {
    pub fn new(id: i64, org_id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            org_id,
            name: name.into(),
        }
    }
}
