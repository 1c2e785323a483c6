//! Teabridge Directory - LDAP view over an identity provider
//!
//! Builds a synthetic directory tree out of the identity provider's flat
//! user/organization/team model and answers bind and search requests
//! against it.
//!
//! ```text
//!  LDAP server ──► DirectoryBridge ──► SnapshotCache ──► SnapshotBuilder ──► IdentityProvider
//!                       │
//!                       └──► CanonicalName (DN parsing, suffix matching)
//! ```
//!
//! Entries are laid out as:
//!
//! - users: `uid=<username>,ou=users,<base dn>`
//! - organizations: `cn=<org>,ou=groups,<base dn>`
//! - teams: `cn=<org>[<team>],ou=groups,<base dn>`

mod bridge;
mod cache;
mod dn;
mod entry;
mod filter;
mod layout;
pub mod metrics;
mod snapshot;

#[cfg(test)]
mod testing;

pub use bridge::{DirectoryBridge, SearchRequest, SearchResult, SearchScope};
pub use cache::SnapshotCache;
pub use dn::{strip_suffix, CanonicalName};
pub use entry::{DirectoryEntry, EntryAttribute};
pub use filter::Filter;
pub use layout::DirectoryLayout;
pub use snapshot::SnapshotBuilder;
