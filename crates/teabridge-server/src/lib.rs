//! LDAP server for Teabridge
//!
//! Speaks the LDAP wire protocol over TCP and hands bind and search
//! requests to a [`DirectoryBridge`](teabridge_directory::DirectoryBridge).
//! Scope, filter, attribute selection and size limits are applied here to
//! the entries the bridge returns.

pub mod error;
mod search;
pub mod server;
pub mod session;

#[cfg(test)]
mod testing;

pub use error::{Result, ServerError};
pub use server::LdapServer;
pub use session::LdapSession;
