//! Teabridge Core Library
//!
//! Core types, traits, and configuration for the Teabridge LDAP directory bridge.

pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use config::BridgeConfig;
pub use error::{Error, Result};
pub use provider::{AuthError, IdentityProvider};
pub use types::{OrgRecord, ResultCode, TeamRecord, UserRecord};

/// Teabridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Object class carried by every synthesized user entry
pub const USER_OBJECT_CLASS: &str = "inetorgperson";
