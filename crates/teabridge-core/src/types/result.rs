//! LDAP result codes (RFC 4511, section 4.1.9)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result codes produced by the directory bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultCode {
    Success,
    OperationsError,
    InvalidDnSyntax,
    InvalidCredentials,
    InsufficientAccessRights,
    UnwillingToPerform,
    Other,
}

impl ResultCode {
    /// Numeric value sent on the wire
    pub fn code(&self) -> u32 {
        match self {
            Self::Success => 0,
            Self::OperationsError => 1,
            Self::InvalidDnSyntax => 34,
            Self::InvalidCredentials => 49,
            Self::InsufficientAccessRights => 50,
            Self::UnwillingToPerform => 53,
            Self::Other => 80,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::OperationsError => "operations_error",
            Self::InvalidDnSyntax => "invalid_dn_syntax",
            Self::InvalidCredentials => "invalid_credentials",
            Self::InsufficientAccessRights => "insufficient_access_rights",
            Self::UnwillingToPerform => "unwilling_to_perform",
            Self::Other => "other",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.code())
    }
}
