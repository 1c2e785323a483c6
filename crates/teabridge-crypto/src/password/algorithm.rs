//! Gitea password hash algorithm descriptors
//!
//! Gitea stores the algorithm next to each hash, either as a bare name
//! (`pbkdf2`, `argon2`, ...) or with explicit parameters separated by `$`
//! (`pbkdf2$50000$50`, `argon2$2$65536$8$50`).

use super::CryptoError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// PBKDF2 with HMAC-SHA256
    Pbkdf2 { iterations: u32, key_len: usize },
    /// Argon2id, version 0x13
    Argon2 {
        iterations: u32,
        memory_kib: u32,
        threads: u32,
        key_len: usize,
    },
    Scrypt {
        n: u64,
        r: u32,
        p: u32,
        key_len: usize,
    },
    /// Stored hash is a modular crypt string; cost applies to new hashes only
    Bcrypt { cost: u32 },
}

/// Expand the named presets to their parameterized form
fn resolve_alias(spec: &str) -> &str {
    match spec {
        "pbkdf2" | "pbkdf2_v1" => "pbkdf2$10000$50",
        "pbkdf2_v2" => "pbkdf2$50000$50",
        "pbkdf2_hi" => "pbkdf2$320000$50",
        "argon2" => "argon2$2$65536$8$50",
        "scrypt" => "scrypt$65536$16$2$50",
        "bcrypt" => "bcrypt$10",
        other => other,
    }
}

fn param<T: FromStr>(spec: &str, value: Option<&str>, what: &str) -> Result<T, CryptoError> {
    value
        .ok_or_else(|| CryptoError::InvalidParameters(format!("{}: missing {}", spec, what)))?
        .parse()
        .map_err(|_| CryptoError::InvalidParameters(format!("{}: bad {}", spec, what)))
}

impl FromStr for HashAlgorithm {
    type Err = CryptoError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let spec = resolve_alias(spec.trim());
        let mut parts = spec.split('$');
        let name = parts.next().unwrap_or_default();

        let algorithm = match name {
            "pbkdf2" => Self::Pbkdf2 {
                iterations: param(spec, parts.next(), "iterations")?,
                key_len: param(spec, parts.next(), "key length")?,
            },
            "argon2" => Self::Argon2 {
                iterations: param(spec, parts.next(), "iterations")?,
                memory_kib: param(spec, parts.next(), "memory")?,
                threads: param(spec, parts.next(), "threads")?,
                key_len: param(spec, parts.next(), "key length")?,
            },
            "scrypt" => Self::Scrypt {
                n: param(spec, parts.next(), "N")?,
                r: param(spec, parts.next(), "r")?,
                p: param(spec, parts.next(), "p")?,
                key_len: param(spec, parts.next(), "key length")?,
            },
            "bcrypt" => Self::Bcrypt {
                cost: param(spec, parts.next(), "cost")?,
            },
            _ => return Err(CryptoError::UnsupportedAlgorithm(spec.to_string())),
        };

        if parts.next().is_some() {
            return Err(CryptoError::InvalidParameters(format!(
                "{}: too many parameters",
                spec
            )));
        }

        Ok(algorithm)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pbkdf2 {
                iterations,
                key_len,
            } => write!(f, "pbkdf2${}${}", iterations, key_len),
            Self::Argon2 {
                iterations,
                memory_kib,
                threads,
                key_len,
            } => write!(
                f,
                "argon2${}${}${}${}",
                iterations, memory_kib, threads, key_len
            ),
            Self::Scrypt { n, r, p, key_len } => write!(f, "scrypt${}${}${}${}", n, r, p, key_len),
            Self::Bcrypt { cost } => write!(f, "bcrypt${}", cost),
        }
    }
}
