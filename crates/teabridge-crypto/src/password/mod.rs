//! Password hashing compatible with Gitea's stored credentials
//!
//! Key-derivation hashes are stored hex-encoded with the per-user salt used
//! verbatim as bytes. Bcrypt hashes are stored as modular crypt strings and
//! ignore the salt column.
//!
//! These functions are CPU bound; async callers should run them on a
//! blocking thread.

mod algorithm;

pub use algorithm::HashAlgorithm;

use hmac::Hmac;
use pwhash::bcrypt::{self, BcryptSetup, BcryptVariant};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Password hashing errors
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid hash parameters: {0}")]
    InvalidParameters(String),

    #[error("Malformed stored hash: {0}")]
    MalformedHash(String),

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

/// Hash `password` the way Gitea would store it for `algorithm`
pub fn hash_password(algorithm: &HashAlgorithm, salt: &str, password: &str) -> Result<String> {
    match *algorithm {
        HashAlgorithm::Bcrypt { cost } => bcrypt::hash_with(
            BcryptSetup {
                salt: None,
                cost: Some(cost),
                variant: Some(BcryptVariant::V2b),
            },
            password,
        )
        .map_err(|e| CryptoError::DerivationFailed(e.to_string())),
        _ => derive_key(algorithm, salt.as_bytes(), password.as_bytes()).map(hex::encode),
    }
}

/// Check `password` against a stored hash.
///
/// `algorithm` is the value of Gitea's `passwd_hash_algo` column.
pub fn verify_password(algorithm: &str, stored: &str, salt: &str, password: &str) -> Result<bool> {
    let algorithm: HashAlgorithm = algorithm.parse()?;

    if let HashAlgorithm::Bcrypt { .. } = algorithm {
        return Ok(bcrypt::verify(password, stored));
    }

    let expected = hex::decode(stored.trim())
        .map_err(|e| CryptoError::MalformedHash(e.to_string()))?;
    let derived = derive_key(&algorithm, salt.as_bytes(), password.as_bytes())?;

    Ok(derived.ct_eq(&expected).into())
}

fn derive_key(algorithm: &HashAlgorithm, salt: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    match *algorithm {
        HashAlgorithm::Pbkdf2 {
            iterations,
            key_len,
        } => {
            let mut key = vec![0u8; key_len];
            pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, iterations, &mut key)
                .map_err(|e| CryptoError::DerivationFailed(e.to_string()))?;
            Ok(key)
        }
        HashAlgorithm::Argon2 {
            iterations,
            memory_kib,
            threads,
            key_len,
        } => {
            let params = argon2::Params::new(memory_kib, iterations, threads, Some(key_len))
                .map_err(|e| CryptoError::InvalidParameters(e.to_string()))?;
            let hasher = argon2::Argon2::new(
                argon2::Algorithm::Argon2id,
                argon2::Version::V0x13,
                params,
            );

            let mut key = vec![0u8; key_len];
            hasher
                .hash_password_into(password, salt, &mut key)
                .map_err(|e| CryptoError::DerivationFailed(e.to_string()))?;
            Ok(key)
        }
        HashAlgorithm::Scrypt { n, r, p, key_len } => {
            if n < 2 || !n.is_power_of_two() {
                return Err(CryptoError::InvalidParameters(format!(
                    "scrypt N must be a power of two, got {}",
                    n
                )));
            }
            let log_n = n.trailing_zeros() as u8;
            let params = scrypt::Params::new(log_n, r, p, key_len)
                .map_err(|e| CryptoError::InvalidParameters(e.to_string()))?;

            let mut key = vec![0u8; key_len];
            scrypt::scrypt(password, salt, &params, &mut key)
                .map_err(|e| CryptoError::DerivationFailed(e.to_string()))?;
            Ok(key)
        }
        HashAlgorithm::Bcrypt { .. } => Err(CryptoError::UnsupportedAlgorithm(
            "bcrypt does not derive raw keys".to_string(),
        )),
    }
}
