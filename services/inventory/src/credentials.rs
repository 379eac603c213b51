//! Password hashing and organisational email rules

use argon2::{
    Argon2, PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Minimum password length, counted in characters
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Error raised when a password cannot be hashed
#[derive(Debug, Error)]
#[error("failed to hash password: {0}")]
pub struct HashError(String);

/// A salted password hash in PHC string format.
///
/// The value never leaves the process in logs: `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a hash loaded from storage
    pub fn from_stored(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    /// The PHC string to persist
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordHash([REDACTED])")
    }
}

/// Derive a salted Argon2id hash of `plain`
pub fn hash_password(plain: &str) -> Result<PasswordHash, HashError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| HashError(e.to_string()))?;

    Ok(PasswordHash(hash.to_string()))
}

/// Check `plain` against a stored hash.
///
/// The digest comparison is constant-time. A stored value that is not a valid
/// PHC string never verifies.
pub fn verify_password(plain: &str, stored: &PasswordHash) -> bool {
    match PhcHash::new(stored.as_str()) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Spend the same Argon2 work as [`verify_password`] when no account matched.
///
/// Always `false`. Keeps unknown and known emails indistinguishable by
/// response time.
pub fn verify_without_account(plain: &str) -> bool {
    static DUMMY_HASH: OnceLock<Option<PasswordHash>> = OnceLock::new();

    match DUMMY_HASH.get_or_init(|| hash_password("inventory-no-such-account").ok()) {
        Some(dummy) => {
            let _ = verify_password(plain, dummy);
        }
        None => tracing::warn!("Dummy password hash unavailable"),
    }
    false
}

/// Password length rule shared by registration and administrator add
pub fn is_long_enough(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

/// Whitelist of account emails: one organisation domain, simple local parts.
#[derive(Debug, Clone)]
pub struct EmailPolicy {
    domain: String,
    pattern: Regex,
}

impl EmailPolicy {
    /// Compile the policy for `domain`, e.g. `nucleusteq.com`
    pub fn new(domain: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"^[A-Za-z][A-Za-z0-9_.]*@{}$",
            regex::escape(domain)
        ))?;

        Ok(Self {
            domain: domain.to_string(),
            pattern,
        })
    }

    /// The organisation domain accepted by this policy
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn is_valid_email(&self, candidate: &str) -> bool {
        self.pattern.is_match(candidate)
    }
}
