//! Credential store seam and password hashing helpers.

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn exists(&self, identity: &str) -> Result<bool>;

    /// Whether `secret` matches the stored hash for `identity`.
    /// Unknown identities yield `false`, never an error.
    async fn verify(&self, identity: &str, secret: &str) -> Result<bool>;
}

/// Hex encoded SHA-256 of the password, as stored in `users.password_hash`.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash `secret` and compare it with `stored_hash` without short-circuiting.
///
/// When there is no stored hash the candidate is still hashed so the cost of
/// an unknown identity looks like a wrong password.
#[must_use]
pub fn secret_matches(stored_hash: Option<&str>, secret: &str) -> bool {
    let candidate = hash_password(secret);
    match stored_hash {
        Some(stored) => {
            let stored = stored.trim().to_ascii_lowercase();
            candidate.as_bytes().ct_eq(stored.as_bytes()).into()
        }
        None => false,
    }
}
