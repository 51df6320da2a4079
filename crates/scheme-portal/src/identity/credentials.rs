use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand_core::OsRng;
use std::sync::Arc;
use tokio::task;

use super::IdentityError;

/// One-way credential hashing with a per-hash salt.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, IdentityError>;

    /// A mismatch, or an unparseable stored hash, is a denial rather than an error.
    fn verify(&self, plaintext: &str, hash: &str) -> bool;
}

/// Argon2id with default parameters, producing PHC strings (`$argon2id$v=19$...`).
#[derive(Debug, Default, Clone)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, IdentityError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|error| IdentityError::Hash(error.to_string()))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Hash on the blocking pool so Argon2 never stalls an async worker.
pub async fn hash_off_thread(
    hasher: &Arc<dyn CredentialHasher>,
    plaintext: &str,
) -> Result<String, IdentityError> {
    let hasher = Arc::clone(hasher);
    let plaintext = plaintext.to_string();
    task::spawn_blocking(move || hasher.hash(&plaintext))
        .await
        .map_err(|error| IdentityError::Hash(error.to_string()))?
}

/// Verify on the blocking pool. A panicked or cancelled check is a denial.
pub async fn verify_off_thread(
    hasher: &Arc<dyn CredentialHasher>,
    plaintext: &str,
    hash: &str,
) -> bool {
    let hasher = Arc::clone(hasher);
    let plaintext = plaintext.to_string();
    let hash = hash.to_string();
    task::spawn_blocking(move || hasher.verify(&plaintext, &hash))
        .await
        .unwrap_or(false)
}
