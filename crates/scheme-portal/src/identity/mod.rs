//! Unique ID minting, credential hashing and session issuance.

mod credentials;
mod session;
mod unique_id;

pub use credentials::{hash_off_thread, verify_off_thread, Argon2Hasher, CredentialHasher};
pub use session::{OpaqueSessionIssuer, Principal, SessionGrant, SessionIssuer};
pub use unique_id::UniqueIdGenerator;

use crate::error::ErrorKind;
use crate::store::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("no free unique ID left for prefix {prefix}")]
    Exhausted { prefix: String },
    #[error("unique ID lookup failed: {0}")]
    Lookup(#[from] RepositoryError),
    #[error("password hashing failed: {0}")]
    Hash(String),
}

impl IdentityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IdentityError::Exhausted { .. } => ErrorKind::Conflict,
            IdentityError::Lookup(error) => error.kind(),
            IdentityError::Hash(_) => ErrorKind::StorageFailure,
        }
    }
}
