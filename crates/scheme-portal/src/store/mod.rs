//! Document-store backends for applicants, schemes and grievances.
//!
//! Each repository trait lives next to its domain module; this module holds the shared error
//! type and the in-memory implementations used by the API binary and the test suites.

mod memory;

pub use memory::{MemoryApplicantStore, MemoryGrievanceStore, MemorySchemeStore};

use crate::error::ErrorKind;

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepositoryError::Conflict => ErrorKind::Conflict,
            RepositoryError::NotFound => ErrorKind::NotFound,
            RepositoryError::Validation(_) => ErrorKind::ValidationFailed,
            RepositoryError::Unavailable(_) => ErrorKind::StorageFailure,
        }
    }
}
