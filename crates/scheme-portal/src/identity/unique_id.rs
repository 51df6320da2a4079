use rand_core::{OsRng, RngCore};

use super::IdentityError;
use crate::applicants::{ApplicantKind, ApplicantRepository};
use crate::store::RepositoryError;

const DEFAULT_RANDOM_ATTEMPTS: usize = 64;

/// Mints human-facing IDs such as `FARM48213`: a kind prefix followed by a fixed number of
/// digits whose first digit is never zero.
#[derive(Debug, Clone, Copy)]
pub struct UniqueIdGenerator {
    random_attempts: usize,
}

impl Default for UniqueIdGenerator {
    fn default() -> Self {
        Self {
            random_attempts: DEFAULT_RANDOM_ATTEMPTS,
        }
    }
}

impl UniqueIdGenerator {
    pub fn with_random_attempts(random_attempts: usize) -> Self {
        Self { random_attempts }
    }

    pub fn for_kind<R>(&self, kind: ApplicantKind, repository: &R) -> Result<String, IdentityError>
    where
        R: ApplicantRepository + ?Sized,
    {
        self.generate(kind.id_prefix(), kind.id_digits(), |candidate| {
            repository.unique_id_taken(candidate)
        })
    }

    /// Random candidates first; once those are spent, a full scan of the namespace from a
    /// random offset. Terminates with `Exhausted` only when every value is taken.
    pub fn generate<F>(&self, prefix: &str, digits: u32, mut taken: F) -> Result<String, IdentityError>
    where
        F: FnMut(&str) -> Result<bool, RepositoryError>,
    {
        let low = 10u64.pow(digits.saturating_sub(1));
        let span = 10u64.pow(digits) - low;

        for _ in 0..self.random_attempts {
            let candidate = format!("{prefix}{}", low + OsRng.next_u64() % span);
            if !taken(&candidate)? {
                return Ok(candidate);
            }
        }

        tracing::warn!(prefix, digits, "random unique id attempts exhausted, scanning namespace");
        let offset = OsRng.next_u64() % span;
        for step in 0..span {
            let candidate = format!("{prefix}{}", low + (offset + step) % span);
            if !taken(&candidate)? {
                return Ok(candidate);
            }
        }

        Err(IdentityError::Exhausted {
            prefix: prefix.to_string(),
        })
    }
}
