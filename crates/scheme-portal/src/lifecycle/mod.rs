//! Scheme applications: submission, per-applicant history and review decisions.
//!
//! A single generic engine serves every applicant kind. Applications live inside the
//! applicant record, so each mutation is a single-record update in the applicant store.

pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use router::lifecycle_router;
pub use service::{LifecycleError, SchemeLifecycle};
pub use views::{newest_first, SchemeHistoryEntry, SchemeSummary, StatusChange, UNAVAILABLE_SCHEME};
