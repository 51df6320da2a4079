//! Scheme catalog: benefit-program definitions with per-kind eligibility metadata.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{Eligibility, Scheme, SchemeDraft, SchemePatch};
pub use repository::SchemeRepository;
pub use router::scheme_router;
pub use service::{CatalogError, SchemeCatalog};
