use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{Scheme, SchemeDraft, SchemePatch};
use super::repository::SchemeRepository;
use crate::applicants::{ApplicantKind, UnsupportedApplicantType};
use crate::error::ErrorKind;
use crate::ids::SchemeId;
use crate::store::RepositoryError;

/// Create/read/update/delete over benefit-program definitions.
pub struct SchemeCatalog<S> {
    repository: Arc<S>,
}

impl<S> SchemeCatalog<S>
where
    S: SchemeRepository + 'static,
{
    pub fn new(repository: Arc<S>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<S> {
        &self.repository
    }

    pub fn list(&self) -> Result<Vec<Scheme>, CatalogError> {
        Ok(self.repository.list()?)
    }

    pub fn create(&self, draft: SchemeDraft) -> Result<Scheme, CatalogError> {
        let name = non_blank(draft.name)
            .ok_or_else(|| CatalogError::Validation("name is required".to_string()))?;
        let target = match draft.target.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw.parse::<ApplicantKind>()?,
            _ => return Err(CatalogError::Validation("target is required".to_string())),
        };
        reject_problems(draft.eligibility.problems())?;

        let now = Utc::now();
        let scheme = Scheme {
            id: SchemeId::new(),
            name,
            url: non_blank(draft.url),
            description: draft.description,
            target,
            reference_link: non_blank(draft.reference_link),
            eligibility: draft.eligibility,
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(scheme)?;
        info!(scheme_id = %stored.id, target = %stored.target, "scheme created");
        Ok(stored)
    }

    pub fn get(&self, id: &SchemeId) -> Result<Scheme, CatalogError> {
        self.repository.fetch(id)?.ok_or(CatalogError::NotFound)
    }

    /// Apply a partial update. The target of an existing scheme never changes.
    pub fn update(&self, id: &SchemeId, patch: SchemePatch) -> Result<Scheme, CatalogError> {
        let mut scheme = self.get(id)?;

        if let Some(raw) = patch.target.as_deref() {
            let requested = raw.trim().parse::<ApplicantKind>()?;
            if requested != scheme.target {
                return Err(CatalogError::Validation(format!(
                    "target is immutable (scheme targets {})",
                    scheme.target
                )));
            }
        }

        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(CatalogError::Validation("name must not be blank".to_string()));
            }
            scheme.name = name.trim().to_string();
        }
        if patch.url.is_some() {
            scheme.url = non_blank(patch.url);
        }
        if patch.description.is_some() {
            scheme.description = patch.description;
        }
        if patch.reference_link.is_some() {
            scheme.reference_link = non_blank(patch.reference_link);
        }
        scheme.eligibility.merge(patch.eligibility);
        reject_problems(scheme.eligibility.problems())?;
        scheme.updated_at = Utc::now();

        let stored = self.repository.replace(scheme).map_err(not_found)?;
        info!(scheme_id = %stored.id, "scheme updated");
        Ok(stored)
    }

    pub fn delete(&self, id: &SchemeId) -> Result<Scheme, CatalogError> {
        let removed = self.repository.delete(id).map_err(not_found)?;
        info!(scheme_id = %removed.id, "scheme deleted");
        Ok(removed)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn reject_problems(problems: Vec<String>) -> Result<(), CatalogError> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::Validation(problems.join(". ")))
    }
}

fn not_found(error: RepositoryError) -> CatalogError {
    match error {
        RepositoryError::NotFound => CatalogError::NotFound,
        other => CatalogError::Repository(other),
    }
}

/// Error raised by the scheme catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    UnsupportedTarget(#[from] UnsupportedApplicantType),
    #[error("Scheme not found")]
    NotFound,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Validation(_) | CatalogError::UnsupportedTarget(_) => {
                ErrorKind::ValidationFailed
            }
            CatalogError::NotFound => ErrorKind::NotFound,
            CatalogError::Repository(error) => error.kind(),
        }
    }
}
