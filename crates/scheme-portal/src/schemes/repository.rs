use std::collections::HashMap;

use super::domain::Scheme;
use crate::applicants::ApplicantKind;
use crate::ids::SchemeId;
use crate::store::RepositoryError;

/// Storage abstraction for the scheme catalog.
pub trait SchemeRepository: Send + Sync {
    fn insert(&self, scheme: Scheme) -> Result<Scheme, RepositoryError>;
    fn fetch(&self, id: &SchemeId) -> Result<Option<Scheme>, RepositoryError>;
    /// Resolve many references at once; ids with no stored scheme are simply absent.
    fn fetch_many(&self, ids: &[SchemeId]) -> Result<HashMap<SchemeId, Scheme>, RepositoryError>;
    fn replace(&self, scheme: Scheme) -> Result<Scheme, RepositoryError>;
    fn delete(&self, id: &SchemeId) -> Result<Scheme, RepositoryError>;
    fn list(&self) -> Result<Vec<Scheme>, RepositoryError>;
    fn list_for(&self, target: ApplicantKind) -> Result<Vec<Scheme>, RepositoryError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|scheme| scheme.target == target)
            .collect())
    }
}
