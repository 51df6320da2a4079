use super::domain::{Grievance, GrievanceStatus};
use crate::ids::GrievanceId;
use crate::store::RepositoryError;

/// Storage abstraction for grievance tickets.
pub trait GrievanceRepository: Send + Sync {
    fn insert(&self, grievance: Grievance) -> Result<Grievance, RepositoryError>;
    fn list(&self) -> Result<Vec<Grievance>, RepositoryError>;
    fn update_status(
        &self,
        id: &GrievanceId,
        status: GrievanceStatus,
    ) -> Result<Grievance, RepositoryError>;
}
