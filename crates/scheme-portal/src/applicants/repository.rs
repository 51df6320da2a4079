use super::domain::{Applicant, ApplicationStatus, SchemeApplication};
use super::profiles::ApplicantProfile;
use crate::ids::{ApplicantId, ApplicationId};
use crate::store::RepositoryError;

/// Storage capability shared by the four applicant stores.
///
/// Every method touches one applicant record as a whole, so each mutation is atomic at the
/// record level and concurrent writers to the same applicant are last-write-wins.
pub trait ApplicantRepository: Send + Sync {
    type Profile: ApplicantProfile;

    /// Persist a new record. Fails with `Conflict` when the unique ID is already held and
    /// `Validation` when the record breaks a record-level rule.
    fn insert(
        &self,
        applicant: Applicant<Self::Profile>,
    ) -> Result<Applicant<Self::Profile>, RepositoryError>;

    fn fetch(&self, id: &ApplicantId) -> Result<Option<Applicant<Self::Profile>>, RepositoryError>;

    fn fetch_by_unique_id(
        &self,
        unique_id: &str,
    ) -> Result<Option<Applicant<Self::Profile>>, RepositoryError>;

    fn unique_id_taken(&self, unique_id: &str) -> Result<bool, RepositoryError> {
        Ok(self.fetch_by_unique_id(unique_id)?.is_some())
    }

    fn list(&self) -> Result<Vec<Applicant<Self::Profile>>, RepositoryError>;

    /// Applicants holding at least one application.
    fn with_applications(&self) -> Result<Vec<Applicant<Self::Profile>>, RepositoryError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|applicant| !applicant.applied_schemes.is_empty())
            .collect())
    }

    /// Append an application. `NotFound` for an unknown applicant, `Conflict` when the
    /// applicant already holds an application for the same scheme.
    fn append_application(
        &self,
        id: &ApplicantId,
        application: SchemeApplication,
    ) -> Result<Applicant<Self::Profile>, RepositoryError>;

    /// Set the status of one embedded application. `NotFound` when either the applicant or
    /// the application is missing.
    fn update_application_status(
        &self,
        id: &ApplicantId,
        application_id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<SchemeApplication, RepositoryError>;
}
