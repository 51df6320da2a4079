use crate::applicants::{ApplicantKind, ApplicantRepository, ApplicantSummary};
use crate::lifecycle::{LifecycleError, SchemeLifecycle, StatusChange};
use crate::schemes::SchemeRepository;

use super::feed::{flatten, ApplicationFeedEntry};

/// Kind-erased view of one applicant kind's lifecycle engine, as seen by the admin.
pub trait ApplicationDesk: Send + Sync {
    fn kind(&self) -> ApplicantKind;

    /// Feed rows for every applicant of this kind that has at least one application.
    fn feed(&self) -> Result<Vec<ApplicationFeedEntry>, LifecycleError>;

    fn applicants(&self) -> Result<Vec<ApplicantSummary>, LifecycleError>;

    fn update_application_status(
        &self,
        applicant_id: &str,
        application_id: &str,
        new_status: &str,
    ) -> Result<StatusChange, LifecycleError>;
}

impl<R, S> ApplicationDesk for SchemeLifecycle<R, S>
where
    R: ApplicantRepository + 'static,
    S: SchemeRepository + 'static,
{
    fn kind(&self) -> ApplicantKind {
        SchemeLifecycle::kind(self)
    }

    fn feed(&self) -> Result<Vec<ApplicationFeedEntry>, LifecycleError> {
        let applicants = SchemeLifecycle::applicants(self).with_applications()?;
        let mut rows = Vec::new();
        for applicant in &applicants {
            let schemes = self.resolve_schemes(applicant)?;
            rows.extend(flatten(applicant, &schemes));
        }
        Ok(rows)
    }

    fn applicants(&self) -> Result<Vec<ApplicantSummary>, LifecycleError> {
        Ok(SchemeLifecycle::applicants(self)
            .list()?
            .iter()
            .map(|applicant| applicant.summary())
            .collect())
    }

    fn update_application_status(
        &self,
        applicant_id: &str,
        application_id: &str,
        new_status: &str,
    ) -> Result<StatusChange, LifecycleError> {
        SchemeLifecycle::update_application_status(self, applicant_id, application_id, new_status)
    }
}
