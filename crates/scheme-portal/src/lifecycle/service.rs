use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::views::{newest_first, SchemeHistoryEntry, StatusChange};
use crate::applicants::{
    Applicant, ApplicantKind, ApplicantProfile, ApplicantRepository, ApplicationStatus, Document,
    SchemeApplication,
};
use crate::error::ErrorKind;
use crate::ids::{ApplicantId, ApplicationId, InvalidIdentifier, SchemeId};
use crate::intake::{DocumentIntake, StoredFile};
use crate::schemes::{Scheme, SchemeRepository};
use crate::store::RepositoryError;

/// The scheme-application engine for one applicant kind.
///
/// One instance exists per kind; the kind is fixed by the repository's profile type, so the
/// same algorithm serves hospitals, patients, farmers and students.
pub struct SchemeLifecycle<R, S> {
    applicants: Arc<R>,
    schemes: Arc<S>,
    intake: Arc<DocumentIntake>,
}

impl<R, S> SchemeLifecycle<R, S>
where
    R: ApplicantRepository + 'static,
    S: SchemeRepository + 'static,
{
    pub fn new(applicants: Arc<R>, schemes: Arc<S>, intake: Arc<DocumentIntake>) -> Self {
        Self {
            applicants,
            schemes,
            intake,
        }
    }

    pub fn kind(&self) -> ApplicantKind {
        R::Profile::KIND
    }

    pub fn applicants(&self) -> &Arc<R> {
        &self.applicants
    }

    pub fn schemes(&self) -> &Arc<S> {
        &self.schemes
    }

    pub fn intake(&self) -> &DocumentIntake {
        &self.intake
    }

    /// Validate and record an application. On every failure the uploaded document, if any,
    /// is removed from storage before the error is returned.
    pub async fn apply_for_scheme(
        &self,
        applicant_id: &str,
        scheme_id: &str,
        document: Option<StoredFile>,
    ) -> Result<SchemeApplication, LifecycleError> {
        let outcome = self.try_apply(applicant_id, scheme_id, document.as_ref());
        if let Err(error) = &outcome {
            warn!(
                kind = %self.kind(),
                applicant_id,
                scheme_id,
                %error,
                "scheme application rejected"
            );
            if let Some(document) = &document {
                self.intake.discard(document).await;
            }
        }
        outcome
    }

    fn try_apply(
        &self,
        applicant_id: &str,
        scheme_id: &str,
        document: Option<&StoredFile>,
    ) -> Result<SchemeApplication, LifecycleError> {
        let kind = self.kind();
        let applicant_id = ApplicantId::parse(applicant_id)?;
        let scheme_id = SchemeId::parse(scheme_id)?;
        let document = document.ok_or(LifecycleError::DocumentRequired)?;

        let applicant = self
            .applicants
            .fetch(&applicant_id)?
            .ok_or(LifecycleError::ApplicantNotFound(kind))?;
        let scheme = self
            .schemes
            .fetch(&scheme_id)?
            .ok_or(LifecycleError::SchemeNotFound)?;

        if scheme.target != kind {
            return Err(LifecycleError::SchemeNotApplicable {
                target: scheme.target,
                kind,
            });
        }
        if let Some(existing) = applicant.application_for(&scheme_id) {
            return Err(LifecycleError::AlreadyApplied {
                status: existing.status,
            });
        }

        let now = Utc::now();
        let application = SchemeApplication::submitted(
            scheme_id,
            vec![Document::from_stored(document, now)],
            now,
        );

        match self
            .applicants
            .append_application(&applicant_id, application.clone())
        {
            Ok(_) => {
                info!(
                    kind = %kind,
                    applicant_id = %applicant_id,
                    scheme_id = %scheme_id,
                    application_id = %application.id,
                    "scheme application recorded"
                );
                Ok(application)
            }
            // A concurrent request for the same pair won the append.
            Err(RepositoryError::Conflict) => {
                let status = self
                    .applicants
                    .fetch(&applicant_id)?
                    .and_then(|current| current.application_for(&scheme_id).map(|app| app.status))
                    .unwrap_or_default();
                Err(LifecycleError::AlreadyApplied { status })
            }
            Err(RepositoryError::NotFound) => Err(LifecycleError::ApplicantNotFound(kind)),
            Err(other) => Err(other.into()),
        }
    }

    /// Every application of the applicant, most recent first. Applications whose scheme was
    /// deleted stay listed with a null scheme.
    pub fn scheme_history(&self, applicant_id: &str) -> Result<Vec<SchemeHistoryEntry>, LifecycleError> {
        let applicant = self.load(applicant_id)?;
        let schemes = self.resolve_schemes(&applicant)?;
        let kind = self.kind();

        let mut entries: Vec<_> = applicant
            .applied_schemes
            .iter()
            .map(|application| {
                SchemeHistoryEntry::new(application, schemes.get(&application.scheme_id), kind)
            })
            .collect();
        newest_first(&mut entries, |entry| entry.applied_on);
        Ok(entries)
    }

    /// Applications still awaiting review whose scheme still exists, most recent first.
    pub fn pending_schemes(&self, applicant_id: &str) -> Result<Vec<SchemeHistoryEntry>, LifecycleError> {
        let applicant = self.load(applicant_id)?;
        let schemes = self.resolve_schemes(&applicant)?;
        let kind = self.kind();

        let mut entries: Vec<_> = applicant
            .applied_schemes
            .iter()
            .filter(|application| application.status.is_pending())
            .filter_map(|application| {
                schemes
                    .get(&application.scheme_id)
                    .map(|scheme| SchemeHistoryEntry::new(application, Some(scheme), kind))
            })
            .collect();
        newest_first(&mut entries, |entry| entry.applied_on);
        Ok(entries)
    }

    /// Schemes targeting this kind whose eligibility fields admit the applicant. Advisory
    /// only; applying is gated on the target alone.
    pub fn eligible_schemes(&self, applicant_id: &str) -> Result<Vec<Scheme>, LifecycleError> {
        let applicant = self.load(applicant_id)?;
        Ok(self
            .schemes
            .list_for(self.kind())?
            .into_iter()
            .filter(|scheme| applicant.profile.satisfies(&scheme.eligibility))
            .collect())
    }

    /// Record a review decision. The status text is checked before anything is loaded.
    pub fn update_application_status(
        &self,
        applicant_id: &str,
        application_id: &str,
        new_status: &str,
    ) -> Result<StatusChange, LifecycleError> {
        let status = ApplicationStatus::parse_decision(new_status)
            .ok_or_else(|| LifecycleError::InvalidStatus(new_status.to_string()))?;
        let kind = self.kind();
        let applicant_id = ApplicantId::parse(applicant_id)?;
        let application_id = ApplicationId::parse(application_id)?;

        let applicant = self
            .applicants
            .fetch(&applicant_id)?
            .ok_or(LifecycleError::ApplicantNotFound(kind))?;
        if applicant.application(&application_id).is_none() {
            return Err(LifecycleError::ApplicationNotFound);
        }

        let application = self
            .applicants
            .update_application_status(&applicant_id, &application_id, status)
            .map_err(|error| match error {
                RepositoryError::NotFound => LifecycleError::ApplicationNotFound,
                other => other.into(),
            })?;

        info!(
            kind = %kind,
            applicant_id = %applicant_id,
            application_id = %application_id,
            status = %status,
            "application status updated"
        );
        Ok(StatusChange {
            applicant_id,
            applicant_type: kind,
            application,
        })
    }

    fn load(&self, applicant_id: &str) -> Result<Applicant<R::Profile>, LifecycleError> {
        let id = ApplicantId::parse(applicant_id)?;
        self.applicants
            .fetch(&id)?
            .ok_or(LifecycleError::ApplicantNotFound(self.kind()))
    }

    pub(crate) fn resolve_schemes(
        &self,
        applicant: &Applicant<R::Profile>,
    ) -> Result<std::collections::HashMap<SchemeId, Scheme>, RepositoryError> {
        let ids: Vec<SchemeId> = applicant
            .applied_schemes
            .iter()
            .map(|application| application.scheme_id)
            .collect();
        self.schemes.fetch_many(&ids)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),
    #[error("Application document is required.")]
    DocumentRequired,
    #[error("{} not found", .0.title())]
    ApplicantNotFound(ApplicantKind),
    #[error("Scheme not found")]
    SchemeNotFound,
    #[error("This scheme is not applicable to {kind} applicants (it targets {target})")]
    SchemeNotApplicable {
        target: ApplicantKind,
        kind: ApplicantKind,
    },
    #[error("You have already applied for this scheme (status: {status})")]
    AlreadyApplied { status: ApplicationStatus },
    #[error("Application not found")]
    ApplicationNotFound,
    #[error("Invalid status '{0}'. Must be 'approved' or 'rejected'")]
    InvalidStatus(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            LifecycleError::DocumentRequired | LifecycleError::InvalidStatus(_) => {
                ErrorKind::ValidationFailed
            }
            LifecycleError::ApplicantNotFound(_)
            | LifecycleError::SchemeNotFound
            | LifecycleError::ApplicationNotFound => ErrorKind::NotFound,
            LifecycleError::SchemeNotApplicable { .. } => ErrorKind::SchemeNotApplicable,
            LifecycleError::AlreadyApplied { .. } => ErrorKind::Conflict,
            LifecycleError::Repository(error) => error.kind(),
        }
    }
}
