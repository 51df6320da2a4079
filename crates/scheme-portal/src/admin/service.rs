use std::sync::Arc;

use tracing::{info, warn};

use super::desk::ApplicationDesk;
use super::feed::ApplicationFeedEntry;
use crate::applicants::{ApplicantKind, ApplicantSummary, UnsupportedApplicantType};
use crate::config::AdminConfig;
use crate::error::ErrorKind;
use crate::identity::{
    verify_off_thread, CredentialHasher, IdentityError, Principal, SessionGrant, SessionIssuer,
};
use crate::lifecycle::{newest_first, LifecycleError, StatusChange};

/// The four per-kind engines, addressed by kind.
#[derive(Clone)]
pub struct ApplicantDesks {
    pub hospital: Arc<dyn ApplicationDesk>,
    pub patient: Arc<dyn ApplicationDesk>,
    pub farmer: Arc<dyn ApplicationDesk>,
    pub student: Arc<dyn ApplicationDesk>,
}

impl ApplicantDesks {
    pub fn desk(&self, kind: ApplicantKind) -> &Arc<dyn ApplicationDesk> {
        match kind {
            ApplicantKind::Hospital => &self.hospital,
            ApplicantKind::Patient => &self.patient,
            ApplicantKind::Farmer => &self.farmer,
            ApplicantKind::Student => &self.student,
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn ApplicationDesk>> {
        ApplicantKind::ALL.into_iter().map(move |kind| self.desk(kind))
    }
}

/// Administrator login, the cross-kind application feed and the status dispatcher.
pub struct AdminService {
    desks: ApplicantDesks,
    username: String,
    password_hash: String,
    hasher: Arc<dyn CredentialHasher>,
    sessions: Arc<dyn SessionIssuer>,
}

impl AdminService {
    /// The configured password is hashed once here and never kept in plaintext.
    pub fn new(
        desks: ApplicantDesks,
        credentials: &AdminConfig,
        hasher: Arc<dyn CredentialHasher>,
        sessions: Arc<dyn SessionIssuer>,
    ) -> Result<Self, IdentityError> {
        let password_hash = hasher.hash(&credentials.password)?;
        Ok(Self {
            desks,
            username: credentials.username.clone(),
            password_hash,
            hasher,
            sessions,
        })
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionGrant, AdminError> {
        let accepted = username == self.username
            && verify_off_thread(&self.hasher, password, &self.password_hash).await;
        if !accepted {
            warn!(username, "admin login failed");
            return Err(AdminError::Unauthorized);
        }
        info!(username, "admin signed in");
        Ok(self.sessions.issue(Principal::Admin {
            username: self.username.clone(),
        }))
    }

    /// Every application across all kinds, most recent first.
    pub fn list_all_applications(&self) -> Result<Vec<ApplicationFeedEntry>, AdminError> {
        let mut feed = Vec::new();
        for desk in self.desks.all() {
            feed.extend(desk.feed()?);
        }
        newest_first(&mut feed, |entry| entry.applied_on);
        Ok(feed)
    }

    pub fn list_applicants(&self, kind: &str) -> Result<Vec<ApplicantSummary>, AdminError> {
        let kind: ApplicantKind = kind.parse()?;
        Ok(self.desks.desk(kind).applicants()?)
    }

    /// Route a review decision to the engine of `kind`.
    pub fn dispatch_status_update(
        &self,
        kind: &str,
        applicant_id: &str,
        application_id: &str,
        new_status: &str,
    ) -> Result<StatusChange, AdminError> {
        let kind: ApplicantKind = kind.parse()?;
        Ok(self
            .desks
            .desk(kind)
            .update_application_status(applicant_id, application_id, new_status)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    UnsupportedApplicantType(#[from] UnsupportedApplicantType),
    #[error("Invalid credentials")]
    Unauthorized,
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl AdminError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdminError::UnsupportedApplicantType(_) => ErrorKind::ValidationFailed,
            AdminError::Unauthorized => ErrorKind::Unauthorized,
            AdminError::Lifecycle(error) => error.kind(),
        }
    }
}
