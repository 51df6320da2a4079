use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{Applicant, ApplicantKind};
use super::profiles::ApplicantProfile;
use super::repository::ApplicantRepository;
use crate::error::ErrorKind;
use crate::identity::{
    hash_off_thread, verify_off_thread, CredentialHasher, IdentityError, Principal, SessionGrant,
    SessionIssuer, UniqueIdGenerator,
};
use crate::ids::{ApplicantId, InvalidIdentifier};
use crate::intake::{DocumentIntake, StoredFile, UploadField, UploadForm};
use crate::store::RepositoryError;

/// Registration, sign-in and profile lookup for one applicant kind.
pub struct RegistrationService<R> {
    repository: Arc<R>,
    intake: Arc<DocumentIntake>,
    hasher: Arc<dyn CredentialHasher>,
    sessions: Arc<dyn SessionIssuer>,
    ids: UniqueIdGenerator,
}

/// Successful sign-in.
#[derive(Debug, Clone)]
pub struct SignedIn<P> {
    pub applicant: Applicant<P>,
    pub session: SessionGrant,
}

impl<R> RegistrationService<R>
where
    R: ApplicantRepository + 'static,
{
    pub fn new(
        repository: Arc<R>,
        intake: Arc<DocumentIntake>,
        hasher: Arc<dyn CredentialHasher>,
        sessions: Arc<dyn SessionIssuer>,
    ) -> Self {
        Self {
            repository,
            intake,
            hasher,
            sessions,
            ids: UniqueIdGenerator::default(),
        }
    }

    pub fn with_id_generator(mut self, ids: UniqueIdGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn kind(&self) -> ApplicantKind {
        R::Profile::KIND
    }

    pub fn intake(&self) -> &DocumentIntake {
        &self.intake
    }

    /// File parts accepted by the registration form of this kind.
    pub fn upload_fields(&self) -> Vec<UploadField> {
        std::iter::once(UploadField::ProfilePic)
            .chain(self.kind().verification_field())
            .collect()
    }

    /// Create an applicant from an already-received form. Every stored file in the form is
    /// discarded when registration fails.
    pub async fn register(
        &self,
        form: UploadForm,
    ) -> Result<Applicant<R::Profile>, RegistrationError> {
        let files: Vec<StoredFile> = form.files().cloned().collect();
        match self.try_register(&form).await {
            Ok(applicant) => Ok(applicant),
            Err(error) => {
                self.intake.discard_all(&files).await;
                Err(error)
            }
        }
    }

    async fn try_register(
        &self,
        form: &UploadForm,
    ) -> Result<Applicant<R::Profile>, RegistrationError> {
        let kind = self.kind();
        let profile_pic = form
            .file(UploadField::ProfilePic)
            .ok_or(RegistrationError::MissingDocument(UploadField::ProfilePic))?;
        let verification_doc = match kind.verification_field() {
            Some(field) => Some(
                form.file(field)
                    .ok_or(RegistrationError::MissingDocument(field))?
                    .url
                    .clone(),
            ),
            None => None,
        };

        let (name, password, profile) = {
            let mut reader = form.fields.reader();
            let name = reader.required_text("name");
            let password = reader.required_raw("password");
            let profile = R::Profile::from_fields(&mut reader);
            reader.finish().map_err(RegistrationError::Validation)?;
            (name, password, profile)
        };

        let unique_id = self.ids.for_kind(kind, self.repository.as_ref())?;
        let password_hash = hash_off_thread(&self.hasher, &password).await?;

        let now = Utc::now();
        let applicant = Applicant {
            id: ApplicantId::new(),
            unique_id,
            name,
            password_hash,
            profile_pic: profile_pic.url.clone(),
            verification_doc,
            profile,
            applied_schemes: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(applicant)?;
        info!(kind = %kind, unique_id = %stored.unique_id, applicant_id = %stored.id, "applicant registered");
        Ok(stored)
    }

    /// The password is compared exactly as given; only the unique ID is trimmed.
    pub async fn login(
        &self,
        unique_id: &str,
        password: &str,
    ) -> Result<SignedIn<R::Profile>, RegistrationError> {
        let unique_id = unique_id.trim();
        if unique_id.is_empty() || password.trim().is_empty() {
            return Err(RegistrationError::Validation(vec![format!(
                "Please provide {} ID and password",
                self.kind().title()
            )]));
        }

        let applicant = match self.repository.fetch_by_unique_id(unique_id)? {
            Some(applicant) => applicant,
            None => {
                warn!(kind = %self.kind(), unique_id, "login failed: unknown id");
                return Err(RegistrationError::Unauthorized);
            }
        };
        if !verify_off_thread(&self.hasher, password, &applicant.password_hash).await {
            warn!(kind = %self.kind(), unique_id, "login failed: wrong password");
            return Err(RegistrationError::Unauthorized);
        }

        let session = self.sessions.issue(Principal::Applicant {
            kind: self.kind(),
            unique_id: applicant.unique_id.clone(),
        });
        Ok(SignedIn { applicant, session })
    }

    pub fn details(&self, applicant_id: &str) -> Result<Applicant<R::Profile>, RegistrationError> {
        let id = ApplicantId::parse(applicant_id)?;
        self.repository
            .fetch(&id)?
            .ok_or(RegistrationError::NotFound(self.kind()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("{0} is required")]
    MissingDocument(UploadField),
    #[error("{}", .0.join(". "))]
    Validation(Vec<String>),
    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),
    #[error("{} not found", .0.title())]
    NotFound(ApplicantKind),
    #[error("Invalid ID or Password")]
    Unauthorized,
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl RegistrationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistrationError::MissingDocument(_) | RegistrationError::Validation(_) => {
                ErrorKind::ValidationFailed
            }
            RegistrationError::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            RegistrationError::NotFound(_) => ErrorKind::NotFound,
            RegistrationError::Unauthorized => ErrorKind::Unauthorized,
            RegistrationError::Identity(error) => error.kind(),
            RegistrationError::Repository(error) => error.kind(),
        }
    }
}
