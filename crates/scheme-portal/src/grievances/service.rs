use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{looks_like_email, Grievance, GrievanceStatus, UserType};
use super::repository::GrievanceRepository;
use crate::error::ErrorKind;
use crate::ids::{GrievanceId, InvalidIdentifier};
use crate::intake::{DocumentIntake, UploadField, UploadForm};
use crate::store::RepositoryError;

pub struct GrievanceService<R> {
    repository: Arc<R>,
    intake: Arc<DocumentIntake>,
}

impl<R> GrievanceService<R>
where
    R: GrievanceRepository + 'static,
{
    pub fn new(repository: Arc<R>, intake: Arc<DocumentIntake>) -> Self {
        Self { repository, intake }
    }

    pub fn intake(&self) -> &DocumentIntake {
        &self.intake
    }

    /// Open a ticket from a received form. The attachment, if any, is discarded when the
    /// ticket cannot be stored.
    pub async fn submit(&self, form: UploadForm) -> Result<Grievance, GrievanceError> {
        match self.try_submit(&form) {
            Ok(grievance) => Ok(grievance),
            Err(error) => {
                warn!(%error, "grievance rejected");
                self.intake.discard_all(form.files()).await;
                Err(error)
            }
        }
    }

    fn try_submit(&self, form: &UploadForm) -> Result<Grievance, GrievanceError> {
        let fields = &form.fields;
        let mut problems = Vec::new();

        let name = fields.text("name").unwrap_or_default().to_string();
        let email = fields
            .text("email")
            .map(str::to_lowercase)
            .unwrap_or_default();
        let message = fields.text("message").unwrap_or_default().to_string();
        if name.is_empty() || email.is_empty() || message.is_empty() {
            problems.push("Please provide name, email, and message.".to_string());
        } else if !looks_like_email(&email) {
            problems.push("Please fill a valid email address".to_string());
        }

        let user_type = match fields.text("userType") {
            None => UserType::default(),
            Some(raw) => UserType::parse(raw).unwrap_or_else(|| {
                problems.push(format!("Invalid user type: {raw}"));
                UserType::default()
            }),
        };
        if !problems.is_empty() {
            return Err(GrievanceError::Validation(problems));
        }

        let now = Utc::now();
        let grievance = Grievance {
            id: GrievanceId::new(),
            name,
            email,
            message,
            attachment_path: form
                .file(UploadField::Attachment)
                .map(|file| file.url.clone()),
            status: GrievanceStatus::Pending,
            user_type,
            submitted_at: now,
            created_at: now,
            updated_at: now,
        };
        let stored = self.repository.insert(grievance)?;
        info!(grievance_id = %stored.id, user_type = stored.user_type.label(), "grievance submitted");
        Ok(stored)
    }

    /// Every ticket, most recently submitted first.
    pub fn list(&self) -> Result<Vec<Grievance>, GrievanceError> {
        let mut grievances = self.repository.list()?;
        grievances.sort_by(|left, right| right.submitted_at.cmp(&left.submitted_at));
        Ok(grievances)
    }

    pub fn update_status(&self, id: &str, new_status: &str) -> Result<Grievance, GrievanceError> {
        let status = GrievanceStatus::parse(new_status)
            .ok_or_else(|| GrievanceError::InvalidStatus(new_status.to_string()))?;
        let id = GrievanceId::parse(id)?;
        let updated = self
            .repository
            .update_status(&id, status)
            .map_err(|error| match error {
                RepositoryError::NotFound => GrievanceError::NotFound,
                other => other.into(),
            })?;
        info!(grievance_id = %id, status = %status, "grievance status updated");
        Ok(updated)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrievanceError {
    #[error("{}", .0.join(". "))]
    Validation(Vec<String>),
    #[error("Invalid status value")]
    InvalidStatus(String),
    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),
    #[error("Grievance not found")]
    NotFound,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl GrievanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GrievanceError::Validation(_) | GrievanceError::InvalidStatus(_) => {
                ErrorKind::ValidationFailed
            }
            GrievanceError::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            GrievanceError::NotFound => ErrorKind::NotFound,
            GrievanceError::Repository(error) => error.kind(),
        }
    }
}
