use std::collections::BTreeMap;

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use tracing::warn;

use super::form::FormFields;
use super::{DocumentIntake, IntakeError, StoredFile, UploadField};

/// Text fields plus the files accepted from one multipart request.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: FormFields,
    files: BTreeMap<UploadField, StoredFile>,
}

impl UploadForm {
    pub fn new(fields: FormFields) -> Self {
        Self {
            fields,
            files: BTreeMap::new(),
        }
    }

    pub fn with_file(mut self, file: StoredFile) -> Self {
        self.files.insert(file.field, file);
        self
    }

    pub fn file(&self, field: UploadField) -> Option<&StoredFile> {
        self.files.get(&field)
    }

    pub fn take_file(&mut self, field: UploadField) -> Option<StoredFile> {
        self.files.remove(&field)
    }

    pub fn files(&self) -> impl Iterator<Item = &StoredFile> {
        self.files.values()
    }

    pub fn into_files(self) -> Vec<StoredFile> {
        self.files.into_values().collect()
    }
}

/// Drain a multipart body: text parts become form fields, file parts named in `allowed` go
/// through [`DocumentIntake::accept`]. On any failure every file stored so far is discarded.
pub async fn receive_upload(
    intake: &DocumentIntake,
    mut multipart: Multipart,
    allowed: &[UploadField],
) -> Result<UploadForm, IntakeError> {
    let mut form = UploadForm::default();
    match collect_parts(intake, &mut multipart, allowed, &mut form).await {
        Ok(()) => Ok(form),
        Err(error) => {
            intake.discard_all(form.files()).await;
            Err(error)
        }
    }
}

async fn collect_parts(
    intake: &DocumentIntake,
    multipart: &mut Multipart,
    allowed: &[UploadField],
    form: &mut UploadForm,
) -> Result<(), IntakeError> {
    while let Some(mut part) = multipart.next_field().await.map_err(|e| malformed(intake, e))? {
        let name = part.name().unwrap_or_default().to_string();

        let Some(original_name) = part.file_name().map(str::to_string) else {
            let value = part.text().await.map_err(|e| malformed(intake, e))?;
            if !name.is_empty() {
                form.fields.push(name, value);
            }
            continue;
        };

        // An empty file input arrives as a part with a blank file name.
        if original_name.trim().is_empty() {
            continue;
        }

        let field = UploadField::from_name(&name)
            .filter(|field| allowed.contains(field))
            .ok_or_else(|| IntakeError::UnexpectedField(name.clone()))
            .map_err(log_rejection)?;
        if form.files.contains_key(&field) {
            return Err(log_rejection(IntakeError::DuplicateField(name)));
        }

        let content_type = part
            .content_type()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM.as_ref())
            .to_string();
        intake
            .check(&name, &content_type, &original_name)
            .map_err(log_rejection)?;

        let mut buffer = Vec::new();
        while let Some(chunk) = part.chunk().await.map_err(|e| malformed(intake, e))? {
            if buffer.len() + chunk.len() > intake.max_file_bytes() {
                return Err(log_rejection(intake.too_large(&name)));
            }
            buffer.extend_from_slice(&chunk);
        }

        let stored = intake
            .accept(&name, &buffer, &content_type, &original_name)
            .await?;
        form.files.insert(field, stored);
    }

    Ok(())
}

fn log_rejection(error: IntakeError) -> IntakeError {
    warn!(%error, "upload rejected");
    error
}

fn malformed(intake: &DocumentIntake, error: MultipartError) -> IntakeError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return IntakeError::TooLarge {
            field: "request".to_string(),
            limit: intake.max_file_bytes(),
        };
    }
    IntakeError::Malformed(error.body_text())
}
