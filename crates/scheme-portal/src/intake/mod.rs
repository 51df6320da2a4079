//! Document intake: validates uploaded files against per-field policies and persists them
//! under the upload directory, producing stable public URLs.
//!
//! Files are written before the owning record is persisted. Callers that fail afterwards must
//! hand every [`StoredFile`] back to [`DocumentIntake::discard`] so no orphan remains on disk.

pub mod form;
mod multipart;
pub mod policy;

use std::fmt;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rand_core::{OsRng, RngCore};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::config::StorageConfig;
use crate::error::ErrorKind;

pub use form::{FieldReader, FormFields};
pub use multipart::{receive_upload, UploadForm};
pub use policy::{FilePolicy, DOCUMENT_POLICY, IMAGE_POLICY};

/// Headroom on top of the file payload for text parts and multipart framing.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;
const MAX_NAME_ATTEMPTS: usize = 8;

/// File part names the portal accepts anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UploadField {
    ProfilePic,
    VerificationDoc,
    AadhaarCard,
    InstitutionIdCard,
    ApplicationDocument,
    Attachment,
}

impl UploadField {
    pub const ALL: [UploadField; 6] = [
        UploadField::ProfilePic,
        UploadField::VerificationDoc,
        UploadField::AadhaarCard,
        UploadField::InstitutionIdCard,
        UploadField::ApplicationDocument,
        UploadField::Attachment,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            UploadField::ProfilePic => "profilePic",
            UploadField::VerificationDoc => "verificationDoc",
            UploadField::AadhaarCard => "aadhaarCard",
            UploadField::InstitutionIdCard => "institutionIDCard",
            UploadField::ApplicationDocument => "applicationDocument",
            UploadField::Attachment => "attachment",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    pub const fn policy(self) -> &'static FilePolicy {
        match self {
            UploadField::ProfilePic => &IMAGE_POLICY,
            UploadField::VerificationDoc
            | UploadField::AadhaarCard
            | UploadField::InstitutionIdCard
            | UploadField::ApplicationDocument
            | UploadField::Attachment => &DOCUMENT_POLICY,
        }
    }
}

impl fmt::Display for UploadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A file accepted and written to the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub field: UploadField,
    pub filename: String,
    pub original_name: String,
    pub content_type: String,
    pub size: usize,
    pub path: PathBuf,
    /// Public reference stored in records, e.g. `/uploads/profilePic-1700000000000-42.png`.
    pub url: String,
}

/// Validates and persists uploads for every route that takes files.
#[derive(Debug, Clone)]
pub struct DocumentIntake {
    root: PathBuf,
    public_prefix: String,
    max_file_bytes: usize,
}

impl DocumentIntake {
    pub fn new(
        root: impl Into<PathBuf>,
        public_prefix: impl Into<String>,
        max_file_bytes: usize,
    ) -> Self {
        let public_prefix = public_prefix.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            public_prefix,
            max_file_bytes,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(
            config.upload_dir.clone(),
            config.public_prefix.clone(),
            config.max_file_bytes,
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    pub fn max_file_bytes(&self) -> usize {
        self.max_file_bytes
    }

    /// Upper bound for a whole multipart body carrying up to `files` uploads.
    pub fn request_body_limit(&self, files: usize) -> usize {
        self.max_file_bytes
            .saturating_mul(files.max(1))
            .saturating_add(FORM_OVERHEAD_BYTES)
    }

    /// Create the upload directory. Run once at startup.
    pub async fn prepare(&self) -> Result<(), IntakeError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Field name and type checks that need no file content.
    pub fn check(
        &self,
        field_name: &str,
        declared_mime: &str,
        original_name: &str,
    ) -> Result<UploadField, IntakeError> {
        let field = UploadField::from_name(field_name)
            .ok_or_else(|| IntakeError::UnexpectedField(field_name.to_string()))?;

        let policy = field.policy();
        if !policy.allows(original_name, declared_mime) {
            return Err(IntakeError::InvalidType {
                field: field_name.to_string(),
                file_name: original_name.to_string(),
                declared_type: declared_mime.to_string(),
                reason: policy.rejection.to_string(),
            });
        }

        Ok(field)
    }

    /// Validate one file and write it under a collision-free generated name.
    pub async fn accept(
        &self,
        field_name: &str,
        bytes: &[u8],
        declared_mime: &str,
        original_name: &str,
    ) -> Result<StoredFile, IntakeError> {
        let field = match self.check(field_name, declared_mime, original_name) {
            Ok(field) => field,
            Err(error) => {
                warn!(field = field_name, file = original_name, %error, "upload rejected");
                return Err(error);
            }
        };

        if bytes.len() > self.max_file_bytes {
            warn!(field = field_name, size = bytes.len(), "upload exceeds size limit");
            return Err(self.too_large(field_name));
        }

        self.ensure_root().await?;

        let extension = policy::extension_of(original_name)
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let filename = format!("{}-{}{}", field.name(), unique_suffix(), extension);
            let path = self.root.join(&filename);

            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(error) if error.kind() == IoErrorKind::AlreadyExists => continue,
                Err(error) => return Err(error.into()),
            };

            let written = async {
                file.write_all(bytes).await?;
                file.flush().await
            }
            .await;

            if let Err(error) = written {
                drop(file);
                remove_quietly(&path).await;
                return Err(error.into());
            }

            debug!(field = field.name(), file = %filename, size = bytes.len(), "upload stored");
            return Ok(StoredFile {
                field,
                url: self.public_url(&filename),
                filename,
                original_name: original_name.to_string(),
                content_type: declared_mime.to_string(),
                size: bytes.len(),
                path,
            });
        }

        Err(IntakeError::Io(std::io::Error::new(
            IoErrorKind::AlreadyExists,
            "could not allocate a unique upload file name",
        )))
    }

    pub fn public_url(&self, filename: &str) -> String {
        format!("{}/{}", self.public_prefix, filename)
    }

    /// Compensating delete. Failures are logged, never raised.
    pub async fn discard(&self, file: &StoredFile) {
        remove_quietly(&file.path).await;
    }

    pub async fn discard_all<'a, I>(&self, files: I)
    where
        I: IntoIterator<Item = &'a StoredFile>,
    {
        for file in files {
            self.discard(file).await;
        }
    }

    pub(crate) fn too_large(&self, field_name: &str) -> IntakeError {
        IntakeError::TooLarge {
            field: field_name.to_string(),
            limit: self.max_file_bytes,
        }
    }

    async fn ensure_root(&self) -> Result<(), IntakeError> {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            _ => Err(IntakeError::StorageUnavailable {
                path: self.root.clone(),
            }),
        }
    }
}

fn unique_suffix() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let token = OsRng.next_u32() % 1_000_000_000;
    format!("{millis}-{token}")
}

async fn remove_quietly(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "discarded upload"),
        Err(error) if error.kind() == IoErrorKind::NotFound => {}
        Err(error) => {
            warn!(path = %path.display(), %error, "failed to discard upload");
        }
    }
}

/// Document intake failures.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Unexpected file field: {0}")]
    UnexpectedField(String),
    #[error("Only one file is accepted for field {0}")]
    DuplicateField(String),
    #[error("{reason}")]
    InvalidType {
        field: String,
        file_name: String,
        declared_type: String,
        reason: String,
    },
    #[error("File too large: {field} exceeds the {limit} byte limit")]
    TooLarge { field: String, limit: usize },
    #[error("upload directory {} is not available", path.display())]
    StorageUnavailable { path: PathBuf },
    #[error("malformed upload request: {0}")]
    Malformed(String),
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl IntakeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IntakeError::UnexpectedField(_)
            | IntakeError::DuplicateField(_)
            | IntakeError::InvalidType { .. }
            | IntakeError::TooLarge { .. } => ErrorKind::UploadRejected,
            IntakeError::Malformed(_) => ErrorKind::ValidationFailed,
            IntakeError::StorageUnavailable { .. } | IntakeError::Io(_) => {
                ErrorKind::StorageFailure
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn intake(limit: usize) -> (TempDir, DocumentIntake) {
        let dir = TempDir::new().expect("tempdir");
        let intake = DocumentIntake::new(dir.path().join("uploads"), "/uploads", limit);
        intake.prepare().await.expect("upload dir created");
        (dir, intake)
    }

    fn stored_count(intake: &DocumentIntake) -> usize {
        std::fs::read_dir(intake.root()).expect("readable").count()
    }

    #[tokio::test]
    async fn accept_writes_file_with_generated_name() {
        let (_dir, intake) = intake(1024).await;

        let stored = intake
            .accept("aadhaarCard", b"%PDF-1.4", "application/pdf", "card.PDF")
            .await
            .expect("accepted");

        assert_eq!(stored.field, UploadField::AadhaarCard);
        assert!(stored.filename.starts_with("aadhaarCard-"));
        assert!(stored.filename.ends_with(".PDF"));
        assert_eq!(stored.url, format!("/uploads/{}", stored.filename));
        assert_eq!(stored.original_name, "card.PDF");
        assert_eq!(std::fs::read(&stored.path).expect("written"), b"%PDF-1.4");

        intake.discard(&stored).await;
        assert!(!stored.path.exists());
        intake.discard(&stored).await;
    }

    #[tokio::test]
    async fn rejections_store_nothing() {
        let (_dir, intake) = intake(4).await;

        let unexpected = intake
            .accept("resume", b"x", "application/pdf", "cv.pdf")
            .await
            .expect_err("unknown field");
        assert!(matches!(unexpected, IntakeError::UnexpectedField(_)));

        let wrong_type = intake
            .accept("profilePic", b"x", "application/pdf", "me.pdf")
            .await
            .expect_err("pdf is not an image");
        assert!(matches!(wrong_type, IntakeError::InvalidType { .. }));
        assert!(wrong_type.to_string().contains("Invalid image file type"));

        let too_large = intake
            .accept("attachment", b"12345", "text/plain", "notes.txt")
            .await
            .expect_err("over the limit");
        assert!(matches!(too_large, IntakeError::TooLarge { limit: 4, .. }));

        for error in [&unexpected, &wrong_type, &too_large] {
            assert_eq!(error.kind(), ErrorKind::UploadRejected);
        }
        assert_eq!(stored_count(&intake), 0);
    }

    #[tokio::test]
    async fn missing_destination_is_storage_failure() {
        let dir = TempDir::new().expect("tempdir");
        let intake = DocumentIntake::new(dir.path().join("absent"), "/uploads", 1024);

        let error = intake
            .accept("attachment", b"hello", "text/plain", "notes.txt")
            .await
            .expect_err("destination missing");
        assert!(matches!(error, IntakeError::StorageUnavailable { .. }));
        assert_eq!(error.kind(), ErrorKind::StorageFailure);
    }

    #[test]
    fn body_limit_scales_with_file_count() {
        let intake = DocumentIntake::new("uploads", "/uploads/", 10);
        assert_eq!(intake.public_prefix(), "/uploads");
        assert_eq!(intake.request_body_limit(2), 20 + FORM_OVERHEAD_BYTES);
    }
}
