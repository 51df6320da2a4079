use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::admin::AdminError;
use crate::applicants::RegistrationError;
use crate::config::ConfigError;
use crate::grievances::GrievanceError;
use crate::identity::IdentityError;
use crate::ids::InvalidIdentifier;
use crate::intake::IntakeError;
use crate::lifecycle::LifecycleError;
use crate::schemes::CatalogError;
use crate::store::RepositoryError;
use crate::telemetry::TelemetryError;

/// Machine-distinguishable failure classes shared by every portal operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidIdentifier,
    ValidationFailed,
    NotFound,
    Conflict,
    SchemeNotApplicable,
    UploadRejected,
    StorageFailure,
    Unauthorized,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            ErrorKind::InvalidIdentifier => "invalid_identifier",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::SchemeNotApplicable => "scheme_not_applicable",
            ErrorKind::UploadRejected => "upload_rejected",
            ErrorKind::StorageFailure => "storage_failure",
            ErrorKind::Unauthorized => "unauthorized",
        }
    }

    pub const fn status(self) -> StatusCode {
        match self {
            ErrorKind::InvalidIdentifier
            | ErrorKind::ValidationFailed
            | ErrorKind::SchemeNotApplicable
            | ErrorKind::UploadRejected => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// JSON error envelope returned by every handler.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn body(&self) -> Value {
        let mut body = json!({
            "error": self.kind.label(),
            "message": self.message,
        });
        if let (Some(details), Some(map)) = (&self.details, body.as_object_mut()) {
            map.insert("details".to_string(), details.clone());
        }
        body
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status();
        if status.is_server_error() {
            tracing::error!(kind = %self.kind, message = %self.message, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

macro_rules! api_error_from {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for ApiError {
                fn from(value: $source) -> Self {
                    ApiError::new(value.kind(), value.to_string())
                }
            }
        )+
    };
}

api_error_from!(
    IntakeError,
    IdentityError,
    RegistrationError,
    CatalogError,
    AdminError,
    GrievanceError,
    RepositoryError,
);

impl From<InvalidIdentifier> for ApiError {
    fn from(value: InvalidIdentifier) -> Self {
        ApiError::new(ErrorKind::InvalidIdentifier, value.to_string())
    }
}

impl From<LifecycleError> for ApiError {
    fn from(value: LifecycleError) -> Self {
        let error = ApiError::new(value.kind(), value.to_string());
        match &value {
            LifecycleError::AlreadyApplied { status } => {
                error.with_details(json!({ "status": status }))
            }
            _ => error,
        }
    }
}

/// Startup and process-level failures of the API binary.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Identity(IdentityError),
    Intake(IntakeError),
    Operation(ApiError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Identity(err) => write!(f, "identity error: {}", err),
            AppError::Intake(err) => write!(f, "upload storage error: {}", err),
            AppError::Operation(err) => write!(f, "operation failed: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Identity(err) => Some(err),
            AppError::Intake(err) => Some(err),
            AppError::Operation(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<IdentityError> for AppError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

impl From<IntakeError> for AppError {
    fn from(value: IntakeError) -> Self {
        Self::Intake(value)
    }
}

impl From<ApiError> for AppError {
    fn from(value: ApiError) -> Self {
        Self::Operation(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_kind() {
        assert_eq!(ErrorKind::InvalidIdentifier.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::SchemeNotApplicable.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorKind::StorageFailure.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn body_carries_kind_message_and_optional_details() {
        let plain = ApiError::new(ErrorKind::NotFound, "Scheme not found");
        assert_eq!(
            plain.body(),
            json!({ "error": "not_found", "message": "Scheme not found" })
        );

        let detailed = ApiError::new(ErrorKind::Conflict, "already applied")
            .with_details(json!({ "status": "approved" }));
        assert_eq!(detailed.body()["details"]["status"], "approved");
    }
}
