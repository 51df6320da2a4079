use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::service::AdminService;
use crate::applicants::ApplicantKind;
use crate::error::{ApiError, ErrorKind};

#[derive(Debug, Default, Deserialize)]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub applicant_type: String,
    #[serde(default)]
    pub applicant_id: String,
    #[serde(default)]
    pub application_id: String,
    #[serde(default)]
    pub new_status: String,
}

/// Routes mounted under `/api/admin`.
pub fn admin_router(service: Arc<AdminService>) -> Router {
    Router::new()
        .route("/login", post(login_handler))
        .route("/applicants/:kind", get(applicants_handler))
        .route("/hospitals", get(hospitals_handler))
        .route("/applications", get(applications_handler))
        .route("/applications/status", patch(status_handler))
        .with_state(service)
}

async fn login_handler(
    State(service): State<Arc<AdminService>>,
    Json(request): Json<AdminLoginRequest>,
) -> Result<Response, ApiError> {
    let session = service
        .login(&request.username, &request.password)
        .await?;
    let payload = json!({
        "message": "Admin login successful",
        "token": session.token,
        "issuedAt": session.issued_at,
        "expiresAt": session.expires_at,
    });
    Ok(Json(payload).into_response())
}

async fn applicants_handler(
    State(service): State<Arc<AdminService>>,
    Path(kind): Path<String>,
) -> Result<Response, ApiError> {
    let applicants = service.list_applicants(&kind)?;
    Ok(Json(applicants).into_response())
}

async fn hospitals_handler(State(service): State<Arc<AdminService>>) -> Result<Response, ApiError> {
    let hospitals = service.list_applicants(ApplicantKind::Hospital.label())?;
    Ok(Json(hospitals).into_response())
}

async fn applications_handler(
    State(service): State<Arc<AdminService>>,
) -> Result<Response, ApiError> {
    let feed = service.list_all_applications()?;
    Ok(Json(feed).into_response())
}

async fn status_handler(
    State(service): State<Arc<AdminService>>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Response, ApiError> {
    let missing = [
        ("applicantType", &request.applicant_type),
        ("applicantId", &request.applicant_id),
        ("applicationId", &request.application_id),
        ("newStatus", &request.new_status),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(ApiError::new(
            ErrorKind::ValidationFailed,
            format!("Missing required fields: {}", missing.join(", ")),
        ));
    }

    let change = service.dispatch_status_update(
        &request.applicant_type,
        &request.applicant_id,
        &request.application_id,
        &request.new_status,
    )?;
    let payload = json!({
        "message": format!("Application status updated to {}", change.application.status),
        "applicantId": change.applicant_id,
        "applicantType": change.applicant_type,
        "application": change.application,
    });
    Ok(Json(payload).into_response())
}
