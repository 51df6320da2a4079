use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::repository::GrievanceRepository;
use super::service::GrievanceService;
use crate::error::ApiError;
use crate::intake::{receive_upload, UploadField};

const GRIEVANCE_FIELDS: [UploadField; 1] = [UploadField::Attachment];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    #[serde(default)]
    pub new_status: String,
}

/// Routes mounted under `/api/grievances`.
pub fn grievance_router<R>(service: Arc<GrievanceService<R>>) -> Router
where
    R: GrievanceRepository + 'static,
{
    let body_limit = service
        .intake()
        .request_body_limit(GRIEVANCE_FIELDS.len());

    Router::new()
        .route(
            "/",
            get(list_handler::<R>)
                .post(submit_handler::<R>)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/:id/status", patch(status_handler::<R>))
        .with_state(service)
}

async fn submit_handler<R>(
    State(service): State<Arc<GrievanceService<R>>>,
    multipart: Multipart,
) -> Result<Response, ApiError>
where
    R: GrievanceRepository + 'static,
{
    let form = receive_upload(service.intake(), multipart, &GRIEVANCE_FIELDS).await?;
    let grievance = service.submit(form).await?;

    let payload = json!({
        "message": format!(
            "Thank you, {}. Your grievance has been submitted successfully. Your Ticket ID is {}.",
            grievance.name, grievance.id
        ),
        "grievanceId": grievance.id,
        "submittedAt": grievance.submitted_at,
        "status": grievance.status,
    });
    Ok((StatusCode::CREATED, Json(payload)).into_response())
}

async fn list_handler<R>(State(service): State<Arc<GrievanceService<R>>>) -> Result<Response, ApiError>
where
    R: GrievanceRepository + 'static,
{
    let grievances = service.list()?;
    Ok(Json(grievances).into_response())
}

async fn status_handler<R>(
    State(service): State<Arc<GrievanceService<R>>>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<Response, ApiError>
where
    R: GrievanceRepository + 'static,
{
    let grievance = service.update_status(&id, &request.new_status)?;
    let payload = json!({
        "message": format!("Grievance status updated to {}", grievance.status),
        "grievance": grievance,
    });
    Ok(Json(payload).into_response())
}
