use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::service::SchemeLifecycle;
use crate::applicants::ApplicantRepository;
use crate::error::ApiError;
use crate::intake::{receive_upload, UploadField};
use crate::schemes::SchemeRepository;

const APPLICATION_FIELDS: [UploadField; 1] = [UploadField::ApplicationDocument];

/// Application routes for one applicant kind, mounted next to the registration routes.
pub fn lifecycle_router<R, S>(lifecycle: Arc<SchemeLifecycle<R, S>>) -> Router
where
    R: ApplicantRepository + 'static,
    S: SchemeRepository + 'static,
{
    let body_limit = lifecycle
        .intake()
        .request_body_limit(APPLICATION_FIELDS.len());

    Router::new()
        .route(
            "/:id/apply-scheme/:scheme_id",
            post(apply_handler::<R, S>).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/:id/applications", get(history_handler::<R, S>))
        .route("/:id/pending-schemes", get(pending_handler::<R, S>))
        .route("/:id/eligible-schemes", get(eligible_handler::<R, S>))
        .with_state(lifecycle)
}

pub(crate) async fn apply_handler<R, S>(
    State(lifecycle): State<Arc<SchemeLifecycle<R, S>>>,
    Path((id, scheme_id)): Path<(String, String)>,
    multipart: Option<Multipart>,
) -> Result<Response, ApiError>
where
    R: ApplicantRepository + 'static,
    S: SchemeRepository + 'static,
{
    // A request without a multipart body carries no document.
    let document = match multipart {
        Some(multipart) => receive_upload(lifecycle.intake(), multipart, &APPLICATION_FIELDS)
            .await?
            .take_file(UploadField::ApplicationDocument),
        None => None,
    };

    let application = lifecycle
        .apply_for_scheme(&id, &scheme_id, document)
        .await?;
    let payload = json!({
        "message": "Scheme application submitted successfully",
        "application": application,
    });
    Ok(Json(payload).into_response())
}

pub(crate) async fn history_handler<R, S>(
    State(lifecycle): State<Arc<SchemeLifecycle<R, S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError>
where
    R: ApplicantRepository + 'static,
    S: SchemeRepository + 'static,
{
    let entries = lifecycle.scheme_history(&id)?;
    Ok(Json(entries).into_response())
}

pub(crate) async fn pending_handler<R, S>(
    State(lifecycle): State<Arc<SchemeLifecycle<R, S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError>
where
    R: ApplicantRepository + 'static,
    S: SchemeRepository + 'static,
{
    let entries = lifecycle.pending_schemes(&id)?;
    Ok(Json(entries).into_response())
}

pub(crate) async fn eligible_handler<R, S>(
    State(lifecycle): State<Arc<SchemeLifecycle<R, S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError>
where
    R: ApplicantRepository + 'static,
    S: SchemeRepository + 'static,
{
    let schemes = lifecycle.eligible_schemes(&id)?;
    Ok(Json(schemes).into_response())
}
