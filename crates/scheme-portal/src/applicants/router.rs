use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::registration::RegistrationService;
use super::repository::ApplicantRepository;
use crate::error::ApiError;
use crate::intake::receive_upload;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub unique_id: String,
    #[serde(default)]
    pub password: String,
}

/// `/register`, `/login` and `/:id` for one applicant kind.
pub fn registration_router<R>(service: Arc<RegistrationService<R>>) -> Router
where
    R: ApplicantRepository + 'static,
{
    let fields = service.upload_fields().len();
    let body_limit = service.intake().request_body_limit(fields);

    Router::new()
        .route(
            "/register",
            post(register_handler::<R>).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/login", post(login_handler::<R>))
        .route("/:id", get(details_handler::<R>))
        .with_state(service)
}

pub(crate) async fn register_handler<R>(
    State(service): State<Arc<RegistrationService<R>>>,
    multipart: Multipart,
) -> Result<Response, ApiError>
where
    R: ApplicantRepository + 'static,
{
    let form = receive_upload(service.intake(), multipart, &service.upload_fields()).await?;
    let applicant = service.register(form).await?;
    let kind = service.kind();

    let payload = json!({
        "message": format!("{} registered successfully", kind.title()),
        "uniqueId": applicant.unique_id,
        "applicantType": kind,
        "applicant": applicant.view(),
    });
    Ok((StatusCode::CREATED, Json(payload)).into_response())
}

pub(crate) async fn login_handler<R>(
    State(service): State<Arc<RegistrationService<R>>>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError>
where
    R: ApplicantRepository + 'static,
{
    let signed_in = service
        .login(&request.unique_id, &request.password)
        .await?;

    let mut payload = Map::new();
    payload.insert("message".to_string(), json!("Login successful"));
    payload.insert("token".to_string(), json!(signed_in.session.token));
    payload.insert("issuedAt".to_string(), json!(signed_in.session.issued_at));
    payload.insert("expiresAt".to_string(), json!(signed_in.session.expires_at));
    payload.insert(
        service.kind().label().to_string(),
        json!(signed_in.applicant.view()),
    );
    Ok(Json(Value::Object(payload)).into_response())
}

pub(crate) async fn details_handler<R>(
    State(service): State<Arc<RegistrationService<R>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError>
where
    R: ApplicantRepository + 'static,
{
    let applicant = service.details(&id)?;
    Ok(Json(applicant.view()).into_response())
}
