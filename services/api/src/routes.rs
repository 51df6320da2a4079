use crate::infra::{is_plain_file_name, AppState};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use scheme_portal::error::{ApiError, ErrorKind};
use scheme_portal::portal::Portal;
use serde_json::json;
use std::io::ErrorKind as IoErrorKind;
use tracing::warn;

pub(crate) fn with_portal_routes(portal: &Portal) -> Router {
    let uploads = format!("{}/:filename", portal.intake().public_prefix());
    portal
        .router()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route(&uploads, get(upload_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Serve a previously stored upload with a content type guessed from its name.
pub(crate) async fn upload_endpoint(
    Extension(state): Extension<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    if !is_plain_file_name(&filename) {
        warn!(filename, "rejected upload path");
        return Err(file_not_found());
    }

    let path = state.uploads.root().join(&filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let content_type = mime_guess::from_path(&path)
                .first_or_octet_stream()
                .to_string();
            Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
        }
        Err(err) if err.kind() == IoErrorKind::NotFound => Err(file_not_found()),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read upload");
            Err(ApiError::new(
                ErrorKind::StorageFailure,
                "Stored file could not be read",
            ))
        }
    }
}

fn file_not_found() -> ApiError {
    ApiError::new(ErrorKind::NotFound, "File not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use scheme_portal::intake::DocumentIntake;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn state(dir: &TempDir, ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            uploads: Arc::new(DocumentIntake::new(dir.path(), "/uploads", 1024)),
        }
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_flag_is_set() {
        let dir = TempDir::new().expect("tempdir");

        let waiting = readiness_endpoint(Extension(state(&dir, false)))
            .await
            .into_response();
        assert_eq!(waiting.status(), StatusCode::SERVICE_UNAVAILABLE);

        let ready = readiness_endpoint(Extension(state(&dir, true)))
            .await
            .into_response();
        assert_eq!(ready.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn stored_upload_is_served_with_guessed_type() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("aadhaarCard-1-2.pdf"), b"%PDF-1.4").expect("written");

        let response = upload_endpoint(
            Extension(state(&dir, true)),
            Path("aadhaarCard-1-2.pdf".to_string()),
        )
        .await
        .expect("served");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
    }

    #[tokio::test]
    async fn portal_routes_sit_beside_operational_endpoints() {
        use axum::body::Body;
        use axum::http::Request;
        use scheme_portal::config::AdminConfig;
        use tower::ServiceExt;

        let dir = TempDir::new().expect("tempdir");
        let portal = Portal::in_memory(
            Arc::new(DocumentIntake::new(dir.path(), "/uploads", 1024)),
            &AdminConfig {
                username: "admin".to_string(),
                password: "admin123".to_string(),
            },
        )
        .expect("portal");
        std::fs::write(dir.path().join("profilePic-1-1.png"), b"\x89PNG").expect("written");
        let app = with_portal_routes(&portal).layer(Extension(state(&dir, true)));

        for (uri, expected) in [
            ("/health", StatusCode::OK),
            ("/api/schemes", StatusCode::OK),
            ("/api/admin/applications", StatusCode::OK),
            ("/uploads/profilePic-1-1.png", StatusCode::OK),
            ("/uploads/unknown.png", StatusCode::NOT_FOUND),
        ] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
                .await
                .expect("response");
            assert_eq!(response.status(), expected, "{uri}");
        }
    }

    #[tokio::test]
    async fn traversal_and_missing_files_are_not_found() {
        let dir = TempDir::new().expect("tempdir");

        for name in ["../Cargo.toml", "..", "nested\\file.pdf", "missing.png"] {
            let error = upload_endpoint(Extension(state(&dir, true)), Path(name.to_string()))
                .await
                .expect_err("refused");
            assert_eq!(error.kind, ErrorKind::NotFound, "{name}");
        }
    }
}
