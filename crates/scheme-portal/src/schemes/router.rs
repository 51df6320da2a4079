use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::domain::{SchemeDraft, SchemePatch};
use super::repository::SchemeRepository;
use super::service::SchemeCatalog;
use crate::error::ApiError;
use crate::ids::SchemeId;

/// Routes mounted under `/api/schemes`.
pub fn scheme_router<S>(catalog: Arc<SchemeCatalog<S>>) -> Router
where
    S: SchemeRepository + 'static,
{
    Router::new()
        .route("/", get(list_handler::<S>).post(create_handler::<S>))
        .route(
            "/:id",
            get(get_handler::<S>)
                .put(update_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .with_state(catalog)
}

async fn list_handler<S>(State(catalog): State<Arc<SchemeCatalog<S>>>) -> Result<Response, ApiError>
where
    S: SchemeRepository + 'static,
{
    let schemes = catalog.list()?;
    Ok(Json(schemes).into_response())
}

async fn create_handler<S>(
    State(catalog): State<Arc<SchemeCatalog<S>>>,
    Json(draft): Json<SchemeDraft>,
) -> Result<Response, ApiError>
where
    S: SchemeRepository + 'static,
{
    let scheme = catalog.create(draft)?;
    Ok((StatusCode::CREATED, Json(scheme)).into_response())
}

async fn get_handler<S>(
    State(catalog): State<Arc<SchemeCatalog<S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError>
where
    S: SchemeRepository + 'static,
{
    let id = SchemeId::parse(&id)?;
    Ok(Json(catalog.get(&id)?).into_response())
}

async fn update_handler<S>(
    State(catalog): State<Arc<SchemeCatalog<S>>>,
    Path(id): Path<String>,
    Json(patch): Json<SchemePatch>,
) -> Result<Response, ApiError>
where
    S: SchemeRepository + 'static,
{
    let id = SchemeId::parse(&id)?;
    Ok(Json(catalog.update(&id, patch)?).into_response())
}

async fn delete_handler<S>(
    State(catalog): State<Arc<SchemeCatalog<S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError>
where
    S: SchemeRepository + 'static,
{
    let id = SchemeId::parse(&id)?;
    catalog.delete(&id)?;
    Ok(Json(json!({ "message": "Scheme deleted successfully" })).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySchemeStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    fn router() -> Router {
        scheme_router(Arc::new(SchemeCatalog::new(Arc::new(
            MemorySchemeStore::default(),
        ))))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn create_then_fetch_scheme() {
        let router = router();

        let response = router
            .clone()
            .oneshot(
                Request::post("/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({
                            "name": "Student Merit Aid",
                            "target": "student",
                            "eligibilityCourseType": "Engineering",
                            "eligibilityAnnualFamilyIncome": 300000
                        })
                        .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let id = created["id"].as_str().expect("id present").to_string();
        assert_eq!(created["eligibilityCourseType"], "Engineering");

        let response = router
            .oneshot(
                Request::get(format!("/{id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["name"], "Student Merit Aid");
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let response = router()
            .oneshot(
                Request::delete("/not-a-scheme")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "invalid_identifier");
    }

    #[tokio::test]
    async fn unknown_scheme_is_not_found() {
        let response = router()
            .oneshot(
                Request::get(format!("/{}", SchemeId::new()))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
