//! End-to-end scenarios driven through the composed portal router: registration, scheme
//! applications, admin review and grievance intake, observed only through HTTP responses and
//! the upload directory.

mod common {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use scheme_portal::config::AdminConfig;
    use scheme_portal::intake::DocumentIntake;
    use scheme_portal::portal::Portal;

    const BOUNDARY: &str = "workflow-boundary";

    pub(super) struct Site {
        pub dir: TempDir,
        pub router: Router,
    }

    pub(super) async fn site() -> Site {
        let dir = TempDir::new().expect("tempdir");
        let intake = Arc::new(DocumentIntake::new(dir.path(), "/uploads", 64 * 1024));
        intake.prepare().await.expect("prepared");
        let portal = Portal::in_memory(
            intake,
            &AdminConfig {
                username: "admin".to_string(),
                password: "admin123".to_string(),
            },
        )
        .expect("portal");
        Site {
            dir,
            router: portal.router(),
        }
    }

    pub(super) enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a str, &'a [u8]),
    }

    pub(super) fn multipart(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                ),
                Part::File(name, file_name, content_type, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    pub(super) fn json(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    pub(super) fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).expect("request")
    }

    impl Site {
        pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self
                .router
                .clone()
                .oneshot(request)
                .await
                .expect("response");
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("body");
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).expect("json body")
            };
            (status, body)
        }

        pub fn stored_files(&self) -> Vec<String> {
            let mut names: Vec<_> = std::fs::read_dir(self.dir.path())
                .expect("readable")
                .map(|entry| {
                    entry
                        .expect("entry")
                        .file_name()
                        .to_string_lossy()
                        .into_owned()
                })
                .collect();
            names.sort();
            names
        }

        pub async fn create_scheme(&self, name: &str, target: &str) -> String {
            let (status, body) = self
                .send(json(
                    "POST",
                    "/api/schemes",
                    serde_json::json!({ "name": name, "target": target }),
                ))
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body["id"].as_str().expect("scheme id").to_string()
        }

        pub async fn register_farmer(&self) -> Value {
            let (status, body) = self
                .send(multipart(
                    "/api/farmer/register",
                    &[
                        Part::Text("name", "Vitthal Jagtap"),
                        Part::Text("password", "jai-kisan"),
                        Part::Text("age", "46"),
                        Part::Text("farmLocation", "Solapur"),
                        Part::Text("landArea", "4.2"),
                        Part::Text("cropType", "Pomegranate"),
                        Part::Text("annualIncome", "210000"),
                        Part::File("profilePic", "vitthal.jpg", "image/jpeg", b"\xff\xd8\xff"),
                        Part::File("aadhaarCard", "aadhaar.pdf", "application/pdf", b"%PDF-1.4"),
                    ],
                ))
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body
        }
    }
}

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn farmer_round_trip_from_registration_to_approval() {
    let site = site().await;
    let registered = site.register_farmer().await;

    let unique_id = registered["uniqueId"].as_str().expect("unique id");
    let digits = unique_id.strip_prefix("FARM").expect("farmer prefix");
    assert_eq!(digits.len(), 5);
    assert!(digits.chars().all(|c| c.is_ascii_digit()));
    assert!(registered["applicant"].get("passwordHash").is_none());
    let farmer_id = registered["applicant"]["id"].as_str().expect("id").to_string();

    let (status, login) = site
        .send(common::json(
            "POST",
            "/api/farmer/login",
            json!({ "uniqueId": unique_id, "password": "jai-kisan" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["farmer"]["uniqueId"], unique_id);

    let scheme_id = site.create_scheme("Horticulture Mission", "farmer").await;
    let (status, applied) = site
        .send(multipart(
            &format!("/api/farmer/{farmer_id}/apply-scheme/{scheme_id}"),
            &[Part::File(
                "applicationDocument",
                "orchard-survey.pdf",
                "application/pdf",
                b"%PDF-1.4 survey",
            )],
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{applied}");
    let application_id = applied["application"]["id"].as_str().expect("id").to_string();

    let (_, pending) = site
        .send(get(&format!("/api/farmer/{farmer_id}/pending-schemes")))
        .await;
    assert_eq!(pending.as_array().map(Vec::len), Some(1));
    assert_eq!(pending[0]["status"], "not-approved");

    let (status, _) = site
        .send(common::json(
            "PATCH",
            "/api/admin/applications/status",
            json!({
                "applicantType": "farmer",
                "applicantId": farmer_id,
                "applicationId": application_id,
                "newStatus": "approved",
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, pending) = site
        .send(get(&format!("/api/farmer/{farmer_id}/pending-schemes")))
        .await;
    assert_eq!(pending.as_array().map(Vec::len), Some(0));

    let (_, history) = site
        .send(get(&format!("/api/farmer/{farmer_id}/applications")))
        .await;
    assert_eq!(history[0]["status"], "approved");
    assert_eq!(history[0]["schemeName"], "Horticulture Mission");

    let (_, feed) = site.send(get("/api/admin/applications")).await;
    assert_eq!(feed[0]["applicantType"], "farmer");
    assert_eq!(feed[0]["status"], "approved");

    // profile picture, Aadhaar card, application document
    assert_eq!(site.stored_files().len(), 3);
}

#[tokio::test]
async fn rejected_applications_leave_no_orphan_files() {
    let site = site().await;
    let registered = site.register_farmer().await;
    let farmer_id = registered["applicant"]["id"].as_str().expect("id").to_string();
    let before = site.stored_files();

    let student_scheme = site.create_scheme("Merit Scholarship", "student").await;
    let (status, body) = site
        .send(multipart(
            &format!("/api/farmer/{farmer_id}/apply-scheme/{student_scheme}"),
            &[Part::File("applicationDocument", "marks.pdf", "application/pdf", b"%PDF")],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "scheme_not_applicable");

    let farm_scheme = site.create_scheme("Crop Insurance", "farmer").await;
    let uri = format!("/api/farmer/{farmer_id}/apply-scheme/{farm_scheme}");
    let (status, _) = site
        .send(multipart(
            &uri,
            &[Part::File("applicationDocument", "first.pdf", "application/pdf", b"%PDF")],
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let after_first = site.stored_files();

    let (status, body) = site
        .send(multipart(
            &uri,
            &[Part::File("applicationDocument", "second.pdf", "application/pdf", b"%PDF")],
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["status"], "not-approved");

    let (status, _) = site
        .send(multipart(
            &format!("/api/farmer/not-an-id/apply-scheme/{farm_scheme}"),
            &[Part::File("applicationDocument", "third.pdf", "application/pdf", b"%PDF")],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(after_first.len(), before.len() + 1);
    assert_eq!(site.stored_files(), after_first);
}

#[tokio::test]
async fn review_rejects_statuses_outside_the_decision_set() {
    let site = site().await;
    let registered = site.register_farmer().await;
    let farmer_id = registered["applicant"]["id"].as_str().expect("id").to_string();
    let scheme_id = site.create_scheme("Seed Subsidy", "farmer").await;
    let (_, applied) = site
        .send(multipart(
            &format!("/api/farmer/{farmer_id}/apply-scheme/{scheme_id}"),
            &[Part::File("applicationDocument", "bill.pdf", "application/pdf", b"%PDF")],
        ))
        .await;
    let application_id = applied["application"]["id"].as_str().expect("id").to_string();

    for status_text in ["archived", "not-approved"] {
        let (status, body) = site
            .send(common::json(
                "PATCH",
                "/api/admin/applications/status",
                json!({
                    "applicantType": "farmer",
                    "applicantId": farmer_id,
                    "applicationId": application_id,
                    "newStatus": status_text,
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{status_text}");
        assert_eq!(body["error"], "validation_failed");
    }

    let (_, history) = site
        .send(get(&format!("/api/farmer/{farmer_id}/applications")))
        .await;
    assert_eq!(history[0]["status"], "not-approved");
}

#[tokio::test]
async fn grievance_without_message_creates_no_ticket() {
    let site = site().await;

    let (status, body) = site
        .send(multipart(
            "/api/grievances",
            &[
                Part::Text("name", "Sushila"),
                Part::Text("email", "sushila@example.in"),
                Part::Text("message", ""),
                Part::File("attachment", "photo.png", "image/png", b"\x89PNG"),
            ],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");

    let (_, tickets) = site.send(get("/api/grievances")).await;
    assert_eq!(tickets.as_array().map(Vec::len), Some(0));
    assert!(site.stored_files().is_empty());
}

#[tokio::test]
async fn registration_with_disallowed_picture_type_stores_nothing() {
    let site = site().await;

    let (status, body) = site
        .send(multipart(
            "/api/student/register",
            &[
                Part::Text("name", "Arjun"),
                Part::Text("password", "pass"),
                Part::File("institutionIDCard", "id.pdf", "application/pdf", b"%PDF"),
                Part::File("profilePic", "me.pdf", "application/pdf", b"%PDF"),
            ],
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "upload_rejected");
    assert!(site.stored_files().is_empty());
}
