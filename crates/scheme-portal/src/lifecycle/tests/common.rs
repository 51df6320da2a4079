use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tempfile::TempDir;

use crate::applicants::{
    Applicant, ApplicantKind, ApplicantRepository, ApplicationStatus, FarmerProfile,
    SchemeApplication,
};
use crate::ids::{ApplicantId, ApplicationId, SchemeId};
use crate::intake::{DocumentIntake, StoredFile};
use crate::lifecycle::SchemeLifecycle;
use crate::schemes::{Eligibility, Scheme, SchemeRepository};
use crate::store::{MemoryApplicantStore, MemorySchemeStore, RepositoryError};

pub(super) type FarmerStore = MemoryApplicantStore<FarmerProfile>;
pub(super) type FarmerLifecycle = SchemeLifecycle<FarmerStore, MemorySchemeStore>;

pub(super) const BOUNDARY: &str = "lifecycle-boundary";

pub(super) struct Harness {
    pub dir: TempDir,
    pub intake: Arc<DocumentIntake>,
    pub farmers: Arc<FarmerStore>,
    pub schemes: Arc<MemorySchemeStore>,
    pub lifecycle: Arc<FarmerLifecycle>,
}

pub(super) async fn harness() -> Harness {
    let dir = TempDir::new().expect("tempdir");
    let intake = Arc::new(DocumentIntake::new(dir.path(), "/uploads", 4096));
    intake.prepare().await.expect("prepared");
    let farmers = Arc::new(FarmerStore::default());
    let schemes = Arc::new(MemorySchemeStore::default());
    let lifecycle = Arc::new(SchemeLifecycle::new(
        Arc::clone(&farmers),
        Arc::clone(&schemes),
        Arc::clone(&intake),
    ));
    Harness {
        dir,
        intake,
        farmers,
        schemes,
        lifecycle,
    }
}

pub(super) fn farmer_profile() -> FarmerProfile {
    FarmerProfile {
        age: 44,
        farm_location: "Nashik".to_string(),
        land_area: 3.5,
        crop_type: "Grapes".to_string(),
        annual_income: 180_000.0,
    }
}

pub(super) fn farmer(unique_id: &str) -> Applicant<FarmerProfile> {
    let now = Utc::now();
    Applicant {
        id: ApplicantId::new(),
        unique_id: unique_id.to_string(),
        name: "Ramesh Patil".to_string(),
        password_hash: "$argon2id$stub".to_string(),
        profile_pic: "/uploads/profilePic-1-1.png".to_string(),
        verification_doc: Some("/uploads/aadhaarCard-1-1.pdf".to_string()),
        profile: farmer_profile(),
        applied_schemes: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

pub(super) fn scheme(name: &str, target: ApplicantKind, eligibility: Eligibility) -> Scheme {
    let now = Utc::now();
    Scheme {
        id: SchemeId::new(),
        name: name.to_string(),
        url: Some("https://schemes.example.gov.in".to_string()),
        description: Some(format!("{name} support programme")),
        target,
        reference_link: None,
        eligibility,
        created_at: now,
        updated_at: now,
    }
}

pub(super) fn at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("timestamp")
        .with_timezone(&Utc)
}

impl Harness {
    pub fn add_farmer(&self) -> Applicant<FarmerProfile> {
        self.farmers.insert(farmer("FARM10001")).expect("farmer stored")
    }

    pub fn add_scheme(&self, name: &str, target: ApplicantKind) -> Scheme {
        self.add_scheme_with(name, target, Eligibility::default())
    }

    pub fn add_scheme_with(
        &self,
        name: &str,
        target: ApplicantKind,
        eligibility: Eligibility,
    ) -> Scheme {
        self.schemes
            .insert(scheme(name, target, eligibility))
            .expect("scheme stored")
    }

    pub async fn document(&self) -> StoredFile {
        self.intake
            .accept(
                "applicationDocument",
                b"%PDF-1.4 land record",
                "application/pdf",
                "7-12-extract.pdf",
            )
            .await
            .expect("document stored")
    }

    /// Seed an application directly in the store with a fixed timestamp.
    pub fn seed_application(
        &self,
        applicant: &Applicant<FarmerProfile>,
        scheme_id: SchemeId,
        applied_on: DateTime<Utc>,
    ) -> SchemeApplication {
        let application = SchemeApplication::submitted(scheme_id, Vec::new(), applied_on);
        self.farmers
            .append_application(&applicant.id, application.clone())
            .expect("application stored");
        application
    }

    pub fn stored_files(&self) -> usize {
        std::fs::read_dir(self.dir.path())
            .expect("readable")
            .count()
    }
}

/// How [`FaultyStore::append_application`] misbehaves.
#[derive(Debug, Clone, Copy, Default)]
pub(super) enum AppendFault {
    /// A competing application for the same scheme lands first.
    #[default]
    LosesRace,
    /// The write never reaches storage.
    Offline,
}

/// Farmer store that behaves normally except for appends.
#[derive(Default)]
pub(super) struct FaultyStore {
    pub inner: FarmerStore,
    pub fault: AppendFault,
}

impl FaultyStore {
    pub fn new(fault: AppendFault) -> Self {
        Self {
            inner: FarmerStore::default(),
            fault,
        }
    }
}

impl ApplicantRepository for FaultyStore {
    type Profile = FarmerProfile;

    fn insert(
        &self,
        applicant: Applicant<FarmerProfile>,
    ) -> Result<Applicant<FarmerProfile>, RepositoryError> {
        self.inner.insert(applicant)
    }

    fn fetch(&self, id: &ApplicantId) -> Result<Option<Applicant<FarmerProfile>>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn fetch_by_unique_id(
        &self,
        unique_id: &str,
    ) -> Result<Option<Applicant<FarmerProfile>>, RepositoryError> {
        self.inner.fetch_by_unique_id(unique_id)
    }

    fn list(&self) -> Result<Vec<Applicant<FarmerProfile>>, RepositoryError> {
        self.inner.list()
    }

    fn append_application(
        &self,
        id: &ApplicantId,
        application: SchemeApplication,
    ) -> Result<Applicant<FarmerProfile>, RepositoryError> {
        match self.fault {
            AppendFault::LosesRace => {
                let competitor = SchemeApplication::submitted(
                    application.scheme_id,
                    Vec::new(),
                    application.applied_on,
                );
                self.inner.append_application(id, competitor)?;
                self.inner.append_application(id, application)
            }
            AppendFault::Offline => Err(RepositoryError::Unavailable(
                "applicant store offline".to_string(),
            )),
        }
    }

    fn update_application_status(
        &self,
        id: &ApplicantId,
        application_id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<SchemeApplication, RepositoryError> {
        self.inner.update_application_status(id, application_id, status)
    }
}

pub(super) fn multipart_request(
    uri: &str,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"applicationDocument\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}
