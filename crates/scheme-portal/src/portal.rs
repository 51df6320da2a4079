//! Composition root wiring the in-memory stores, per-kind services and HTTP routers.

use std::sync::Arc;

use axum::Router;

use crate::admin::{admin_router, AdminService, ApplicantDesks, ApplicationDesk};
use crate::applicants::{
    registration_router, ApplicantProfile, FarmerProfile, HospitalProfile, PatientProfile,
    RegistrationService, StudentProfile,
};
use crate::config::{AdminConfig, AppConfig};
use crate::grievances::{grievance_router, GrievanceService};
use crate::identity::{
    Argon2Hasher, CredentialHasher, IdentityError, OpaqueSessionIssuer, SessionIssuer,
};
use crate::intake::DocumentIntake;
use crate::lifecycle::{lifecycle_router, SchemeLifecycle};
use crate::schemes::{scheme_router, SchemeCatalog};
use crate::store::{MemoryApplicantStore, MemoryGrievanceStore, MemorySchemeStore};

pub type ApplicantStore<P> = MemoryApplicantStore<P>;
pub type Lifecycle<P> = SchemeLifecycle<ApplicantStore<P>, MemorySchemeStore>;

/// Registration and application services for one applicant kind, sharing one store.
pub struct KindServices<P: ApplicantProfile> {
    pub registration: Arc<RegistrationService<ApplicantStore<P>>>,
    pub lifecycle: Arc<Lifecycle<P>>,
}

impl<P: ApplicantProfile> KindServices<P> {
    fn new(
        schemes: &Arc<MemorySchemeStore>,
        intake: &Arc<DocumentIntake>,
        hasher: &Arc<dyn CredentialHasher>,
        sessions: &Arc<dyn SessionIssuer>,
    ) -> Self {
        let store = Arc::new(ApplicantStore::<P>::default());
        let registration = RegistrationService::new(
            Arc::clone(&store),
            Arc::clone(intake),
            Arc::clone(hasher),
            Arc::clone(sessions),
        );
        let lifecycle = SchemeLifecycle::new(store, Arc::clone(schemes), Arc::clone(intake));
        Self {
            registration: Arc::new(registration),
            lifecycle: Arc::new(lifecycle),
        }
    }

    /// `/register`, `/login`, `/:id` and the application routes of this kind.
    pub fn router(&self) -> Router {
        registration_router(Arc::clone(&self.registration))
            .merge(lifecycle_router(Arc::clone(&self.lifecycle)))
    }

    fn desk(&self) -> Arc<dyn ApplicationDesk> {
        Arc::clone(&self.lifecycle) as Arc<dyn ApplicationDesk>
    }
}

pub struct Portal {
    intake: Arc<DocumentIntake>,
    pub hospital: KindServices<HospitalProfile>,
    pub patient: KindServices<PatientProfile>,
    pub farmer: KindServices<FarmerProfile>,
    pub student: KindServices<StudentProfile>,
    pub catalog: Arc<SchemeCatalog<MemorySchemeStore>>,
    pub grievances: Arc<GrievanceService<MemoryGrievanceStore>>,
    pub admin: Arc<AdminService>,
}

impl Portal {
    pub fn from_config(config: &AppConfig) -> Result<Self, IdentityError> {
        let intake = Arc::new(DocumentIntake::from_config(&config.storage));
        Self::in_memory(intake, &config.admin)
    }

    /// Fresh, empty in-memory stores behind every service.
    pub fn in_memory(
        intake: Arc<DocumentIntake>,
        admin: &AdminConfig,
    ) -> Result<Self, IdentityError> {
        let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2Hasher);
        let sessions: Arc<dyn SessionIssuer> = Arc::new(OpaqueSessionIssuer::default());
        let schemes = Arc::new(MemorySchemeStore::default());

        let hospital = KindServices::new(&schemes, &intake, &hasher, &sessions);
        let patient = KindServices::new(&schemes, &intake, &hasher, &sessions);
        let farmer = KindServices::new(&schemes, &intake, &hasher, &sessions);
        let student = KindServices::new(&schemes, &intake, &hasher, &sessions);

        let desks = ApplicantDesks {
            hospital: hospital.desk(),
            patient: patient.desk(),
            farmer: farmer.desk(),
            student: student.desk(),
        };
        let admin = AdminService::new(desks, admin, hasher, sessions)?;

        Ok(Self {
            catalog: Arc::new(SchemeCatalog::new(schemes)),
            grievances: Arc::new(GrievanceService::new(
                Arc::new(MemoryGrievanceStore::default()),
                Arc::clone(&intake),
            )),
            admin: Arc::new(admin),
            intake,
            hospital,
            patient,
            farmer,
            student,
        })
    }

    pub fn intake(&self) -> &Arc<DocumentIntake> {
        &self.intake
    }

    /// Every `/api` route of the portal.
    pub fn router(&self) -> Router {
        Router::new()
            .nest("/api/hospital", self.hospital.router())
            .nest("/api/patient", self.patient.router())
            .nest("/api/farmer", self.farmer.router())
            .nest("/api/student", self.student.router())
            .nest("/api/schemes", scheme_router(Arc::clone(&self.catalog)))
            .nest("/api/admin", admin_router(Arc::clone(&self.admin)))
            .nest(
                "/api/grievances",
                grievance_router(Arc::clone(&self.grievances)),
            )
    }
}
