//! Applicant records for the four applicant kinds, their storage capability, and the
//! registration/sign-in flow shared by every kind.

pub mod domain;
pub mod profiles;
pub mod registration;
pub mod repository;
pub mod router;

pub use domain::{
    Applicant, ApplicantKind, ApplicantSummary, ApplicantView, ApplicationStatus, Document,
    SchemeApplication, UnsupportedApplicantType,
};
pub use profiles::{
    ApplicantProfile, FarmerProfile, HospitalProfile, PatientProfile, StudentProfile,
};
pub use registration::{RegistrationError, RegistrationService, SignedIn};
pub use repository::ApplicantRepository;
pub use router::{registration_router, LoginRequest};
