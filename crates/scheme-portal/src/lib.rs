//! Scheme portal backend.
//!
//! Four applicant kinds (hospital, patient, farmer, student) register, sign in and apply to
//! benefit schemes with supporting documents. Administrators review a combined application feed
//! and approve or reject entries, and a separate grievance desk tracks public complaints.

pub mod admin;
pub mod applicants;
pub mod config;
pub mod error;
pub mod grievances;
pub mod ids;
pub mod identity;
pub mod intake;
pub mod lifecycle;
pub mod portal;
pub mod schemes;
pub mod store;
pub mod telemetry;
