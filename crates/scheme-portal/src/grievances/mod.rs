//! Public grievance tickets with an optional attachment. Independent of applicants.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{Grievance, GrievanceStatus, UserType};
pub use repository::GrievanceRepository;
pub use router::{grievance_router, StatusRequest};
pub use service::{GrievanceError, GrievanceService};
