//! Administrator surface: a cross-kind application feed and a status dispatcher over the
//! four per-kind lifecycle engines.

pub mod desk;
pub mod feed;
pub mod router;
pub mod service;


pub use desk::ApplicationDesk;
pub use feed::ApplicationFeedEntry;
pub use router::{admin_router, AdminLoginRequest, StatusUpdateRequest};
pub use service::{AdminError, AdminService, ApplicantDesks};
