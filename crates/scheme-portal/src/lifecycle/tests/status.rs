use super::common::*;
use crate::applicants::{ApplicantKind, ApplicationStatus};
use crate::error::ErrorKind;
use crate::ids::ApplicationId;
use crate::lifecycle::LifecycleError;

#[tokio::test]
async fn status_text_is_checked_before_identifiers() {
    let harness = harness().await;

    let error = harness
        .lifecycle
        .update_application_status("bad", "worse", "archived")
        .expect_err("invalid status");

    assert!(matches!(error, LifecycleError::InvalidStatus(ref raw) if raw == "archived"));
    assert_eq!(error.kind(), ErrorKind::ValidationFailed);
}

#[tokio::test]
async fn not_approved_cannot_be_set_by_review() {
    let harness = harness().await;
    let farmer = harness.add_farmer();
    let scheme = harness.add_scheme("PMFBY", ApplicantKind::Farmer);
    let application = harness.seed_application(&farmer, scheme.id, at("2025-06-01T00:00:00Z"));

    let error = harness
        .lifecycle
        .update_application_status(
            &farmer.id.to_string(),
            &application.id.to_string(),
            "not-approved",
        )
        .expect_err("not a decision");
    assert!(matches!(error, LifecycleError::InvalidStatus(_)));
}

#[tokio::test]
async fn decisions_can_be_revised() {
    let harness = harness().await;
    let farmer = harness.add_farmer();
    let scheme = harness.add_scheme("PM-KISAN", ApplicantKind::Farmer);
    let application = harness.seed_application(&farmer, scheme.id, at("2025-06-01T00:00:00Z"));
    let farmer_id = farmer.id.to_string();
    let application_id = application.id.to_string();

    let approved = harness
        .lifecycle
        .update_application_status(&farmer_id, &application_id, "approved")
        .expect("approved");
    assert_eq!(approved.application.status, ApplicationStatus::Approved);
    assert_eq!(approved.applicant_type, ApplicantKind::Farmer);

    let rejected = harness
        .lifecycle
        .update_application_status(&farmer_id, &application_id, "rejected")
        .expect("rejected");
    assert_eq!(rejected.application.status, ApplicationStatus::Rejected);

    let pending = harness.lifecycle.pending_schemes(&farmer_id).expect("pending");
    assert!(pending.is_empty());
}

#[tokio::test]
async fn unknown_application_is_not_found() {
    let harness = harness().await;
    let farmer = harness.add_farmer();

    let error = harness
        .lifecycle
        .update_application_status(
            &farmer.id.to_string(),
            &ApplicationId::new().to_string(),
            "approved",
        )
        .expect_err("unknown application");

    assert!(matches!(error, LifecycleError::ApplicationNotFound));
    assert_eq!(error.kind(), ErrorKind::NotFound);
}
