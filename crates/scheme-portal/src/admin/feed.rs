use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::applicants::{Applicant, ApplicantKind, ApplicantProfile, ApplicationStatus, Document};
use crate::ids::{ApplicantId, ApplicationId, SchemeId};
use crate::lifecycle::UNAVAILABLE_SCHEME;
use crate::schemes::Scheme;

/// One row of the cross-kind admin feed. Every applicant kind flattens into this shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationFeedEntry {
    pub application_id: ApplicationId,
    pub applicant_id: ApplicantId,
    pub applicant_type: ApplicantKind,
    pub applicant_name: String,
    pub unique_id: String,
    pub scheme_id: SchemeId,
    pub scheme_name: String,
    pub status: ApplicationStatus,
    pub applied_on: DateTime<Utc>,
    pub documents: Vec<Document>,
    pub details: Value,
}

/// Flatten an applicant's applications into feed rows. Records without an assigned identity
/// are skipped.
pub fn flatten<P>(
    applicant: &Applicant<P>,
    schemes: &HashMap<SchemeId, Scheme>,
) -> Vec<ApplicationFeedEntry>
where
    P: ApplicantProfile,
{
    if !applicant.id.is_assigned() {
        warn!(
            kind = %P::KIND,
            unique_id = %applicant.unique_id,
            "skipping applicant without identifier in admin feed"
        );
        return Vec::new();
    }

    let details = applicant.profile.details();
    applicant
        .applied_schemes
        .iter()
        .filter(|application| {
            let assigned = application.id.is_assigned();
            if !assigned {
                warn!(
                    kind = %P::KIND,
                    applicant_id = %applicant.id,
                    "skipping application without identifier in admin feed"
                );
            }
            assigned
        })
        .map(|application| ApplicationFeedEntry {
            application_id: application.id,
            applicant_id: applicant.id,
            applicant_type: P::KIND,
            applicant_name: applicant.name.clone(),
            unique_id: applicant.unique_id.clone(),
            scheme_id: application.scheme_id,
            scheme_name: schemes
                .get(&application.scheme_id)
                .map(|scheme| scheme.name.clone())
                .unwrap_or_else(|| UNAVAILABLE_SCHEME.to_string()),
            status: application.status,
            applied_on: application.applied_on,
            documents: application.documents.clone(),
            details: details.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applicants::{HospitalProfile, SchemeApplication};
    use uuid::Uuid;

    fn hospital() -> Applicant<HospitalProfile> {
        let now = Utc::now();
        Applicant {
            id: ApplicantId::new(),
            unique_id: "HOSP0420".to_string(),
            name: "Sassoon General".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            profile_pic: "/uploads/profilePic-1-1.png".to_string(),
            verification_doc: Some("/uploads/verificationDoc-1-1.pdf".to_string()),
            profile: HospitalProfile {
                location: "Pune".to_string(),
                services: vec!["Trauma".to_string(), "Maternity".to_string()],
                number_of_beds: 1200,
                number_of_outpatients: 3000,
                area: "Urban".to_string(),
            },
            applied_schemes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn rows_carry_kind_details_and_skip_unassigned_applications() {
        let mut applicant = hospital();
        let kept = SchemeApplication::submitted(SchemeId::new(), Vec::new(), Utc::now());
        let mut broken = SchemeApplication::submitted(SchemeId::new(), Vec::new(), Utc::now());
        broken.id = ApplicationId::from_uuid(Uuid::nil());
        applicant.applied_schemes = vec![kept.clone(), broken];

        let rows = flatten(&applicant, &HashMap::new());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].application_id, kept.id);
        assert_eq!(rows[0].applicant_type, ApplicantKind::Hospital);
        assert_eq!(rows[0].scheme_name, UNAVAILABLE_SCHEME);
        assert_eq!(rows[0].details["beds"], 1200);
    }

    #[test]
    fn unassigned_applicant_yields_nothing() {
        let mut applicant = hospital();
        applicant.id = ApplicantId::from_uuid(Uuid::nil());
        applicant.applied_schemes =
            vec![SchemeApplication::submitted(SchemeId::new(), Vec::new(), Utc::now())];

        assert!(flatten(&applicant, &HashMap::new()).is_empty());
    }
}
