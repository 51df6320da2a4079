use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::applicants::{ApplicantKind, ApplicationStatus, Document, SchemeApplication};
use crate::ids::{ApplicantId, ApplicationId, SchemeId};
use crate::schemes::Scheme;

/// Marker shown in place of a scheme name when the reference no longer resolves.
pub const UNAVAILABLE_SCHEME: &str = "Scheme Deleted/Unavailable";

/// Scheme fields shown alongside an application, limited to the eligibility fields of the
/// applicant's kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeSummary {
    pub id: SchemeId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_link: Option<String>,
    #[serde(flatten)]
    pub eligibility: Map<String, Value>,
}

impl SchemeSummary {
    pub fn project(scheme: &Scheme, kind: ApplicantKind) -> Self {
        Self {
            id: scheme.id,
            name: scheme.name.clone(),
            description: scheme.description.clone(),
            url: scheme.url.clone(),
            reference_link: scheme.reference_link.clone(),
            eligibility: scheme.eligibility.project(kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeHistoryEntry {
    pub application_id: ApplicationId,
    pub scheme: Option<SchemeSummary>,
    pub scheme_name: String,
    pub status: ApplicationStatus,
    pub applied_on: DateTime<Utc>,
    pub documents: Vec<Document>,
}

impl SchemeHistoryEntry {
    pub fn new(
        application: &SchemeApplication,
        scheme: Option<&Scheme>,
        kind: ApplicantKind,
    ) -> Self {
        let scheme = scheme.map(|scheme| SchemeSummary::project(scheme, kind));
        let scheme_name = scheme
            .as_ref()
            .map(|summary| summary.name.clone())
            .unwrap_or_else(|| UNAVAILABLE_SCHEME.to_string());
        Self {
            application_id: application.id,
            scheme,
            scheme_name,
            status: application.status,
            applied_on: application.applied_on,
            documents: application.documents.clone(),
        }
    }
}

/// Result of a review decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub applicant_id: ApplicantId,
    pub applicant_type: ApplicantKind,
    pub application: SchemeApplication,
}

/// Stable sort, most recent `applied_on` first. Equal timestamps keep their input order.
pub fn newest_first<T, F>(entries: &mut [T], applied_on: F)
where
    F: Fn(&T) -> DateTime<Utc>,
{
    entries.sort_by(|left, right| applied_on(right).cmp(&applied_on(left)));
}
