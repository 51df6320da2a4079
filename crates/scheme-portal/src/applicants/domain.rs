use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::profiles::ApplicantProfile;
use crate::ids::{ApplicantId, ApplicationId, SchemeId};
use crate::intake::{StoredFile, UploadField};

/// Closed set of applicant categories. Each one owns a separate store and ID namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicantKind {
    Hospital,
    Patient,
    Farmer,
    Student,
}

impl ApplicantKind {
    pub const ALL: [ApplicantKind; 4] = [
        ApplicantKind::Hospital,
        ApplicantKind::Patient,
        ApplicantKind::Farmer,
        ApplicantKind::Student,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicantKind::Hospital => "hospital",
            ApplicantKind::Patient => "patient",
            ApplicantKind::Farmer => "farmer",
            ApplicantKind::Student => "student",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            ApplicantKind::Hospital => "Hospital",
            ApplicantKind::Patient => "Patient",
            ApplicantKind::Farmer => "Farmer",
            ApplicantKind::Student => "Student",
        }
    }

    pub const fn id_prefix(self) -> &'static str {
        match self {
            ApplicantKind::Hospital => "HOSP",
            ApplicantKind::Patient => "PAT",
            ApplicantKind::Farmer => "FARM",
            ApplicantKind::Student => "STUD",
        }
    }

    pub const fn id_digits(self) -> u32 {
        match self {
            ApplicantKind::Hospital => 4,
            ApplicantKind::Patient => 6,
            ApplicantKind::Farmer | ApplicantKind::Student => 5,
        }
    }

    /// Identity document required at registration, if the kind has one.
    pub const fn verification_field(self) -> Option<UploadField> {
        match self {
            ApplicantKind::Hospital => Some(UploadField::VerificationDoc),
            ApplicantKind::Patient => None,
            ApplicantKind::Farmer => Some(UploadField::AadhaarCard),
            ApplicantKind::Student => Some(UploadField::InstitutionIdCard),
        }
    }
}

impl fmt::Display for ApplicantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ApplicantKind {
    type Err = UnsupportedApplicantType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        ApplicantKind::ALL
            .into_iter()
            .find(|kind| kind.label() == normalized)
            .ok_or_else(|| UnsupportedApplicantType(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported applicant type: {0}")]
pub struct UnsupportedApplicantType(pub String);

/// Review state of a scheme application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    #[default]
    NotApproved,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::NotApproved => "not-approved",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Only review decisions are accepted; there is no way back to `not-approved`.
    pub fn parse_decision(raw: &str) -> Option<Self> {
        match raw.trim() {
            "approved" => Some(ApplicationStatus::Approved),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_pending(self) -> bool {
        self == ApplicationStatus::NotApproved
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Supporting document attached to an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub url: String,
    pub original_name: String,
    pub uploaded_on: DateTime<Utc>,
}

impl Document {
    pub fn from_stored(file: &StoredFile, uploaded_on: DateTime<Utc>) -> Self {
        Self {
            url: file.url.clone(),
            original_name: file.original_name.clone(),
            uploaded_on,
        }
    }
}

/// Application embedded in exactly one applicant record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeApplication {
    pub id: ApplicationId,
    pub scheme_id: SchemeId,
    pub status: ApplicationStatus,
    pub applied_on: DateTime<Utc>,
    pub documents: Vec<Document>,
}

impl SchemeApplication {
    pub fn submitted(scheme_id: SchemeId, documents: Vec<Document>, applied_on: DateTime<Utc>) -> Self {
        Self {
            id: ApplicationId::new(),
            scheme_id,
            status: ApplicationStatus::NotApproved,
            applied_on,
            documents,
        }
    }
}

/// Stored applicant aggregate. The whole record is the atomicity unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Applicant<P> {
    pub id: ApplicantId,
    pub unique_id: String,
    pub name: String,
    pub password_hash: String,
    pub profile_pic: String,
    pub verification_doc: Option<String>,
    pub profile: P,
    pub applied_schemes: Vec<SchemeApplication>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<P> Applicant<P>
where
    P: ApplicantProfile,
{
    pub fn kind(&self) -> ApplicantKind {
        P::KIND
    }

    pub fn application_for(&self, scheme_id: &SchemeId) -> Option<&SchemeApplication> {
        self.applied_schemes
            .iter()
            .find(|application| &application.scheme_id == scheme_id)
    }

    pub fn application(&self, application_id: &ApplicationId) -> Option<&SchemeApplication> {
        self.applied_schemes
            .iter()
            .find(|application| &application.id == application_id)
    }

    /// Record-level rules enforced by every store on insert.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();
        if self.unique_id.trim().is_empty() {
            problems.push("uniqueId is required".to_string());
        }
        if self.name.trim().is_empty() {
            problems.push("name is required".to_string());
        }
        if self.password_hash.is_empty() {
            problems.push("password is required".to_string());
        }
        if self.profile_pic.trim().is_empty() {
            problems.push("profilePic is required".to_string());
        }
        match (P::KIND.verification_field(), &self.verification_doc) {
            (Some(field), None) => problems.push(format!("{field} is required")),
            (None, Some(_)) => problems.push(format!(
                "{} applicants do not carry a verification document",
                P::KIND.title()
            )),
            _ => {}
        }
        self.profile.validate(&mut problems);

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    /// Public projection without credential or applications.
    pub fn view(&self) -> ApplicantView<P> {
        let mut documents = BTreeMap::new();
        if let (Some(field), Some(url)) = (P::KIND.verification_field(), &self.verification_doc) {
            documents.insert(field.name(), url.clone());
        }
        ApplicantView {
            id: self.id,
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            applicant_type: P::KIND,
            profile_pic: self.profile_pic.clone(),
            documents,
            profile: self.profile.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn summary(&self) -> ApplicantSummary {
        ApplicantSummary {
            id: self.id,
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            applicant_type: P::KIND,
            applications: self.applied_schemes.len(),
            details: self.profile.details(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantView<P> {
    pub id: ApplicantId,
    pub unique_id: String,
    pub name: String,
    pub applicant_type: ApplicantKind,
    pub profile_pic: String,
    #[serde(flatten)]
    pub documents: BTreeMap<&'static str, String>,
    #[serde(flatten)]
    pub profile: P,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin listing row for one applicant of any kind.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantSummary {
    pub id: ApplicantId,
    pub unique_id: String,
    pub name: String,
    pub applicant_type: ApplicantKind,
    pub applications: usize,
    pub details: Value,
    pub created_at: DateTime<Utc>,
}
