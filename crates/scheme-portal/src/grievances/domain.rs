use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::GrievanceId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrievanceStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Closed,
}

impl GrievanceStatus {
    pub const ALL: [GrievanceStatus; 4] = [
        GrievanceStatus::Pending,
        GrievanceStatus::InProgress,
        GrievanceStatus::Resolved,
        GrievanceStatus::Closed,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            GrievanceStatus::Pending => "Pending",
            GrievanceStatus::InProgress => "In Progress",
            GrievanceStatus::Resolved => "Resolved",
            GrievanceStatus::Closed => "Closed",
        }
    }

    /// Exact match against the ticket status labels.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.label() == raw)
    }
}

impl fmt::Display for GrievanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Self-declared category of the person raising a grievance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserType {
    Patient,
    Provider,
    Farmer,
    Student,
    Admin,
    #[default]
    Other,
}

impl UserType {
    pub const ALL: [UserType; 6] = [
        UserType::Patient,
        UserType::Provider,
        UserType::Farmer,
        UserType::Student,
        UserType::Admin,
        UserType::Other,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            UserType::Patient => "Patient",
            UserType::Provider => "Provider",
            UserType::Farmer => "Farmer",
            UserType::Student => "Student",
            UserType::Admin => "Admin",
            UserType::Other => "Other",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == raw)
    }
}

/// A public complaint ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grievance {
    pub id: GrievanceId,
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_path: Option<String>,
    pub status: GrievanceStatus,
    pub user_type: UserType,
    pub submitted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Grievance {
    /// Record-level rules enforced by the store on insert.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push("name is required".to_string());
        }
        if self.message.trim().is_empty() {
            problems.push("message is required".to_string());
        }
        if !looks_like_email(&self.email) {
            problems.push("Please fill a valid email address".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

/// `local@domain.tld` with no whitespace.
pub fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .rsplit_once('.')
                    .map_or(false, |(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}
