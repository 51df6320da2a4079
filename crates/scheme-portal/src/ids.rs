use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raised when a path or body parameter does not parse as a record identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {label} format: {value}")]
pub struct InvalidIdentifier {
    pub label: &'static str,
    pub value: String,
}

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub const fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            pub fn parse(raw: &str) -> Result<Self, InvalidIdentifier> {
                Uuid::parse_str(raw.trim())
                    .map(Self)
                    .map_err(|_| InvalidIdentifier {
                        label: $label,
                        value: raw.to_string(),
                    })
            }

            /// The nil UUID marks a record that was never assigned an identity.
            pub fn is_assigned(&self) -> bool {
                !self.0.is_nil()
            }

            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

record_id!(
    /// Store identity of an applicant record (hospital, patient, farmer or student).
    ApplicantId,
    "applicant ID"
);
record_id!(
    /// Store identity of a scheme definition.
    SchemeId,
    "scheme ID"
);
record_id!(
    /// Identity of an application embedded inside an applicant record.
    ApplicationId,
    "application ID"
);
record_id!(
    /// Ticket identity of a grievance.
    GrievanceId,
    "grievance ID"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_hyphenated_uuid() {
        let id = SchemeId::new();
        let parsed = SchemeId::parse(&id.to_string()).expect("round trips");
        assert_eq!(parsed, id);
        assert!(parsed.is_assigned());
    }

    #[test]
    fn parse_rejects_object_id_style_values() {
        let err = ApplicantId::parse("64b7f2c9e1d3a2b4c5d6e7f8").expect_err("not a uuid");
        assert_eq!(err.label, "applicant ID");
        assert!(err.to_string().contains("Invalid applicant ID format"));
    }

    #[test]
    fn nil_uuid_is_unassigned() {
        assert!(!ApplicationId::from_uuid(Uuid::nil()).is_assigned());
    }
}
