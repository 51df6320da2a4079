use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::applicants::ApplicantKind;
use crate::ids::SchemeId;

/// Kind-specific eligibility metadata. Only the fields relevant to a scheme's target are
/// meaningful; the rest are stored but inert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Eligibility {
    #[serde(rename = "eligibilityBeds", default, skip_serializing_if = "Option::is_none")]
    pub beds: Option<u32>,
    #[serde(rename = "eligibilityLocation", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "eligibilityArea", default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,

    #[serde(rename = "eligibilityAge", default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(rename = "eligibilityCondition", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(rename = "patientEligibility", default, skip_serializing_if = "Option::is_none")]
    pub patient_eligibility: Option<String>,

    #[serde(rename = "eligibilityLandArea", default, skip_serializing_if = "Option::is_none")]
    pub land_area: Option<f64>,
    #[serde(rename = "eligibilityCropType", default, skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(
        rename = "eligibilityAnnualIncome",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub annual_income: Option<f64>,

    #[serde(rename = "eligibilityMinimumGPA", default, skip_serializing_if = "Option::is_none")]
    pub minimum_gpa: Option<f64>,
    #[serde(rename = "eligibilityCourseType", default, skip_serializing_if = "Option::is_none")]
    pub course_type: Option<String>,
    #[serde(
        rename = "eligibilityAnnualFamilyIncome",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub annual_family_income: Option<f64>,
}

impl Eligibility {
    /// Wire names of the eligibility fields that matter for `kind`.
    pub const fn fields_for(kind: ApplicantKind) -> &'static [&'static str] {
        match kind {
            ApplicantKind::Hospital => &[
                "eligibilityBeds",
                "eligibilityLocation",
                "eligibilityArea",
            ],
            ApplicantKind::Patient => &[
                "eligibilityAge",
                "eligibilityCondition",
                "patientEligibility",
            ],
            ApplicantKind::Farmer => &[
                "eligibilityLandArea",
                "eligibilityCropType",
                "eligibilityAnnualIncome",
            ],
            ApplicantKind::Student => &[
                "eligibilityMinimumGPA",
                "eligibilityCourseType",
                "eligibilityAnnualFamilyIncome",
            ],
        }
    }

    /// The populated subset of fields relevant to `kind`, keyed by wire name.
    pub fn project(&self, kind: ApplicantKind) -> Map<String, Value> {
        let mut fields = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let relevant = Self::fields_for(kind);
        fields.retain(|key, _| relevant.contains(&key.as_str()));
        fields
    }

    /// Overlay every populated field of `patch` onto `self`.
    pub fn merge(&mut self, patch: Eligibility) {
        macro_rules! overlay {
            ($($field:ident),+) => {
                $(if patch.$field.is_some() {
                    self.$field = patch.$field;
                })+
            };
        }
        overlay!(
            beds,
            location,
            area,
            age,
            condition,
            patient_eligibility,
            land_area,
            crop_type,
            annual_income,
            minimum_gpa,
            course_type,
            annual_family_income
        );
    }

    pub(crate) fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (name, value) in [
            ("eligibilityLandArea", self.land_area),
            ("eligibilityAnnualIncome", self.annual_income),
            ("eligibilityMinimumGPA", self.minimum_gpa),
            ("eligibilityAnnualFamilyIncome", self.annual_family_income),
        ] {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    problems.push(format!("{name} must be a non-negative number"));
                }
            }
        }
        problems
    }
}

/// A benefit-program definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scheme {
    pub id: SchemeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub target: ApplicantKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_link: Option<String>,
    #[serde(flatten)]
    pub eligibility: Eligibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload accepted when creating a scheme.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub reference_link: Option<String>,
    #[serde(flatten)]
    pub eligibility: Eligibility,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub reference_link: Option<String>,
    #[serde(flatten)]
    pub eligibility: Eligibility,
}
