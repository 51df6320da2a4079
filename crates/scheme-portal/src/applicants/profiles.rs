use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use super::domain::ApplicantKind;
use crate::intake::FieldReader;
use crate::schemes::Eligibility;

/// Kind-specific half of an applicant record.
///
/// Each implementation knows how to read itself from registration form fields, which
/// record-level rules apply to it, what the admin feed shows about it, and how it compares
/// against a scheme's eligibility metadata.
pub trait ApplicantProfile:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: ApplicantKind;

    fn from_fields(reader: &mut FieldReader<'_>) -> Self;

    fn validate(&self, problems: &mut Vec<String>);

    /// Detail bag attached to admin feed entries and applicant summaries.
    fn details(&self) -> Value;

    /// Whether the populated eligibility fields relevant to this kind admit the applicant.
    fn satisfies(&self, eligibility: &Eligibility) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalProfile {
    pub location: String,
    pub services: Vec<String>,
    pub number_of_beds: u32,
    pub number_of_outpatients: u32,
    pub area: String,
}

impl ApplicantProfile for HospitalProfile {
    const KIND: ApplicantKind = ApplicantKind::Hospital;

    fn from_fields(reader: &mut FieldReader<'_>) -> Self {
        Self {
            location: reader.required_text("location"),
            services: reader.list("services"),
            number_of_beds: reader.required_number("numberOfBeds"),
            number_of_outpatients: reader.required_number("numberOfOutpatients"),
            area: reader.required_text("area"),
        }
    }

    fn validate(&self, problems: &mut Vec<String>) {
        require_text(problems, "location", &self.location);
        require_text(problems, "area", &self.area);
        if self.services.is_empty() {
            problems.push("services must list at least one service".to_string());
        }
    }

    fn details(&self) -> Value {
        json!({
            "beds": self.number_of_beds,
            "location": self.location,
            "area": self.area,
        })
    }

    fn satisfies(&self, eligibility: &Eligibility) -> bool {
        eligibility
            .beds
            .map_or(true, |minimum| self.number_of_beds >= minimum)
            && matches_ignoring_case(eligibility.location.as_deref(), &self.location)
            && matches_ignoring_case(eligibility.area.as_deref(), &self.area)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub age: u32,
    pub blood_group: String,
    pub salary: f64,
    pub medical_history: String,
}

impl ApplicantProfile for PatientProfile {
    const KIND: ApplicantKind = ApplicantKind::Patient;

    fn from_fields(reader: &mut FieldReader<'_>) -> Self {
        Self {
            age: reader.required_number("age"),
            blood_group: reader.required_text("bloodGroup"),
            salary: reader.required_number("salary"),
            medical_history: reader.required_text("medicalHistory"),
        }
    }

    fn validate(&self, problems: &mut Vec<String>) {
        require_text(problems, "bloodGroup", &self.blood_group);
        require_text(problems, "medicalHistory", &self.medical_history);
        require_amount(problems, "salary", self.salary);
    }

    fn details(&self) -> Value {
        json!({
            "age": self.age,
            "condition": self.medical_history,
            "bloodGroup": self.blood_group,
        })
    }

    fn satisfies(&self, eligibility: &Eligibility) -> bool {
        eligibility.age.map_or(true, |minimum| self.age >= minimum)
            && contains_ignoring_case(eligibility.condition.as_deref(), &self.medical_history)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerProfile {
    pub age: u32,
    pub farm_location: String,
    pub land_area: f64,
    pub crop_type: String,
    pub annual_income: f64,
}

impl ApplicantProfile for FarmerProfile {
    const KIND: ApplicantKind = ApplicantKind::Farmer;

    fn from_fields(reader: &mut FieldReader<'_>) -> Self {
        Self {
            age: reader.required_number("age"),
            farm_location: reader.required_text("farmLocation"),
            land_area: reader.required_number("landArea"),
            crop_type: reader.required_text("cropType"),
            annual_income: reader.required_number("annualIncome"),
        }
    }

    fn validate(&self, problems: &mut Vec<String>) {
        require_text(problems, "farmLocation", &self.farm_location);
        require_text(problems, "cropType", &self.crop_type);
        require_amount(problems, "landArea", self.land_area);
        require_amount(problems, "annualIncome", self.annual_income);
    }

    fn details(&self) -> Value {
        json!({
            "farmLocation": self.farm_location,
            "landArea": self.land_area,
            "cropType": self.crop_type,
            "annualIncome": self.annual_income,
        })
    }

    fn satisfies(&self, eligibility: &Eligibility) -> bool {
        eligibility
            .land_area
            .map_or(true, |minimum| self.land_area >= minimum)
            && matches_ignoring_case(eligibility.crop_type.as_deref(), &self.crop_type)
            && eligibility
                .annual_income
                .map_or(true, |ceiling| self.annual_income <= ceiling)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub age: u32,
    pub educational_institution: String,
    pub course_of_study: String,
    pub academic_year: String,
    pub annual_family_income: f64,
}

impl ApplicantProfile for StudentProfile {
    const KIND: ApplicantKind = ApplicantKind::Student;

    fn from_fields(reader: &mut FieldReader<'_>) -> Self {
        Self {
            age: reader.required_number("age"),
            educational_institution: reader.required_text("educationalInstitution"),
            course_of_study: reader.required_text("courseOfStudy"),
            academic_year: reader.required_text("academicYear"),
            annual_family_income: reader.required_number("annualFamilyIncome"),
        }
    }

    fn validate(&self, problems: &mut Vec<String>) {
        require_text(problems, "educationalInstitution", &self.educational_institution);
        require_text(problems, "courseOfStudy", &self.course_of_study);
        require_text(problems, "academicYear", &self.academic_year);
        require_amount(problems, "annualFamilyIncome", self.annual_family_income);
    }

    fn details(&self) -> Value {
        json!({
            "educationalInstitution": self.educational_institution,
            "courseOfStudy": self.course_of_study,
            "academicYear": self.academic_year,
            "annualFamilyIncome": self.annual_family_income,
        })
    }

    // No GPA is recorded for students, so eligibilityMinimumGPA is not checked.
    fn satisfies(&self, eligibility: &Eligibility) -> bool {
        contains_ignoring_case(eligibility.course_type.as_deref(), &self.course_of_study)
            && eligibility
                .annual_family_income
                .map_or(true, |ceiling| self.annual_family_income <= ceiling)
    }
}

fn require_text(problems: &mut Vec<String>, name: &str, value: &str) {
    if value.trim().is_empty() {
        problems.push(format!("{name} is required"));
    }
}

fn require_amount(problems: &mut Vec<String>, name: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        problems.push(format!("{name} cannot be negative"));
    }
}

fn matches_ignoring_case(expected: Option<&str>, actual: &str) -> bool {
    match expected.map(str::trim).filter(|value| !value.is_empty()) {
        Some(expected) => expected.eq_ignore_ascii_case(actual.trim()),
        None => true,
    }
}

fn contains_ignoring_case(needle: Option<&str>, haystack: &str) -> bool {
    match needle.map(str::trim).filter(|value| !value.is_empty()) {
        Some(needle) => haystack
            .to_lowercase()
            .contains(&needle.to_lowercase()),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::FormFields;

    fn farmer() -> FarmerProfile {
        FarmerProfile {
            age: 44,
            farm_location: "Nashik".to_string(),
            land_area: 3.5,
            crop_type: "Grapes".to_string(),
            annual_income: 180_000.0,
        }
    }

    #[test]
    fn farmer_eligibility_uses_floor_match_and_ceiling() {
        let profile = farmer();
        assert!(profile.satisfies(&Eligibility::default()));
        assert!(profile.satisfies(&Eligibility {
            land_area: Some(2.0),
            crop_type: Some("grapes".to_string()),
            annual_income: Some(200_000.0),
            ..Eligibility::default()
        }));
        assert!(!profile.satisfies(&Eligibility {
            land_area: Some(5.0),
            ..Eligibility::default()
        }));
        assert!(!profile.satisfies(&Eligibility {
            annual_income: Some(100_000.0),
            ..Eligibility::default()
        }));
    }

    #[test]
    fn patient_condition_matches_inside_history() {
        let patient = PatientProfile {
            age: 67,
            blood_group: "O+".to_string(),
            salary: 12_000.0,
            medical_history: "Type 2 Diabetes, hypertension".to_string(),
        };
        assert!(patient.satisfies(&Eligibility {
            age: Some(60),
            condition: Some("diabetes".to_string()),
            ..Eligibility::default()
        }));
        assert!(!patient.satisfies(&Eligibility {
            condition: Some("asthma".to_string()),
            ..Eligibility::default()
        }));
    }

    #[test]
    fn student_ignores_gpa_threshold() {
        let student = StudentProfile {
            age: 20,
            educational_institution: "COEP".to_string(),
            course_of_study: "B.Tech Mechanical Engineering".to_string(),
            academic_year: "3".to_string(),
            annual_family_income: 250_000.0,
        };
        assert!(student.satisfies(&Eligibility {
            minimum_gpa: Some(9.9),
            course_type: Some("engineering".to_string()),
            ..Eligibility::default()
        }));
    }

    #[test]
    fn hospital_reads_services_from_form() {
        let fields: FormFields = [
            ("location", "Pune"),
            ("services", "ICU"),
            ("services", "Maternity"),
            ("numberOfBeds", "120"),
            ("numberOfOutpatients", "800"),
            ("area", "Urban"),
        ]
        .into_iter()
        .collect();
        let mut reader = fields.reader();
        let profile = HospitalProfile::from_fields(&mut reader);
        reader.finish().expect("complete form");

        assert_eq!(profile.services, vec!["ICU", "Maternity"]);
        assert_eq!(profile.number_of_beds, 120);
        assert_eq!(profile.details()["beds"], 120);

        let mut problems = Vec::new();
        HospitalProfile {
            services: Vec::new(),
            ..profile
        }
        .validate(&mut problems);
        assert_eq!(problems.len(), 1);
    }
}
