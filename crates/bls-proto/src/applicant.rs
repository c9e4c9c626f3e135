//! Applicant records.
//!
//! At most one applicant is primary at any time. The service enforces this;
//! clients observe it only through [`crate::paths::PRIMARY_APPLICANT`].

use serde::{Deserialize, Serialize};

/// Payload for creating or replacing an applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplicant {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// External identifier of the applicant (passport number).
    pub passport_number: String,
    pub nationality: String,
    /// ISO date, `YYYY-MM-DD`.
    pub date_of_birth: String,
    pub is_primary: bool,
}

/// An applicant as returned by the service.
///
/// `id`, the name fields and `is_primary` are required; the rest are
/// tolerated when absent so that a trimmed projection still decodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    #[serde(deserialize_with = "crate::id::deserialize")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    pub is_primary: bool,
}

impl ApplicantRecord {
    /// Builds the record a store would hold for `new` under `id`.
    pub fn from_new(id: impl Into<String>, new: NewApplicant) -> Self {
        Self {
            id: id.into(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: Some(new.email),
            phone: Some(new.phone),
            passport_number: Some(new.passport_number),
            nationality: Some(new.nationality),
            date_of_birth: Some(new.date_of_birth),
            is_primary: new.is_primary,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
