//! Login-credential records.

use serde::{Deserialize, Serialize};

/// Payload for creating or replacing a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCredential {
    pub email: String,
    pub password: String,
    pub name: String,
    pub is_primary: bool,
    pub is_active: bool,
}

/// A credential as returned by the service. Passwords are never required
/// in responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(deserialize_with = "crate::id::deserialize")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub name: String,
    pub is_primary: bool,
    pub is_active: bool,
}

impl CredentialRecord {
    pub fn from_new(id: impl Into<String>, new: NewCredential) -> Self {
        Self {
            id: id.into(),
            email: Some(new.email),
            name: new.name,
            is_primary: new.is_primary,
            is_active: new.is_active,
        }
    }
}

/// Result of the side-effecting credential test action. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialTestResult {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl CredentialTestResult {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}
