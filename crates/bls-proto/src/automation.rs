//! Payloads of the automation subsystem: lifecycle, captcha solving and
//! appointment booking.

use crate::error::{ProtoError, Result};
use serde::{Deserialize, Serialize};

/// Observed state of the automation subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub is_running: bool,
}

impl SystemStatus {
    pub fn label(&self) -> &'static str {
        if self.is_running { "Running" } else { "Stopped" }
    }
}

/// Acknowledgement body returned by start/stop/delete style actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAck {
    pub message: String,
}

impl MessageAck {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Case-insensitive keyword check on the acknowledgement text.
    pub fn mentions(&self, keyword: &str) -> bool {
        self.message
            .to_lowercase()
            .contains(&keyword.to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptchaRequest {
    pub target_number: String,
    /// Ordered image payloads (base64).
    pub captcha_images: Vec<String>,
}

/// The solver's answer. Only its shape is checked, never its correctness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptchaSolution {
    pub selected_indices: Vec<u32>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl CaptchaSolution {
    pub fn validate(&self) -> Result<()> {
        match self.confidence {
            Some(c) if !(0.0..=1.0).contains(&c) => Err(ProtoError::ConfidenceOutOfRange(c)),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub location: String,
    pub visa_type: String,
    pub visa_sub_type: String,
    pub category: String,
    pub appointment_for: String,
    /// Party size.
    pub number_of_members: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Success,
    #[serde(alias = "failed", alias = "error")]
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingResult {
    pub status: BookingStatus,
    #[serde(default)]
    pub booking_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl BookingResult {
    pub fn success(booking_id: impl Into<String>) -> Self {
        Self {
            status: BookingStatus::Success,
            booking_id: Some(booking_id.into()),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: BookingStatus::Failure,
            booking_id: None,
            message: Some(message.into()),
        }
    }

    /// A success must carry a non-empty booking id.
    pub fn validate(&self) -> Result<()> {
        match (&self.status, self.booking_id.as_deref()) {
            (BookingStatus::Success, None | Some("")) => Err(ProtoError::MissingBookingId),
            _ => Ok(()),
        }
    }
}

/// Structured error body (`{"detail": ...}`, or `{"error": ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(alias = "error")]
    pub detail: serde_json::Value,
}

impl ErrorEnvelope {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: serde_json::Value::String(detail.into()),
        }
    }

    pub fn text(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
