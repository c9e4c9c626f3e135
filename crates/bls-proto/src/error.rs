//! Error types for wire record validation.

use thiserror::Error;

/// Shape violations that deserialization alone cannot catch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtoError {
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),

    #[error("booking reported success without a booking_id")]
    MissingBookingId,

    #[error("empty identifier")]
    EmptyId,
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, ProtoError>;
