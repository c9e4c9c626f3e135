//! Request payloads the suites send.

use bls_proto::{BookingRequest, CaptchaRequest, NewApplicant, NewCredential};

/// Phone number written by `update_applicant`.
pub const UPDATED_PHONE: &str = "+34600000000";

/// Name written by `update_credential`.
pub const UPDATED_CREDENTIAL_NAME: &str = "Updated Maria Garcia BLS Account";

/// Text sent over the streaming channel.
pub const STREAM_GREETING: &str = "Hello BLS WebSocket";

pub fn primary_applicant() -> NewApplicant {
    NewApplicant {
        first_name: "Maria".to_string(),
        last_name: "Garcia".to_string(),
        email: "maria.garcia@email.com".to_string(),
        phone: "+34612345678".to_string(),
        passport_number: "ESP123456789".to_string(),
        nationality: "Spanish".to_string(),
        date_of_birth: "1990-05-15".to_string(),
        is_primary: true,
    }
}

pub fn secondary_applicant() -> NewApplicant {
    NewApplicant {
        first_name: "Carlos".to_string(),
        last_name: "Rodriguez".to_string(),
        email: "carlos.rodriguez@email.com".to_string(),
        phone: "+34687654321".to_string(),
        passport_number: "ESP987654321".to_string(),
        nationality: "Spanish".to_string(),
        date_of_birth: "1985-08-22".to_string(),
        is_primary: false,
    }
}

/// The primary applicant with [`UPDATED_PHONE`].
pub fn updated_applicant() -> NewApplicant {
    NewApplicant {
        phone: UPDATED_PHONE.to_string(),
        ..primary_applicant()
    }
}

pub fn primary_credential() -> NewCredential {
    NewCredential {
        email: "maria.garcia@blsspain.com".to_string(),
        password: "SecurePass123!".to_string(),
        name: "Maria Garcia BLS Account".to_string(),
        is_primary: true,
        is_active: true,
    }
}

pub fn secondary_credential() -> NewCredential {
    NewCredential {
        email: "carlos.rodriguez@blsspain.com".to_string(),
        password: "AnotherPass456!".to_string(),
        name: "Carlos Rodriguez BLS Account".to_string(),
        is_primary: false,
        is_active: true,
    }
}

/// The first credential renamed to [`UPDATED_CREDENTIAL_NAME`].
///
/// Sent after the second credential was promoted, so it no longer claims
/// the primary designation.
pub fn updated_credential() -> NewCredential {
    NewCredential {
        name: UPDATED_CREDENTIAL_NAME.to_string(),
        is_primary: false,
        ..primary_credential()
    }
}

/// Placeholder images; the solver's answer is only shape-checked.
pub fn captcha_request() -> CaptchaRequest {
    CaptchaRequest {
        target_number: "7".to_string(),
        captcha_images: vec![
            "base64image1".to_string(),
            "base64image2".to_string(),
            "base64image3".to_string(),
        ],
    }
}

pub fn booking_request() -> BookingRequest {
    BookingRequest {
        location: "Madrid".to_string(),
        visa_type: "Tourist".to_string(),
        visa_sub_type: "Short Stay".to_string(),
        category: "Normal".to_string(),
        appointment_for: "Individual".to_string(),
        number_of_members: 1,
    }
}
