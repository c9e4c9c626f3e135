//! # bls-proto
//!
//! Wire records and endpoint paths for the BLS automation service.
//!
//! This crate provides the request/response contracts shared by the
//! conformance harness and its in-process test doubles, including:
//! - Applicant and login-credential records
//! - Automation subsystem payloads (status, captcha, booking)
//! - The plain-text echo protocol of the streaming endpoint
//! - Endpoint path builders

pub mod applicant;
pub mod automation;
pub mod credential;
pub mod error;
pub mod paths;
pub mod stream;

mod id;

pub use applicant::{ApplicantRecord, NewApplicant};
pub use automation::{
    BookingRequest, BookingResult, BookingStatus, CaptchaRequest, CaptchaSolution, ErrorEnvelope,
    MessageAck, SystemStatus,
};
pub use credential::{CredentialRecord, CredentialTestResult, NewCredential};
pub use error::{ProtoError, Result};
pub use stream::{ECHO_MARKER, echo_reply, is_echo_of};
