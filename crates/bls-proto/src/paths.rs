//! Endpoint paths, relative to the API root (`<base>/api`).
//!
//! The streaming endpoint is the exception: [`STREAM`] hangs off the base URL.

pub const APPLICANTS: &str = "/applicants";
pub const PRIMARY_APPLICANT: &str = "/applicants/primary/info";

pub const CREDENTIALS: &str = "/credentials";
pub const ACTIVE_CREDENTIALS: &str = "/credentials?active_only=true";
pub const PRIMARY_CREDENTIAL: &str = "/credentials/primary/info";

pub const STATUS: &str = "/bls/status";
pub const START: &str = "/bls/start";
pub const STOP: &str = "/bls/stop";
pub const SOLVE_CAPTCHA: &str = "/bls/solve-captcha";
pub const BOOK_APPOINTMENT: &str = "/bls/book-appointment";
pub const BOOKINGS: &str = "/bls/bookings";

/// Prefix every HTTP path is mounted under.
pub const API_PREFIX: &str = "/api";

pub const STREAM: &str = "/ws";

pub fn applicant(id: &str) -> String {
    format!("{APPLICANTS}/{id}")
}

pub fn credential(id: &str) -> String {
    format!("{CREDENTIALS}/{id}")
}

pub fn set_primary_credential(id: &str) -> String {
    format!("{CREDENTIALS}/{id}/set-primary")
}

pub fn test_credential(id: &str) -> String {
    format!("{CREDENTIALS}/{id}/test")
}
