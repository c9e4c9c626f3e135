//! Automation subsystem state machine.
//!
//! Walks the subsystem through Stopped → Running → Stopped, checking each
//! transition through the status endpoint, and exercises the captcha solver
//! and the booking engine while it runs.

use super::{Recorder, Suite};
use crate::fixtures;
use crate::models::Category;
use crate::steps::{
    Passed, StepFailure, StepResult, decode, decode_ok, ensure, expect_status, payload,
};
use crate::transport::{Method, Transport};
use async_trait::async_trait;
use bls_proto::{
    ApplicantRecord, BookingResult, BookingStatus, CaptchaSolution, CredentialRecord,
    ErrorEnvelope, MessageAck, SystemStatus, paths,
};
use serde_json::Value;
use tracing::debug;

const STEPS: &[&str] = &[
    "get_system_status",
    "start_system",
    "verify_system_running",
    "solve_captcha",
    "book_appointment",
    "get_bookings",
    "stop_system",
    "verify_system_stopped",
];

/// Suite covering `/bls/*`.
pub struct AutomationSuite {
    id: String,
    description: String,
}

impl AutomationSuite {
    pub fn new() -> Self {
        Self {
            id: "automation".to_string(),
            description: "Automation start/stop, captcha solving and booking".to_string(),
        }
    }
}

impl Default for AutomationSuite {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Suite for AutomationSuite {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> Category {
        Category::Automation
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn steps(&self) -> &'static [&'static str] {
        STEPS
    }

    async fn run(&self, transport: &dyn Transport, recorder: &mut Recorder<'_>) {
        recorder.record("get_system_status", status(transport, None).await);
        recorder.record("start_system", lifecycle(transport, paths::START, "started").await);
        recorder.record("verify_system_running", status(transport, Some(true)).await);
        recorder.record("solve_captcha", solve_captcha(transport).await);

        match booking_precondition(transport).await {
            Ok(()) => {
                recorder.record("book_appointment", book(transport).await);
            }
            Err(reason) => recorder.skip("book_appointment", reason),
        }

        recorder.record("get_bookings", bookings(transport).await);
        recorder.record("stop_system", lifecycle(transport, paths::STOP, "stopped").await);
        recorder.record("verify_system_stopped", status(transport, Some(false)).await);
    }
}

/// Reads the status, optionally requiring a given running state.
async fn status(transport: &dyn Transport, expect_running: Option<bool>) -> StepResult<()> {
    let response = transport.call(Method::Get, paths::STATUS, None).await;
    let status: SystemStatus = decode_ok(&response)?;

    if let Some(expected) = expect_running {
        ensure(status.is_running == expected, &response, || {
            format!(
                "is_running is {}, expected {expected}",
                status.is_running
            )
        })?;
    }

    Ok(Passed::unit(format!("System is {}", status.label())).with_detail(response.body))
}

/// Start or stop; the acknowledgement must mention `keyword`.
async fn lifecycle(transport: &dyn Transport, path: &str, keyword: &str) -> StepResult<()> {
    let response = transport.call(Method::Post, path, None).await;
    let ack: MessageAck = decode_ok(&response)?;
    ensure(ack.mentions(keyword), &response, || {
        format!("acknowledgement '{}' does not mention '{keyword}'", ack.message)
    })?;
    Ok(Passed::unit(ack.message))
}

async fn solve_captcha(transport: &dyn Transport) -> StepResult<()> {
    let body = payload(&fixtures::captcha_request())?;
    let response = transport
        .call(Method::Post, paths::SOLVE_CAPTCHA, Some(&body))
        .await;
    let solution: CaptchaSolution = decode_ok(&response)?;
    solution
        .validate()
        .map_err(|e| StepFailure::contract(e.to_string(), &response))?;

    let confidence = solution
        .confidence
        .map_or_else(|| "n/a".to_string(), |c| format!("{c:.2}"));
    Ok(Passed::unit(format!(
        "Selected indices {:?} with confidence {confidence}",
        solution.selected_indices
    )))
}

/// Booking needs both a primary applicant and a primary credential.
///
/// Not a recorded step: a missing primary skips the booking with a reason.
async fn booking_precondition(transport: &dyn Transport) -> Result<(), String> {
    let mut missing = Vec::new();

    let response = transport
        .call(Method::Get, paths::PRIMARY_APPLICANT, None)
        .await;
    if !matches!(decode_ok::<ApplicantRecord>(&response), Ok(r) if r.is_primary) {
        missing.push("primary applicant");
    }

    let response = transport
        .call(Method::Get, paths::PRIMARY_CREDENTIAL, None)
        .await;
    if !matches!(decode_ok::<CredentialRecord>(&response), Ok(r) if r.is_primary) {
        missing.push("primary credential");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        debug!(?missing, "booking precondition not met");
        Err(format!("no {}", missing.join(" and no ")))
    }
}

/// Passes on a booked result or on a structured refusal.
async fn book(transport: &dyn Transport) -> StepResult<()> {
    let body = payload(&fixtures::booking_request())?;
    let response = transport
        .call(Method::Post, paths::BOOK_APPOINTMENT, Some(&body))
        .await;

    if let Some(error) = response.transport_error() {
        return Err(StepFailure::Transport {
            message: error.to_string(),
        });
    }

    if response.status == 200
        && let Ok(result) = decode::<BookingResult>(&response)
    {
        result
            .validate()
            .map_err(|e| StepFailure::contract(e.to_string(), &response))?;

        let message = match result.status {
            BookingStatus::Success => format!(
                "Booked appointment {}",
                result.booking_id.as_deref().unwrap_or_default()
            ),
            BookingStatus::Failure => format!(
                "Booking declined: {}",
                result.message.as_deref().unwrap_or("no reason given")
            ),
        };
        return Ok(Passed::unit(message).with_detail(response.body));
    }

    if let Ok(envelope) = decode::<ErrorEnvelope>(&response) {
        return Ok(Passed::unit(format!("Booking rejected: {}", envelope.text()))
            .with_detail(response.body));
    }

    expect_status(&response, 200)?;
    Err(StepFailure::contract(
        "booking response is neither a result nor an error envelope",
        &response,
    ))
}

async fn bookings(transport: &dyn Transport) -> StepResult<()> {
    let response = transport.call(Method::Get, paths::BOOKINGS, None).await;
    let bookings: Vec<Value> = decode_ok(&response)?;
    Ok(Passed::unit(format!("Retrieved {} bookings", bookings.len())))
}
