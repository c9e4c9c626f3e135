//! Typed step results.
//!
//! Every step produces a [`StepResult`]: either a [`Passed`] value carrying
//! what the next step needs, or a [`StepFailure`] naming which tier failed.
//! The helpers here do the status and shape checks that most steps share.

use crate::transport::{ApiResponse, StreamError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

/// A step whose predicate held.
#[derive(Debug, Clone, PartialEq)]
pub struct Passed<T> {
    pub message: String,
    /// Value handed to dependent steps (a captured id, a decoded record).
    pub value: T,
    pub detail: Option<Value>,
}

impl<T> Passed<T> {
    pub fn new(message: impl Into<String>, value: T) -> Self {
        Self {
            message: message.into(),
            value,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

impl Passed<()> {
    pub fn unit(message: impl Into<String>) -> Self {
        Self::new(message, ())
    }
}

/// Why a step failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepFailure {
    /// The request never produced a usable response.
    #[error("{message}")]
    Transport { message: String },

    /// The service answered, but not as the contract requires.
    #[error("{message}")]
    Contract {
        message: String,
        status: u16,
        body: Value,
    },

    #[error("{message}")]
    Stream { message: String },

    #[error("no message within {}ms", after.as_millis())]
    TimedOut { after: Duration },
}

impl StepFailure {
    /// A contract violation observed on `response`.
    pub fn contract(message: impl Into<String>, response: &ApiResponse) -> Self {
        StepFailure::Contract {
            message: message.into(),
            status: response.status,
            body: response.body.clone(),
        }
    }

    /// Structured detail stored alongside the failing outcome.
    pub fn detail(&self) -> Option<Value> {
        match self {
            StepFailure::Transport { .. } | StepFailure::Stream { .. } => None,
            StepFailure::Contract { status, body, .. } => {
                Some(json!({ "status": status, "body": body }))
            }
            StepFailure::TimedOut { after } => Some(json!({
                "timed_out": true,
                "after_ms": u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
            })),
        }
    }
}

impl From<StreamError> for StepFailure {
    fn from(error: StreamError) -> Self {
        match error {
            StreamError::TimedOut(after) => StepFailure::TimedOut { after },
            other => StepFailure::Stream {
                message: other.to_string(),
            },
        }
    }
}

pub type StepResult<T> = Result<Passed<T>, StepFailure>;

/// Serializes a request payload.
pub fn payload<T: Serialize>(value: &T) -> Result<Value, StepFailure> {
    serde_json::to_value(value).map_err(|e| StepFailure::Transport {
        message: format!("failed to encode request: {e}"),
    })
}

/// Checks that `response` is a real response with status `expected`.
pub fn expect_status(response: &ApiResponse, expected: u16) -> Result<(), StepFailure> {
    if let Some(error) = response.transport_error() {
        return Err(StepFailure::Transport {
            message: error.to_string(),
        });
    }

    if response.status != expected {
        return Err(StepFailure::contract(
            format!(
                "expected HTTP {expected}, got {}: {}",
                response.status,
                summarize(&response.body)
            ),
            response,
        ));
    }

    Ok(())
}

/// Decodes the body into `T`, treating a mismatch as a contract violation.
pub fn decode<T: DeserializeOwned>(response: &ApiResponse) -> Result<T, StepFailure> {
    serde_json::from_value(response.body.clone()).map_err(|e| {
        StepFailure::contract(format!("unexpected response shape: {e}"), response)
    })
}

/// `expect_status(200)` followed by [`decode`].
pub fn decode_ok<T: DeserializeOwned>(response: &ApiResponse) -> Result<T, StepFailure> {
    expect_status(response, 200)?;
    decode(response)
}

/// Fails with `message` when `condition` does not hold.
pub fn ensure(
    condition: bool,
    response: &ApiResponse,
    message: impl FnOnce() -> String,
) -> Result<(), StepFailure> {
    if condition {
        Ok(())
    } else {
        Err(StepFailure::contract(message(), response))
    }
}

/// Passes unless `response` still returns the record `id`.
///
/// Any non-200 answer counts as absent, as does a 200 whose body is not a
/// `T` with that id.
pub fn expect_absent<T: DeserializeOwned>(
    response: &ApiResponse,
    id: &str,
    id_of: impl Fn(&T) -> &str,
) -> Result<(), StepFailure> {
    if let Some(error) = response.transport_error() {
        return Err(StepFailure::Transport {
            message: error.to_string(),
        });
    }
    if response.status != 200 {
        return Ok(());
    }

    match decode::<T>(response) {
        Ok(record) if id_of(&record) == id => Err(StepFailure::contract(
            format!("deleted record {id} is still retrievable"),
            response,
        )),
        _ => Ok(()),
    }
}

/// Short single-line rendering of a body for messages.
fn summarize(body: &Value) -> String {
    const LIMIT: usize = 200;

    let text = match body {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > LIMIT {
        let cut: String = text.chars().take(LIMIT).collect();
        format!("{cut}...")
    } else {
        text
    }
}
