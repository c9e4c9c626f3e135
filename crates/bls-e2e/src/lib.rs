//! # bls-e2e
//!
//! Black-box conformance harness for the BLS automation service.
//!
//! The harness drives a live deployment through its HTTP API and its
//! streaming endpoint, records one outcome per step and reduces the outcomes
//! into per-category pass rates. It never inspects the service's internals:
//! every invariant (primary exclusivity, running/stopped transitions) is
//! checked through observed responses only.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ RunController │────▶│   Suites    │────▶│  Transport  │
//! └───────────────┘     └─────────────┘     └─────────────┘
//!        │                     │
//!        ▼                     ▼
//! ┌───────────────┐     ┌─────────────┐
//! │   Reporter    │◀────│   Ledger    │
//! └───────────────┘     └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - `transport`: HTTP and WebSocket access to the service
//! - `ledger`: append-only, category-partitioned outcomes
//! - `suites`: the four step scripts and the `Suite` trait
//! - `runner`: run lifecycle and progress events
//! - `reporter`: summaries, terminal and JSON rendering
//! - `config`: base URL resolution

pub use crate::config::{
    BASE_URL_KEY, BaseUrlSource, ConfigError, DEFAULT_ENV_FILE, DEFAULT_STREAM_TIMEOUT,
    FALLBACK_BASE_URL, HarnessConfig,
};
pub use crate::ledger::{Ledger, LedgerError};
pub use crate::models::{Category, SkippedStep, TestOutcome};
pub use crate::reporter::{
    CategorySummary, Summary, TerminalReporter, Verbosity, create_progress_callback,
};
pub use crate::runner::{
    ProgressCallback, ProgressEvent, RunConfig, RunController, RunReport, RunState, RunnerError,
    SUITE_FAULT_STEP,
};
pub use crate::steps::{Passed, StepFailure, StepResult};
pub use crate::suites::{
    ApplicantsSuite, AutomationSuite, CredentialsSuite, Recorder, StreamingSuite, Suite,
    default_suites,
};
pub use crate::transport::{
    ApiResponse, HttpTransport, Method, StreamChannel, StreamError, TRANSPORT_FAILURE_STATUS,
    Transport,
};

pub mod config;
pub mod fixtures;
pub mod ledger;
mod models;
pub mod reporter;
pub mod runner;
pub mod steps;
pub mod suites;
#[cfg(test)]
mod testing;
pub mod transport;

/// Library version, matching the crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
