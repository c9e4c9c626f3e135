//! Conformance suites.
//!
//! A suite is a fixed, ordered script of dependent steps against one area of
//! the service. Steps pass identifiers forward: when a step that produces an
//! id fails, the steps needing that id are skipped rather than failed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                            Suite                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  step fn  → call transport, decode, check → StepResult<T>    │
//! │  Recorder → one outcome per StepResult, Option<T> onwards    │
//! │  skip     → missing input, kept out of the ledger            │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod applicants;
mod automation;
mod credentials;
mod streaming;

pub use applicants::ApplicantsSuite;
pub use automation::AutomationSuite;
pub use credentials::CredentialsSuite;
pub use streaming::StreamingSuite;

use crate::config::HarnessConfig;
use crate::ledger::Ledger;
use crate::models::{Category, SkippedStep};
use crate::runner::{ProgressCallback, ProgressEvent};
use crate::steps::StepResult;
use crate::transport::Transport;
use async_trait::async_trait;
use tracing::{debug, error};

/// A conformance suite run against a [`Transport`].
#[async_trait]
pub trait Suite: Send + Sync {
    /// Unique identifier (e.g., "applicants").
    fn id(&self) -> &str;

    /// Category every outcome of this suite is recorded under.
    fn category(&self) -> Category;

    fn description(&self) -> &str;

    /// Names of the recorded steps, in execution order.
    fn steps(&self) -> &'static [&'static str];

    /// Runs every step, recording each through `recorder`.
    ///
    /// Suites never return an error: each failure is local to its step.
    async fn run(&self, transport: &dyn Transport, recorder: &mut Recorder<'_>);
}

/// The four suites in run order.
pub fn default_suites(config: &HarnessConfig) -> Vec<Box<dyn Suite>> {
    vec![
        Box::new(ApplicantsSuite::new()),
        Box::new(CredentialsSuite::new()),
        Box::new(AutomationSuite::new()),
        Box::new(StreamingSuite::new(
            config.stream_path.clone(),
            config.stream_timeout,
        )),
    ]
}

/// Write access to the ledger, scoped to one suite's category.
pub struct Recorder<'a> {
    category: Category,
    ledger: &'a mut Ledger,
    skipped: &'a mut Vec<SkippedStep>,
    on_progress: Option<&'a ProgressCallback>,
}

impl<'a> Recorder<'a> {
    pub(crate) fn new(
        category: Category,
        ledger: &'a mut Ledger,
        skipped: &'a mut Vec<SkippedStep>,
        on_progress: Option<&'a ProgressCallback>,
    ) -> Self {
        Self {
            category,
            ledger,
            skipped,
            on_progress,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Records `result` as one outcome and returns the passed value.
    pub fn record<T>(&mut self, name: &str, result: StepResult<T>) -> Option<T> {
        let (success, message, detail, value) = match result {
            Ok(passed) => (true, passed.message, passed.detail, Some(passed.value)),
            Err(failure) => (false, failure.to_string(), failure.detail(), None),
        };

        match self
            .ledger
            .record(self.category, name, success, message, detail)
        {
            Ok(outcome) => {
                debug!(step = %outcome.label(), success, "step recorded");
                if let Some(callback) = self.on_progress {
                    callback(ProgressEvent::StepRecorded {
                        outcome: outcome.clone(),
                    });
                }
            }
            Err(e) => error!(error = %e, "outcome rejected"),
        }

        value
    }

    /// Records that `name` did not run because its input is missing.
    pub fn skip(&mut self, name: &str, reason: impl Into<String>) {
        let skipped = SkippedStep {
            category: self.category,
            name: name.to_string(),
            reason: reason.into(),
        };
        debug!(
            category = self.category.key(),
            step = %skipped.name,
            reason = %skipped.reason,
            "step skipped"
        );

        if let Some(callback) = self.on_progress {
            callback(ProgressEvent::StepSkipped {
                skipped: skipped.clone(),
            });
        }
        self.skipped.push(skipped);
    }
}
