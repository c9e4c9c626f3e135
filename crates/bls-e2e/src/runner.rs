//! Run controller.
//!
//! The controller owns the transport and the ledger for one run. It moves
//! through `Created → Ready → Running → Finished`: [`RunController::setup`]
//! hands it a transport, [`RunController::run_all`] executes the matching
//! suites in their fixed order, and [`RunController::cleanup`] releases the
//! transport exactly once (from `Drop` if nobody else did).
//!
//! # Example
//!
//! ```no_run
//! use bls_e2e::{HarnessConfig, HttpTransport, RunController, default_suites};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = HarnessConfig::new("http://localhost:8001");
//!     let mut controller = RunController::new(default_suites(&config));
//!
//!     controller.setup(Box::new(HttpTransport::new(config.base_url.clone())?))?;
//!     controller.run_all().await?;
//!     controller.cleanup();
//!
//!     println!("Passed: {}", controller.ledger().passed());
//!     Ok(())
//! }
//! ```

use crate::ledger::Ledger;
use crate::models::{Category, SkippedStep, TestOutcome};
use crate::suites::{Recorder, Suite};
use crate::transport::Transport;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info};

/// Name of the outcome recorded when a suite panics.
pub const SUITE_FAULT_STEP: &str = "suite_fault";

/// Errors that can occur while driving a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunnerError {
    /// An operation was called in a state that does not allow it.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: RunState,
    },

    /// No suites matched the filter.
    #[error("no suites matched filter: {0}")]
    NoMatchingSuites(String),
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Created,
    Ready,
    Running,
    Finished,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Created => write!(f, "created"),
            RunState::Ready => write!(f, "ready"),
            RunState::Running => write!(f, "running"),
            RunState::Finished => write!(f, "finished"),
        }
    }
}

/// Configuration for a test run.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Filter suites by pattern (matches suite id, category or description).
    pub filter: Option<String>,
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter pattern.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Case-insensitive substring match on the suite's id, category or
    /// description. No filter matches everything.
    pub fn matches(&self, suite: &dyn Suite) -> bool {
        let Some(filter) = &self.filter else {
            return true;
        };
        let filter = filter.to_lowercase();
        let category = suite.category();

        [
            suite.id().to_lowercase(),
            category.key().to_lowercase(),
            category.to_string().to_lowercase(),
            suite.description().to_lowercase(),
        ]
        .iter()
        .any(|field| field.contains(&filter))
    }
}

/// Progress callback for run updates.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Events emitted during a run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A run has started.
    RunStarted { total_suites: usize },

    /// A suite is about to execute.
    SuiteStarted { suite_id: String, category: Category },

    /// A step outcome entered the ledger.
    StepRecorded { outcome: TestOutcome },

    /// A step was skipped for a missing input.
    StepSkipped { skipped: SkippedStep },

    /// A suite panicked; the run continues with the next one.
    SuiteFaulted { suite_id: String, message: String },

    /// The run has completed.
    RunCompleted {
        passed: usize,
        failed: usize,
        total: usize,
        duration: Duration,
    },
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub ledger: Ledger,
    pub skipped: Vec<SkippedStep>,
    pub duration: Duration,
}

/// Sequences suites against one transport.
pub struct RunController {
    state: RunState,
    suites: Vec<Box<dyn Suite>>,
    config: RunConfig,
    transport: Option<Box<dyn Transport>>,
    ledger: Ledger,
    skipped: Vec<SkippedStep>,
    duration: Duration,
    on_progress: Option<ProgressCallback>,
}

impl RunController {
    pub fn new(suites: Vec<Box<dyn Suite>>) -> Self {
        Self {
            state: RunState::Created,
            suites,
            config: RunConfig::default(),
            transport: None,
            ledger: Ledger::new(),
            skipped: Vec::new(),
            duration: Duration::ZERO,
            on_progress: None,
        }
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets a callback for progress updates.
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Suites the configured filter selects, in run order.
    pub fn matching_suites(&self) -> Vec<&dyn Suite> {
        self.suites
            .iter()
            .map(|s| s.as_ref())
            .filter(|s| self.config.matches(*s))
            .collect()
    }

    /// Takes ownership of the transport. `Created → Ready`.
    pub fn setup(&mut self, transport: Box<dyn Transport>) -> Result<(), RunnerError> {
        if self.state != RunState::Created {
            return Err(RunnerError::InvalidState {
                operation: "set up",
                state: self.state,
            });
        }

        self.transport = Some(transport);
        self.state = RunState::Ready;
        debug!("run controller ready");
        Ok(())
    }

    /// Runs every matching suite in order, regardless of earlier outcomes.
    /// `Ready → Running → Finished`.
    pub async fn run_all(&mut self) -> Result<(), RunnerError> {
        let invalid = RunnerError::InvalidState {
            operation: "run",
            state: self.state,
        };
        if self.state != RunState::Ready {
            return Err(invalid);
        }
        let Some(transport) = self.transport.as_deref() else {
            return Err(invalid);
        };

        let selected: Vec<usize> = (0..self.suites.len())
            .filter(|&i| self.config.matches(self.suites[i].as_ref()))
            .collect();
        if selected.is_empty()
            && let Some(filter) = &self.config.filter
        {
            return Err(RunnerError::NoMatchingSuites(filter.clone()));
        }

        self.state = RunState::Running;
        let start = Instant::now();
        let on_progress = self.on_progress.as_ref();
        emit(
            on_progress,
            ProgressEvent::RunStarted {
                total_suites: selected.len(),
            },
        );

        for index in selected {
            let suite = self.suites[index].as_ref();
            let category = suite.category();
            info!(suite = suite.id(), "running suite");
            emit(
                on_progress,
                ProgressEvent::SuiteStarted {
                    suite_id: suite.id().to_string(),
                    category,
                },
            );

            let result = {
                let mut recorder =
                    Recorder::new(category, &mut self.ledger, &mut self.skipped, on_progress);
                AssertUnwindSafe(suite.run(transport, &mut recorder))
                    .catch_unwind()
                    .await
            };

            if let Err(panic) = result {
                let message = panic_message(panic.as_ref());
                error!(suite = suite.id(), %message, "suite panicked");

                match self.ledger.record(
                    category,
                    SUITE_FAULT_STEP,
                    false,
                    format!("suite panicked: {message}"),
                    None,
                ) {
                    Ok(outcome) => emit(
                        on_progress,
                        ProgressEvent::StepRecorded {
                            outcome: outcome.clone(),
                        },
                    ),
                    Err(e) => error!(error = %e, "fault outcome rejected"),
                }
                emit(
                    on_progress,
                    ProgressEvent::SuiteFaulted {
                        suite_id: suite.id().to_string(),
                        message,
                    },
                );
            }
        }

        self.duration = start.elapsed();
        self.state = RunState::Finished;
        info!(
            passed = self.ledger.passed(),
            failed = self.ledger.failed(),
            "run finished"
        );
        emit(
            on_progress,
            ProgressEvent::RunCompleted {
                passed: self.ledger.passed(),
                failed: self.ledger.failed(),
                total: self.ledger.total(),
                duration: self.duration,
            },
        );

        Ok(())
    }

    /// Releases the transport. Safe to call more than once.
    pub fn cleanup(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.shutdown();
            debug!("transport released");
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn skipped(&self) -> &[SkippedStep] {
        &self.skipped
    }

    /// Consumes the controller, releasing the transport if still held.
    pub fn into_report(mut self) -> RunReport {
        self.cleanup();
        RunReport {
            ledger: std::mem::take(&mut self.ledger),
            skipped: std::mem::take(&mut self.skipped),
            duration: self.duration,
        }
    }
}

impl Drop for RunController {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn emit(callback: Option<&ProgressCallback>, event: ProgressEvent) {
    if let Some(callback) = callback {
        callback(event);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
