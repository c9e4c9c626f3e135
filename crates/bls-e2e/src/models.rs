//! Data models for the conformance harness.
//!
//! This module defines the core data structures shared by the ledger, the
//! suites and the reporter: categories, recorded outcomes and skips.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result category. Declaration order is the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Applicant record lifecycle
    Applicants,
    /// Login-credential record lifecycle
    Credentials,
    /// Automation subsystem state machine
    Automation,
    /// Streaming echo channel
    Streaming,
}

impl Category {
    /// All categories in report order.
    pub const ALL: [Category; 4] = [
        Category::Applicants,
        Category::Credentials,
        Category::Automation,
        Category::Streaming,
    ];

    /// Snake-case key used in step labels and JSON output.
    pub fn key(self) -> &'static str {
        match self {
            Category::Applicants => "applicant_management",
            Category::Credentials => "credentials_management",
            Category::Automation => "bls_automation",
            Category::Streaming => "websocket",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Applicants => write!(f, "Applicant Management"),
            Category::Credentials => write!(f, "Credentials Management"),
            Category::Automation => write!(f, "BLS Automation"),
            Category::Streaming => write!(f, "WebSocket"),
        }
    }
}

/// Immutable record of one executed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Category the step belongs to
    pub category: Category,
    /// Step name, unique within the category
    pub name: String,
    /// Whether the step's predicate held
    pub success: bool,
    /// Human-readable summary of what was observed
    pub message: String,
    /// Observed payload, kept for diagnosis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
    /// When the outcome was recorded
    pub timestamp: DateTime<Utc>,
}

impl TestOutcome {
    /// `category.name` label used in terminal output.
    pub fn label(&self) -> String {
        format!("{}.{}", self.category.key(), self.name)
    }
}

/// A step omitted because an earlier step did not produce its input.
///
/// Skips are diagnostics only; they never enter the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedStep {
    pub category: Category,
    pub name: String,
    pub reason: String,
}
