//! Append-only result ledger.
//!
//! The ledger is the single source of truth for the final report. Outcomes
//! are partitioned by [`Category`] and kept in execution order; nothing is
//! ever removed or rewritten.
//!
//! Invariant: `total == passed + failed == sum of all partition lengths`.

use crate::models::{Category, TestOutcome};
use chrono::Utc;
use thiserror::Error;

/// Errors raised when recording an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A step with this name was already recorded in the category.
    #[error("step '{name}' already recorded in {category}")]
    DuplicateStep { category: Category, name: String },
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    partitions: [Vec<TestOutcome>; 4],
    passed: usize,
    failed: usize,
    total: usize,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an outcome and bumps the counters.
    ///
    /// A duplicate name within the category is rejected and leaves the
    /// ledger untouched.
    pub fn record(
        &mut self,
        category: Category,
        name: impl Into<String>,
        success: bool,
        message: impl Into<String>,
        detail: Option<serde_json::Value>,
    ) -> Result<&TestOutcome, LedgerError> {
        let name = name.into();
        let partition = &mut self.partitions[category.index()];

        if partition.iter().any(|o| o.name == name) {
            return Err(LedgerError::DuplicateStep { category, name });
        }

        partition.push(TestOutcome {
            category,
            name,
            success,
            message: message.into(),
            detail,
            timestamp: Utc::now(),
        });

        self.total += 1;
        if success {
            self.passed += 1;
        } else {
            self.failed += 1;
        }

        // Just pushed, so the partition is non-empty.
        Ok(&partition[partition.len() - 1])
    }

    /// Outcomes of one category in execution order.
    pub fn outcomes(&self, category: Category) -> &[TestOutcome] {
        &self.partitions[category.index()]
    }

    /// Every outcome, categories in report order.
    pub fn iter(&self) -> impl Iterator<Item = &TestOutcome> {
        self.partitions.iter().flatten()
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// True when nothing failed. An empty ledger counts as passing.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestOutcome> {
        self.iter().filter(|o| !o.success)
    }
}
