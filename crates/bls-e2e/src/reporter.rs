//! Reporting for conformance runs.
//!
//! [`Summary`] is a pure reduction of a [`Ledger`] into per-category and
//! overall pass rates. [`TerminalReporter`] prints live step lines from
//! progress events and renders the summary; [`Summary::to_json`] is the
//! machine-readable form.
//!
//! # Example
//!
//! ```no_run
//! use bls_e2e::{Ledger, Summary, TerminalReporter};
//!
//! let ledger = Ledger::new();
//! let summary = Summary::from_ledger(&ledger);
//!
//! TerminalReporter::new().print_summary(&summary);
//! if let Ok(json) = summary.to_json() {
//!     println!("{json}");
//! }
//! ```

use crate::config::HarnessConfig;
use crate::ledger::Ledger;
use crate::models::{Category, SkippedStep, TestOutcome};
use crate::runner::{ProgressCallback, ProgressEvent};
use colored::Colorize;
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Verbosity level for terminal output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Show only the pass/fail summary.
    Quiet,
    /// Step lines and the summary.
    #[default]
    Normal,
    /// Also show observed detail of failing steps.
    Verbose,
}

/// Results of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub key: &'static str,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
    /// Percentage, 0 when the category is empty.
    pub rate: f64,
    pub outcomes: Vec<TestOutcome>,
}

/// Per-category and overall pass rates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
    pub rate: f64,
    /// Every category, in declared order, including empty ones.
    pub categories: Vec<CategorySummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedStep>,
}

impl Summary {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let categories = Category::ALL
            .iter()
            .map(|&category| {
                let outcomes = ledger.outcomes(category).to_vec();
                let passed = outcomes.iter().filter(|o| o.success).count();
                let total = outcomes.len();
                CategorySummary {
                    category,
                    key: category.key(),
                    passed,
                    failed: total - passed,
                    total,
                    rate: rate(passed, total),
                    outcomes,
                }
            })
            .collect();

        Self {
            passed: ledger.passed(),
            failed: ledger.failed(),
            total: ledger.total(),
            rate: rate(ledger.passed(), ledger.total()),
            categories,
            skipped: Vec::new(),
        }
    }

    /// Attaches precondition skips for display. Counters are unaffected.
    pub fn with_skipped(mut self, skipped: &[SkippedStep]) -> Self {
        self.skipped = skipped.to_vec();
        self
    }

    pub fn category(&self, category: Category) -> &CategorySummary {
        &self.categories[category.index()]
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}

/// Terminal reporter for conformance runs.
#[derive(Debug, Default)]
pub struct TerminalReporter {
    verbosity: Verbosity,
}

impl TerminalReporter {
    /// Creates a new terminal reporter with normal verbosity.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbosity(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Handles a progress event, printing live output.
    pub fn handle_progress(&mut self, event: ProgressEvent) {
        if self.verbosity == Verbosity::Quiet {
            if let ProgressEvent::SuiteFaulted { suite_id, message } = event {
                eprintln!("{} {suite_id}: {message}", "suite fault".red().bold());
            }
            return;
        }

        match event {
            ProgressEvent::RunStarted { total_suites } => {
                println!(
                    "\n{}\n",
                    format!(
                        "Running {} suite{}...",
                        total_suites,
                        if total_suites == 1 { "" } else { "s" }
                    )
                    .bold()
                );
            }
            ProgressEvent::SuiteStarted { category, .. } => {
                println!("\n{}", category_header(category).bold());
            }
            ProgressEvent::StepRecorded { outcome } => {
                println!("{}", self.format_outcome(&outcome));
            }
            ProgressEvent::StepSkipped { skipped } => {
                println!("{}", format_skipped(&skipped));
            }
            ProgressEvent::SuiteFaulted { suite_id, message } => {
                println!(
                    "  {} {}",
                    "suite fault:".red().bold(),
                    format!("{suite_id}: {message}").red()
                );
            }
            // The summary is printed separately.
            ProgressEvent::RunCompleted { .. } => {}
        }
    }

    /// Prints the target endpoints before a run.
    pub fn print_banner(&self, config: &HarnessConfig) {
        if self.verbosity == Verbosity::Quiet {
            return;
        }
        println!(
            "\n{} {}",
            "🚀 BLS backend conformance".bold(),
            format!("v{}", crate::VERSION).dimmed()
        );
        println!("📡 Backend URL: {}", config.base_url);
        println!("🔗 API Base URL: {}", config.api_root());
        println!("{}", "━".repeat(60).dimmed());
    }

    pub fn print_summary(&self, summary: &Summary) {
        print!("{}", self.render_summary(summary));
    }

    /// Renders the summary block.
    pub fn render_summary(&self, summary: &Summary) -> String {
        if self.verbosity == Verbosity::Quiet {
            let line = if summary.failed == 0 {
                format!("✓ {}/{} passed", summary.passed, summary.total).green()
            } else {
                format!("✗ {}/{} failed", summary.failed, summary.total).red()
            };
            return format!("{line}\n");
        }

        let mut out = String::new();
        out.push_str(&format!("\n{}\n", "━".repeat(60).dimmed()));
        out.push_str(&format!("{}\n", "📊 TEST RESULTS SUMMARY".bold()));
        out.push_str(&format!("✅ Passed: {}\n", summary.passed));
        out.push_str(&format!("❌ Failed: {}\n", summary.failed));
        out.push_str(&format!("📈 Total: {}\n", summary.total));
        out.push_str(&format!("📊 Success Rate: {:.1}%\n", summary.rate));

        out.push_str(&format!("\n{}\n", "📋 RESULTS BY CATEGORY:".bold()));
        for category in &summary.categories {
            let score = format!(
                "{}/{} ({:.1}%)",
                category.passed, category.total, category.rate
            );
            let score = if category.failed == 0 {
                score.green()
            } else {
                score.red()
            };
            out.push_str(&format!("  {}: {score}\n", category.category));
        }

        if self.verbosity == Verbosity::Verbose {
            out.push_str(&format!("\n{}\n", "📝 DETAILED RESULTS BY CATEGORY:".bold()));
            for category in summary.categories.iter().filter(|c| c.total > 0) {
                out.push_str(&format!("\n{}\n", category_header(category.category).bold()));
                for outcome in &category.outcomes {
                    out.push_str(&format!("{}\n", self.format_outcome(outcome)));
                }
            }
        }

        let failures: Vec<&TestOutcome> = summary
            .categories
            .iter()
            .flat_map(|c| c.outcomes.iter())
            .filter(|o| !o.success)
            .collect();
        // Verbose output already listed every outcome.
        if !failures.is_empty() && self.verbosity != Verbosity::Verbose {
            out.push_str(&format!("\n{}\n", "Failed steps:".red().bold()));
            for outcome in failures {
                out.push_str(&format!("{}\n", self.format_outcome(outcome)));
            }
        }

        if !summary.skipped.is_empty() {
            out.push_str(&format!(
                "\n{}\n",
                format!("{} step(s) skipped:", summary.skipped.len()).dimmed()
            ));
            for skipped in &summary.skipped {
                out.push_str(&format!("{}\n", format_skipped(skipped)));
            }
        }

        out
    }

    fn format_outcome(&self, outcome: &TestOutcome) -> String {
        let status = if outcome.success { "✅" } else { "❌" };
        let mut line = format!("  {status} {}: {}", outcome.label(), outcome.message);

        if self.verbosity == Verbosity::Verbose
            && !outcome.success
            && let Some(detail) = &outcome.detail
        {
            line.push_str(&format!("\n     {}", detail.to_string().dimmed()));
        }
        line
    }
}

fn category_header(category: Category) -> String {
    format!("🔸 {}", category.to_string().to_uppercase())
}

fn format_skipped(skipped: &SkippedStep) -> String {
    format!(
        "  {} {}",
        "⏭️".dimmed(),
        format!(
            "{}.{} ({})",
            skipped.category.key(),
            skipped.name,
            skipped.reason
        )
        .dimmed()
    )
}

/// Creates a progress callback for use with the run controller.
pub fn create_progress_callback(verbosity: Verbosity) -> ProgressCallback {
    let reporter = Arc::new(Mutex::new(TerminalReporter::with_verbosity(verbosity)));

    Box::new(move |event| {
        if let Ok(mut r) = reporter.lock() {
            r.handle_progress(event);
        }
    })
}
