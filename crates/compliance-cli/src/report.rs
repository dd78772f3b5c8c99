// crates/compliance-cli/src/report.rs
// ============================================================================
// Module: Run Reporter
// Description: Text and JSON-lines rendering of suite output streams.
// Purpose: Print every test run as it arrives and a summary per suite.
// Dependencies: compliance-core, serde_json
// ============================================================================

//! ## Overview
//! The reporter consumes [`RunEvent`]s in arrival order. Text output prints
//! one line per run (plus the failure message for failed runs) and a summary
//! line per suite. JSON output writes each event as one JSON object per line.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;

use compliance_core::Outcome;
use compliance_core::RunEvent;
use compliance_core::Stats;
use compliance_core::SuiteId;
use compliance_core::TestRun;

// ============================================================================
// SECTION: Reporter
// ============================================================================

/// Output format for run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Streaming reporter over any writer.
#[derive(Debug)]
pub struct Reporter<W> {
    /// Destination writer.
    out: W,
    /// Selected format.
    format: ReportFormat,
}

impl<W: Write> Reporter<W> {
    /// Creates a reporter writing to `out`.
    pub const fn new(out: W, format: ReportFormat) -> Self {
        Self {
            out,
            format,
        }
    }

    /// Writes one event.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the writer fails or the event cannot be encoded.
    pub fn event(&mut self, event: &RunEvent) -> io::Result<()> {
        match self.format {
            ReportFormat::Json => {
                let line = serde_json::to_string(event).map_err(io::Error::other)?;
                writeln!(self.out, "{line}")
            }
            ReportFormat::Text => match event {
                RunEvent::Run(run) => writeln!(self.out, "{}", render_run(run)),
                RunEvent::Finished {
                    suite_id,
                    stats,
                } => writeln!(self.out, "{}", render_stats(suite_id, stats)),
            },
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

// ============================================================================
// SECTION: Text Rendering
// ============================================================================

/// Renders one run as text.
#[must_use]
pub fn render_run(run: &TestRun) -> String {
    let head = format!("[{}] {} ({})", run.outcome.label(), run.test_id, run.group);
    match &run.outcome {
        Outcome::Passed {
            ..
        } => format!("{head} {}", run.assertion),
        Outcome::Failed {
            result,
        } => {
            let mut text = format!("{head} {}", run.assertion);
            if let Some(failure) = &result.failure {
                text.push_str(&format!("\n    {}: {}", failure.kind, failure.message));
            }
            text
        }
        Outcome::Skipped {
            blocked_by,
        } => format!("{head} blocked by {blocked_by}"),
    }
}

/// Renders the summary line for one suite.
#[must_use]
pub fn render_stats(suite_id: &SuiteId, stats: &Stats) -> String {
    format!(
        "suite {suite_id}: {} passed, {} failed, {} skipped ({} executed); groups: {} passed, {} \
         failed",
        stats.passed,
        stats.failed,
        stats.skipped,
        stats.total,
        stats.groups_passed(),
        stats.groups_failed(),
    )
}
