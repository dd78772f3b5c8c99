// crates/compliance-core/src/runtime/audit.rs
// ============================================================================
// Module: Engine Audit Logging
// Description: Structured audit events for suite execution.
// Purpose: Emit JSON-line execution logs without hard logging dependencies.
// Dependencies: crate::core, serde, serde_json
// ============================================================================

//! ## Overview
//! The engine reports suite starts, per-test completions, and suite
//! completions to an [`EngineAuditSink`]. Events carry identifiers, statuses,
//! and failure kinds only; run configuration values and response bodies are
//! never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::TestRun;
use crate::runtime::stats::Stats;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Audit event payload for one stage of suite execution.
#[derive(Debug, Clone, Serialize)]
pub struct EngineAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Suite identifier.
    pub suite_id: String,
    /// Suite run identifier.
    pub run_id: String,
    /// Test identifier for per-test events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    /// Group label for per-test events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Outcome label for per-test events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    /// Failure kind for failed tests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<String>,
    /// Blocking dependency for skipped tests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<String>,
    /// Planned test count for suite start events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned: Option<usize>,
    /// Final statistics for suite completion events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
}

impl EngineAuditEvent {
    /// Creates a bare event with a consistent timestamp.
    fn base(event: &'static str, suite_id: &str, run_id: &str) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            suite_id: suite_id.to_string(),
            run_id: run_id.to_string(),
            test_id: None,
            group: None,
            status: None,
            failure_kind: None,
            blocked_by: None,
            planned: None,
            stats: None,
        }
    }

    /// Builds a `suite_started` event.
    #[must_use]
    pub fn suite_started(suite_id: &str, run_id: &str, planned: usize) -> Self {
        Self {
            planned: Some(planned),
            ..Self::base("suite_started", suite_id, run_id)
        }
    }

    /// Builds a `test_completed` event from a final run.
    #[must_use]
    pub fn test_completed(run: &TestRun) -> Self {
        let blocked_by = match &run.outcome {
            crate::core::Outcome::Skipped {
                blocked_by,
            } => Some(blocked_by.to_string()),
            _ => None,
        };
        Self {
            test_id: Some(run.test_id.to_string()),
            group: Some(run.group.to_string()),
            status: Some(run.outcome.label()),
            failure_kind: run.outcome.failure().map(|failure| failure.kind.clone()),
            blocked_by,
            ..Self::base("test_completed", run.suite_id.as_str(), run.run_id.as_str())
        }
    }

    /// Builds a `suite_finished` event.
    #[must_use]
    pub fn suite_finished(suite_id: &str, run_id: &str, stats: &Stats) -> Self {
        Self {
            stats: Some(stats.clone()),
            ..Self::base("suite_finished", suite_id, run_id)
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for engine events.
pub trait EngineAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &EngineAuditEvent);
}

/// Audit sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl EngineAuditSink for NoopAuditSink {
    fn record(&self, _event: &EngineAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrAuditSink;

impl EngineAuditSink for StderrAuditSink {
    fn record(&self, event: &EngineAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl EngineAuditSink for FileAuditSink {
    fn record(&self, event: &EngineAuditEvent) {
        let Ok(payload) = serde_json::to_string(event) else {
            return;
        };
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
        }
    }
}
