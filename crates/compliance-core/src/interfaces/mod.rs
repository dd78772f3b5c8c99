// crates/compliance-core/src/interfaces/mod.rs
// ============================================================================
// Module: Compliance Interfaces
// Description: Output contracts between the engine and its consumers.
// Purpose: Define how test runs and final stats leave the engine.
// Dependencies: crate::{core, runtime::stats}
// ============================================================================

//! ## Overview
//! The engine streams every [`TestRun`] to a [`RunSink`] as soon as it is
//! final, then hands over the suite's [`Stats`]. Reporters implement this
//! trait without knowing anything about scheduling or context wiring.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

use crate::core::SuiteId;
use crate::core::TestRun;
use crate::runtime::stats::Stats;

// ============================================================================
// SECTION: Run Events
// ============================================================================

/// Item of a suite's output stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// One final test run.
    Run(TestRun),
    /// Final statistics; always the last event of a suite.
    Finished {
        /// Suite identifier.
        suite_id: SuiteId,
        /// Aggregated statistics.
        stats: Stats,
    },
}

// ============================================================================
// SECTION: Run Sink
// ============================================================================

/// Run sink errors.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The consumer side of the stream is gone.
    #[error("run sink closed")]
    Closed,
    /// The sink failed to write.
    #[error("run sink error: {0}")]
    Write(String),
}

/// Consumer of a suite's output stream.
pub trait RunSink: Send {
    /// Receives one final test run.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the run cannot be delivered; the engine aborts the suite.
    fn record(&mut self, run: &TestRun) -> Result<(), SinkError>;

    /// Receives the suite's final statistics.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the stats cannot be delivered.
    fn finish(&mut self, suite_id: &SuiteId, stats: &Stats) -> Result<(), SinkError>;
}
