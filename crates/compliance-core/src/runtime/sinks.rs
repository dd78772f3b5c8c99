// crates/compliance-core/src/runtime/sinks.rs
// ============================================================================
// Module: Run Sinks
// Description: Buffering and channel-backed run sink implementations.
// Purpose: Deliver streamed test runs to tests and concurrent reporters.
// Dependencies: crate::{core, interfaces}, tokio
// ============================================================================

//! ## Overview
//! [`VecRunSink`] buffers events in memory for tests and post-run reporting.
//! [`ChannelRunSink`] forwards events over an unbounded `tokio` channel so a
//! reporter task can render runs while the suite is still executing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tokio::sync::mpsc;

use crate::core::SuiteId;
use crate::core::TestRun;
use crate::interfaces::RunEvent;
use crate::interfaces::RunSink;
use crate::interfaces::SinkError;
use crate::runtime::stats::Stats;

// ============================================================================
// SECTION: Buffering Sink
// ============================================================================

/// Sink that keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct VecRunSink {
    /// Recorded runs in emission order.
    runs: Vec<TestRun>,
    /// Final stats, once delivered.
    stats: Option<Stats>,
}

impl VecRunSink {
    /// Creates an empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            runs: Vec::new(),
            stats: None,
        }
    }

    /// Returns recorded runs in emission order.
    #[must_use]
    pub fn runs(&self) -> &[TestRun] {
        &self.runs
    }

    /// Returns the final stats, if delivered.
    #[must_use]
    pub const fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }

    /// Consumes the sink, returning runs and stats.
    #[must_use]
    pub fn into_parts(self) -> (Vec<TestRun>, Option<Stats>) {
        (self.runs, self.stats)
    }
}

impl RunSink for VecRunSink {
    fn record(&mut self, run: &TestRun) -> Result<(), SinkError> {
        self.runs.push(run.clone());
        Ok(())
    }

    fn finish(&mut self, _suite_id: &SuiteId, stats: &Stats) -> Result<(), SinkError> {
        self.stats = Some(stats.clone());
        Ok(())
    }
}

// ============================================================================
// SECTION: Channel Sink
// ============================================================================

/// Sink that forwards events over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelRunSink {
    /// Sending half of the event channel.
    sender: mpsc::UnboundedSender<RunEvent>,
}

impl ChannelRunSink {
    /// Creates a sink and the receiver that observes its events.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RunEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
            },
            receiver,
        )
    }

    /// Wraps an existing sender, allowing several suites to share one receiver.
    #[must_use]
    pub const fn from_sender(sender: mpsc::UnboundedSender<RunEvent>) -> Self {
        Self {
            sender,
        }
    }
}

impl RunSink for ChannelRunSink {
    fn record(&mut self, run: &TestRun) -> Result<(), SinkError> {
        self.sender.send(RunEvent::Run(run.clone())).map_err(|_| SinkError::Closed)
    }

    fn finish(&mut self, suite_id: &SuiteId, stats: &Stats) -> Result<(), SinkError> {
        self.sender
            .send(RunEvent::Finished {
                suite_id: suite_id.clone(),
                stats: stats.clone(),
            })
            .map_err(|_| SinkError::Closed)
    }
}
