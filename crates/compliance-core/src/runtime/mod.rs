// crates/compliance-core/src/runtime/mod.rs
// ============================================================================
// Module: Compliance Runtime
// Description: Graph validation, execution engine, sinks, and statistics.
// Purpose: Execute suites deterministically and report their runs.
// Dependencies: crate::{core, interfaces}, tokio
// ============================================================================

//! ## Overview
//! Runtime modules validate a suite into an execution plan, run its checks in
//! dependency order with per-run context, and reduce the emitted runs into
//! statistics. Every front end drives suites through [`SuiteRunner`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod context;
pub mod engine;
pub mod graph;
pub mod sinks;
pub mod stats;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::EngineAuditEvent;
pub use audit::EngineAuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use context::ContextError;
pub use context::ContextStore;
pub use engine::EngineError;
pub use engine::SuiteReport;
pub use engine::SuiteRunner;
pub use engine::run_suites;
pub use graph::ConfigurationError;
pub use graph::ExecutionPlan;
pub use graph::SlotBinding;
pub use sinks::ChannelRunSink;
pub use sinks::VecRunSink;
pub use stats::GroupStats;
pub use stats::GroupStatus;
pub use stats::Stats;
