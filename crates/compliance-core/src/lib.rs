// crates/compliance-core/src/lib.rs
// ============================================================================
// Module: Compliance Core Library
// Description: Public API surface for the compliance harness core.
// Purpose: Expose test definitions, the dependency engine, and run sinks.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Compliance core models a conformance suite as a graph of tests. Each test
//! declares the tests it depends on and the named context slots it expects
//! and provides. The runtime validates the graph, executes checks in a
//! deterministic topological order, skips dependents of failed tests, and
//! streams every run to a [`RunSink`]. Network access and suite content live
//! in sibling crates.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::RunEvent;
pub use interfaces::RunSink;
pub use interfaces::SinkError;
pub use runtime::ChannelRunSink;
pub use runtime::ConfigurationError;
pub use runtime::ContextError;
pub use runtime::EngineAuditEvent;
pub use runtime::EngineAuditSink;
pub use runtime::EngineError;
pub use runtime::ExecutionPlan;
pub use runtime::FileAuditSink;
pub use runtime::GroupStats;
pub use runtime::GroupStatus;
pub use runtime::NoopAuditSink;
pub use runtime::StderrAuditSink;
pub use runtime::Stats;
pub use runtime::SuiteReport;
pub use runtime::SuiteRunner;
pub use runtime::VecRunSink;
pub use runtime::run_suites;
