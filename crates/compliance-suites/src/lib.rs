// crates/compliance-suites/src/lib.rs
// ============================================================================
// Module: Compliance Suites Library
// Description: Registered conformance suites and default discovery.
// Purpose: Export every suite's complete, ordered check list.
// Dependencies: compliance-core, compliance-http
// ============================================================================

//! ## Overview
//! Each suite module declares its test definitions statically, in order, and
//! its own failure-kind enum. The [`registry`] is the engine's sole
//! description of what to verify.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod registry;
pub mod service;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use registry::registry;
pub use registry::suite_by_id;
pub use registry::suite_ids;
pub use service::DiscoveryError;
pub use service::ServiceFailure;
pub use service::discover_defaults;
