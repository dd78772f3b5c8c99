// crates/compliance-cli/src/lib.rs
// ============================================================================
// Module: Compliance Harness CLI Library
// Description: Shared helpers for the `compliance-harness` binary.
// Purpose: Expose the run reporter to the binary and its tests.
// Dependencies: compliance-core, serde_json
// ============================================================================

//! ## Overview
//! Library half of the CLI crate; the binary lives in `main.rs`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod report;
