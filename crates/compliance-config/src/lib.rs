// crates/compliance-config/src/lib.rs
// ============================================================================
// Module: Compliance Config Library
// Description: Canonical harness configuration model and validation.
// Purpose: Single source of truth for compliance-harness.toml semantics.
// Dependencies: compliance-core, compliance-http, serde, toml, url
// ============================================================================

//! ## Overview
//! `compliance-config` loads the harness configuration from TOML, validates
//! it fail-closed, and converts it into the core [`compliance_core::RunConfig`]
//! and the HTTP [`compliance_http::CaptureConfig`].
//!
//! Security posture: config inputs are untrusted and may carry credentials;
//! credentials are redacted from `Debug` output.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
