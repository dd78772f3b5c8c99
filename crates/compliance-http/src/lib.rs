// crates/compliance-http/src/lib.rs
// ============================================================================
// Module: Compliance HTTP Library
// Description: Request/response capture and JSON-schema assertions for checks.
// Purpose: Give checks one way to call the service under test and record it.
// Dependencies: compliance-core, jsonschema, reqwest
// ============================================================================

//! ## Overview
//! Checks call the service under test through [`HttpCapture`]. Each call
//! appends a [`compliance_core::NetworkCall`] to the check's result and maps
//! transport, status, and decoding problems onto the generic failure kinds.
//! [`assert_schema`] validates decoded documents against JSON schemas.
//!
//! Security posture: responses are untrusted; bodies are size-limited and
//! credentials never appear in captured records.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod capture;
pub mod schema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use capture::CaptureConfig;
pub use capture::CaptureError;
pub use capture::CaptureRequest;
pub use capture::HttpCapture;
pub use capture::RequestBody;
pub use capture::ResponseBody;
pub use schema::assert_schema;
