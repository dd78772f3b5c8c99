// crates/compliance-suites/src/registry.rs
// ============================================================================
// Module: Suite Registry
// Description: Lookup of registered suites by identifier.
// Purpose: Give front ends one ordered list of available suites.
// Dependencies: compliance-core, compliance-http
// ============================================================================

//! ## Overview
//! The registry is the single list front ends consult: [`suite_ids`] names
//! every suite without building it, and [`suite_by_id`] builds one suite
//! bound to a shared [`HttpCapture`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use compliance_core::Suite;
use compliance_http::HttpCapture;

use crate::service;

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Identifiers of every registered suite, in registration order.
#[must_use]
pub const fn suite_ids() -> &'static [&'static str] {
    &[service::SUITE_ID]
}

/// Builds every registered suite, sharing one capture client.
#[must_use]
pub fn registry(capture: &Arc<HttpCapture>) -> Vec<Suite> {
    vec![service::suite(capture)]
}

/// Builds one registered suite by identifier.
#[must_use]
pub fn suite_by_id(suite_id: &str, capture: &Arc<HttpCapture>) -> Option<Suite> {
    match suite_id {
        service::SUITE_ID => Some(service::suite(capture)),
        _ => None,
    }
}
