// crates/compliance-core/src/core/result.rs
// ============================================================================
// Module: Check Results
// Description: Outcome of one check invocation plus captured network calls.
// Purpose: Hold an optional failure and diagnostic request/response records.
// Dependencies: crate::core::failure, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`TestResult`] holds at most one [`Failure`] and the ordered list of
//! [`NetworkCall`] records captured while the check ran. Network calls are
//! diagnostics only: response bodies are captured once by the request helper
//! and never re-read from the wire.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::failure::Failure;
use crate::core::failure::FailureKind;

// ============================================================================
// SECTION: Network Records
// ============================================================================

/// Outbound request summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// HTTP method.
    pub method: String,
    /// Absolute request URL.
    pub url: String,
    /// Request content type when a body was sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Captured response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CapturedBody {
    /// Decoded JSON body.
    Json(Value),
    /// Text body.
    Text(String),
    /// Body was not captured (for example, oversized or binary).
    Omitted,
}

/// Inbound response summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// HTTP status code.
    pub status: u16,
    /// Response content type when provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Captured body.
    pub body: CapturedBody,
}

/// One request/response exchange captured for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkCall {
    /// Request summary.
    pub request: RequestRecord,
    /// Response summary, absent when the request never completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseRecord>,
}

// ============================================================================
// SECTION: Test Result
// ============================================================================

/// Result produced by one check invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Failure when the check determined a violation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    /// Captured network calls in issue order.
    #[serde(default)]
    pub network_calls: Vec<NetworkCall>,
}

impl TestResult {
    /// Creates an empty (passing) result.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            failure: None,
            network_calls: Vec::new(),
        }
    }

    /// Creates a result holding a single failure.
    #[must_use]
    pub const fn failed(failure: Failure) -> Self {
        Self {
            failure: Some(failure),
            network_calls: Vec::new(),
        }
    }

    /// Records a failure unless one is already present.
    ///
    /// The first failure wins because later failures are usually consequences of it.
    pub fn fail(&mut self, failure: Failure) {
        if self.failure.is_none() {
            self.failure = Some(failure);
        }
    }

    /// Records a failure rendered from a typed kind.
    pub fn fail_with<K: FailureKind + ?Sized>(&mut self, kind: &K) {
        self.fail(Failure::from_kind(kind));
    }

    /// Appends a captured network call.
    pub fn push_call(&mut self, call: NetworkCall) {
        self.network_calls.push(call);
    }

    /// Returns true when no failure was recorded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}
