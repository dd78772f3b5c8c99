// crates/compliance-core/src/core/failure.rs
// ============================================================================
// Module: Failure Catalog
// Description: Typed failure kinds, catalogs, and rendered failure records.
// Purpose: Give every verification failure a named, catalog-registered kind.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Each suite declares an enum implementing [`FailureKind`]. Variants carry a
//! typed argument record and render their own message. The generic kinds in
//! [`GenericFailure`] are merged into every test definition's
//! [`FailureCatalog`], so a check can always fall back to them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Failure Kind Contract
// ============================================================================

/// Catalog entry describing one failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FailureKindInfo {
    /// Stable kind name.
    pub name: &'static str,
    /// One-line summary for reporters.
    pub summary: &'static str,
}

/// Named category of verification failure.
pub trait FailureKind {
    /// Returns the full catalog of kinds declared by this type.
    fn catalog() -> &'static [FailureKindInfo]
    where
        Self: Sized;

    /// Returns the stable kind name of this value.
    fn name(&self) -> &'static str;

    /// Renders the human-readable message from the typed arguments.
    fn render(&self) -> String;

    /// Optional expected payload for diagnostic rendering.
    fn expected(&self) -> Option<Value> {
        None
    }

    /// Optional actual payload for diagnostic rendering.
    fn actual(&self) -> Option<Value> {
        None
    }
}

// ============================================================================
// SECTION: Generic Failures
// ============================================================================

/// Kind name used when a check errors outside its declared vocabulary.
pub const UNEXPECTED_ERROR: &str = "unexpected_error";
/// Kind name used when a check breaks its context contract.
pub const CONTRACT_VIOLATION: &str = "contract_violation";

/// Generic failure kinds shared by every test definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericFailure {
    /// The server could not be reached.
    ConnectionRefused {
        /// Request URL.
        url: String,
        /// Transport error description.
        reason: String,
    },
    /// The server answered with a different status code.
    UnexpectedStatus {
        /// Request URL.
        url: String,
        /// Expected status code.
        expected: u16,
        /// Observed status code.
        actual: u16,
    },
    /// The response body could not be decoded.
    MalformedBody {
        /// Request URL.
        url: String,
        /// Decoding error description.
        reason: String,
    },
    /// A JSON document did not match its schema.
    SchemaMismatch {
        /// Validator messages.
        errors: Vec<String>,
    },
    /// The check failed in a way it did not anticipate.
    UnexpectedError {
        /// Error description.
        message: String,
    },
    /// The check did not honor its declared provides slots.
    ContractViolation {
        /// Violation description.
        message: String,
    },
}

/// Catalog for [`GenericFailure`].
const GENERIC_CATALOG: &[FailureKindInfo] = &[
    FailureKindInfo {
        name: "connection_refused",
        summary: "server could not be reached",
    },
    FailureKindInfo {
        name: "unexpected_status",
        summary: "response status differs from the expected status",
    },
    FailureKindInfo {
        name: "malformed_body",
        summary: "response body could not be decoded",
    },
    FailureKindInfo {
        name: "schema_mismatch",
        summary: "document does not match its JSON schema",
    },
    FailureKindInfo {
        name: UNEXPECTED_ERROR,
        summary: "check raised an unexpected error",
    },
    FailureKindInfo {
        name: CONTRACT_VIOLATION,
        summary: "check did not provide its declared context slots",
    },
];

impl FailureKind for GenericFailure {
    fn catalog() -> &'static [FailureKindInfo] {
        GENERIC_CATALOG
    }

    fn name(&self) -> &'static str {
        match self {
            Self::ConnectionRefused {
                ..
            } => "connection_refused",
            Self::UnexpectedStatus {
                ..
            } => "unexpected_status",
            Self::MalformedBody {
                ..
            } => "malformed_body",
            Self::SchemaMismatch {
                ..
            } => "schema_mismatch",
            Self::UnexpectedError {
                ..
            } => UNEXPECTED_ERROR,
            Self::ContractViolation {
                ..
            } => CONTRACT_VIOLATION,
        }
    }

    fn render(&self) -> String {
        match self {
            Self::ConnectionRefused {
                url,
                reason,
            } => format!("could not reach {url}: {reason}"),
            Self::UnexpectedStatus {
                url,
                expected,
                actual,
            } => format!("{url} answered with status {actual}, expected {expected}"),
            Self::MalformedBody {
                url,
                reason,
            } => format!("response body from {url} is malformed: {reason}"),
            Self::SchemaMismatch {
                errors,
            } => format!("schema validation failed: {}", errors.join("; ")),
            Self::UnexpectedError {
                message,
            } => format!("unexpected error: {message}"),
            Self::ContractViolation {
                message,
            } => format!("context contract violated: {message}"),
        }
    }

    fn expected(&self) -> Option<Value> {
        match self {
            Self::UnexpectedStatus {
                expected, ..
            } => Some(json!(expected)),
            _ => None,
        }
    }

    fn actual(&self) -> Option<Value> {
        match self {
            Self::UnexpectedStatus {
                actual, ..
            } => Some(json!(actual)),
            Self::SchemaMismatch {
                errors,
            } => Some(json!(errors)),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Failure Catalog
// ============================================================================

/// Set of failure kinds a test definition may report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FailureCatalog(Vec<FailureKindInfo>);

impl Default for FailureCatalog {
    fn default() -> Self {
        Self(GENERIC_CATALOG.to_vec())
    }
}

impl FailureCatalog {
    /// Creates a catalog seeded with the generic kinds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges the catalog of a failure kind type, skipping known names.
    pub fn merge<K: FailureKind>(&mut self) {
        for info in K::catalog() {
            if !self.contains(info.name) {
                self.0.push(*info);
            }
        }
    }

    /// Returns true when the catalog declares the kind name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|info| info.name == name)
    }

    /// Returns the catalog entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[FailureKindInfo] {
        &self.0
    }
}

// ============================================================================
// SECTION: Failure Records
// ============================================================================

/// Rendered failure produced by a check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    /// Failure kind name.
    pub kind: String,
    /// Rendered message.
    pub message: String,
    /// Optional expected payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    /// Optional actual payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
}

impl Failure {
    /// Renders a failure from a typed kind.
    #[must_use]
    pub fn from_kind<K: FailureKind + ?Sized>(kind: &K) -> Self {
        Self {
            kind: kind.name().to_string(),
            message: kind.render(),
            expected: kind.expected(),
            actual: kind.actual(),
        }
    }

    /// Builds the generic unexpected-error failure.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::from_kind(&GenericFailure::UnexpectedError {
            message: message.into(),
        })
    }

    /// Builds the generic contract-violation failure.
    #[must_use]
    pub fn contract_violation(message: impl Into<String>) -> Self {
        Self::from_kind(&GenericFailure::ContractViolation {
            message: message.into(),
        })
    }

    /// Overrides the expected payload.
    #[must_use]
    pub fn with_expected(mut self, expected: Value) -> Self {
        self.expected = Some(expected);
        self
    }

    /// Overrides the actual payload.
    #[must_use]
    pub fn with_actual(mut self, actual: Value) -> Self {
        self.actual = Some(actual);
        self
    }
}
