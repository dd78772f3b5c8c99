// crates/compliance-core/src/core/identifiers.rs
// ============================================================================
// Module: Compliance Identifiers
// Description: Canonical opaque identifiers for suites, tests, groups, and slots.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque strings that serialize transparently. Validation
//! (non-empty, unique within a suite) happens when an execution plan is built
//! rather than inside these wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Macro
// ============================================================================

/// Declares a transparent string identifier with the shared helper impls.
macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

string_identifier! {
    /// Suite identifier naming one protocol's complete check list.
    SuiteId
}

string_identifier! {
    /// Test identifier, unique within its suite.
    TestId
}

string_identifier! {
    /// Reporting group label (sub-category within a suite).
    GroupLabel
}

string_identifier! {
    /// Context slot name exchanged between a provider and its dependents.
    SlotName
}

string_identifier! {
    /// Identifier of a single suite run.
    SuiteRunId
}
