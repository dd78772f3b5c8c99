// crates/compliance-core/src/core/run.rs
// ============================================================================
// Module: Test Runs
// Description: Records of executed or skipped test definitions.
// Purpose: Bind a definition to its outcome for streaming to reporters.
// Dependencies: crate::core::{identifiers, result}, serde
// ============================================================================

//! ## Overview
//! [`Outcome`] is an exhaustive three-state result: passed, failed, or
//! skipped because an upstream dependency did not pass. A [`TestRun`] is only
//! emitted once its outcome is final; partial runs never leave the engine.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::failure::Failure;
use crate::core::identifiers::GroupLabel;
use crate::core::identifiers::SuiteId;
use crate::core::identifiers::SuiteRunId;
use crate::core::identifiers::TestId;
use crate::core::result::TestResult;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Final state of one test definition within a suite run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The check ran and reported no failure.
    Passed {
        /// Check result.
        result: TestResult,
    },
    /// The check ran and reported a failure.
    Failed {
        /// Check result (always carries a failure).
        result: TestResult,
    },
    /// The check was not invoked because a direct dependency did not pass.
    Skipped {
        /// First direct dependency, in declaration order, that did not pass.
        blocked_by: TestId,
    },
}

impl Outcome {
    /// Classifies a completed result.
    #[must_use]
    pub fn from_result(result: TestResult) -> Self {
        if result.is_success() {
            Self::Passed {
                result,
            }
        } else {
            Self::Failed {
                result,
            }
        }
    }

    /// Returns a stable status label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed {
                ..
            } => "passed",
            Self::Failed {
                ..
            } => "failed",
            Self::Skipped {
                ..
            } => "skipped",
        }
    }

    /// Returns true for a passed outcome.
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }

    /// Returns true for a failed outcome.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Returns true for a skipped outcome.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// Returns the check result for executed outcomes.
    #[must_use]
    pub const fn result(&self) -> Option<&TestResult> {
        match self {
            Self::Passed {
                result,
            }
            | Self::Failed {
                result,
            } => Some(result),
            Self::Skipped {
                ..
            } => None,
        }
    }

    /// Returns the failure for failed outcomes.
    #[must_use]
    pub fn failure(&self) -> Option<&Failure> {
        self.result().and_then(|result| result.failure.as_ref())
    }
}

// ============================================================================
// SECTION: Test Run
// ============================================================================

/// Record of one test definition within a suite run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRun {
    /// Suite identifier.
    pub suite_id: SuiteId,
    /// Suite run identifier.
    pub run_id: SuiteRunId,
    /// Test identifier.
    pub test_id: TestId,
    /// Assertion text.
    pub assertion: String,
    /// Reporting group.
    pub group: GroupLabel,
    /// Final outcome.
    pub outcome: Outcome,
}
