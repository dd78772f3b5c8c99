// crates/compliance-core/src/core/suite.rs
// ============================================================================
// Module: Suites
// Description: Ordered collections of test definitions for one protocol.
// Purpose: Provide the registration surface consumed by the graph builder.
// Dependencies: crate::core::{definition, identifiers}, crate::runtime::graph
// ============================================================================

//! ## Overview
//! A [`Suite`] owns its definitions in declaration order. Declaration order
//! is the tie-breaker for independent tests when the execution plan is built,
//! so reports stay stable across runs of the same suite version.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::definition::TestDefinition;
use crate::core::identifiers::SuiteId;
use crate::runtime::graph::ConfigurationError;
use crate::runtime::graph::ExecutionPlan;

// ============================================================================
// SECTION: Suite
// ============================================================================

/// Complete, ordered check list for one protocol.
#[derive(Debug, Clone)]
pub struct Suite {
    /// Suite identifier.
    suite_id: SuiteId,
    /// Test definitions in declaration order.
    tests: Vec<TestDefinition>,
}

impl Suite {
    /// Creates a suite from definitions in declaration order.
    #[must_use]
    pub fn new(suite_id: impl Into<SuiteId>, tests: Vec<TestDefinition>) -> Self {
        Self {
            suite_id: suite_id.into(),
            tests,
        }
    }

    /// Returns the suite identifier.
    #[must_use]
    pub const fn suite_id(&self) -> &SuiteId {
        &self.suite_id
    }

    /// Returns definitions in declaration order.
    #[must_use]
    pub fn tests(&self) -> &[TestDefinition] {
        &self.tests
    }

    /// Validates the dependency graph and computes the execution plan.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when the graph is malformed.
    pub fn plan(&self) -> Result<ExecutionPlan, ConfigurationError> {
        ExecutionPlan::build(self)
    }

    /// Returns the number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns true when the suite declares no tests.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}
