// crates/compliance-core/src/runtime/context.rs
// ============================================================================
// Module: Context Store
// Description: Per-run storage of values provided by completed tests.
// Purpose: Resolve a dependent's expects slots from its providers' outputs.
// Dependencies: crate::core, crate::runtime::graph
// ============================================================================

//! ## Overview
//! A [`ContextStore`] is created empty for every suite run and dropped with
//! it, so values never leak between repeated or concurrent runs of the same
//! suite. Resolution follows the bindings fixed by the execution plan.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::ContextValues;
use crate::core::Suite;
use crate::core::SuiteRunId;
use crate::core::TestId;
use crate::runtime::graph::SlotBinding;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Context resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// A bound provider has no recorded value for the slot.
    #[error("run {run_id}: slot {slot} has no value recorded by {provider}")]
    MissingValue {
        /// Suite run identifier.
        run_id: String,
        /// Providing test.
        provider: String,
        /// Slot name.
        slot: String,
    },
}

// ============================================================================
// SECTION: Context Store
// ============================================================================

/// Values recorded by completed tests within one suite run.
#[derive(Debug, Clone)]
pub struct ContextStore {
    /// Owning suite run.
    run_id: SuiteRunId,
    /// Provided values keyed by providing test.
    entries: BTreeMap<TestId, ContextValues>,
}

impl ContextStore {
    /// Creates an empty store for a suite run.
    #[must_use]
    pub const fn new(run_id: SuiteRunId) -> Self {
        Self {
            run_id,
            entries: BTreeMap::new(),
        }
    }

    /// Records the values provided by a test.
    pub fn record(&mut self, test_id: TestId, values: ContextValues) {
        self.entries.insert(test_id, values);
    }

    /// Resolves bound expects slots into a value bag.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::MissingValue`] when a provider did not record a bound slot.
    pub fn resolve(
        &self,
        suite: &Suite,
        bindings: &[SlotBinding],
    ) -> Result<ContextValues, ContextError> {
        let mut resolved = ContextValues::new();
        for binding in bindings {
            let provider = suite.tests().get(binding.provider).map(|test| test.id());
            let value = provider
                .and_then(|id| self.entries.get(id))
                .and_then(|values| values.get(binding.slot.as_str()));
            let Some(value) = value else {
                return Err(ContextError::MissingValue {
                    run_id: self.run_id.to_string(),
                    provider: provider.map(ToString::to_string).unwrap_or_default(),
                    slot: binding.slot.to_string(),
                });
            };
            resolved.insert(binding.slot.clone(), value.clone());
        }
        Ok(resolved)
    }
}
