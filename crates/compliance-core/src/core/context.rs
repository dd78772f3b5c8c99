// crates/compliance-core/src/core/context.rs
// ============================================================================
// Module: Context Values
// Description: Slot-keyed value bags exchanged between tests.
// Purpose: Carry provided values from a dependency into a dependent's check.
// Dependencies: crate::core::identifiers, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`ContextValues`] bag maps slot names to JSON values. Checks return one
//! for their declared provides slots and receive one holding their resolved
//! expects slots. Iteration order is the slot name order so bags compare and
//! serialize deterministically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::identifiers::SlotName;

// ============================================================================
// SECTION: Context Values
// ============================================================================

/// Ordered bag of slot values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextValues(BTreeMap<SlotName, Value>);

impl ContextValues {
    /// Creates an empty value bag.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Inserts a slot value, replacing any previous value.
    pub fn insert(&mut self, slot: impl Into<SlotName>, value: Value) {
        self.0.insert(slot.into(), value);
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, slot: impl Into<SlotName>, value: Value) -> Self {
        self.insert(slot, value);
        self
    }

    /// Returns the raw value for a slot.
    #[must_use]
    pub fn get(&self, slot: &str) -> Option<&Value> {
        self.0.get(&SlotName::new(slot))
    }

    /// Returns a slot value as a string slice when it holds a JSON string.
    #[must_use]
    pub fn get_str(&self, slot: &str) -> Option<&str> {
        self.get(slot).and_then(Value::as_str)
    }

    /// Decodes a slot value into a typed record.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when the slot is missing or does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self, slot: &str) -> Result<T, serde_json::Error> {
        let value = self.get(slot).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value)
    }

    /// Returns true when the slot is present.
    #[must_use]
    pub fn contains(&self, slot: &SlotName) -> bool {
        self.0.contains_key(slot)
    }

    /// Iterates slot names in order.
    pub fn slots(&self) -> impl Iterator<Item = &SlotName> {
        self.0.keys()
    }

    /// Iterates slot/value pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&SlotName, &Value)> {
        self.0.iter()
    }

    /// Returns the number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no slots are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
