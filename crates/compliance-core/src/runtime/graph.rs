// crates/compliance-core/src/runtime/graph.rs
// ============================================================================
// Module: Dependency Graph Builder
// Description: Validates suite dependencies and computes execution order.
// Purpose: Turn a flat suite into a deterministic, validated execution plan.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! [`ExecutionPlan::build`] checks that a suite's dependency references form
//! a DAG and that every expects slot is provided by exactly one test among the
//! requester's transitive dependencies. It then computes a topological order
//! with Kahn's algorithm, always releasing the ready test with the lowest
//! declaration index, so independent tests keep their declaration order.
//! Slot wiring (slot name to providing test) is fixed here, once, so the
//! engine never searches by name at run time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::Suite;
use crate::core::identifiers::SlotName;
use crate::core::identifiers::TestId;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Suite configuration errors detected before any test runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// An identifier is empty or whitespace.
    #[error("invalid {kind} identifier: '{value}'")]
    InvalidIdentifier {
        /// Identifier kind (suite or test).
        kind: &'static str,
        /// Offending value.
        value: String,
    },
    /// Two definitions share a test identifier.
    #[error("duplicate test identifier: {0}")]
    DuplicateTest(String),
    /// A dependency names a test that is not in the suite.
    #[error("test {test} depends on unknown test {dependency}")]
    UnknownDependency {
        /// Declaring test.
        test: String,
        /// Missing dependency.
        dependency: String,
    },
    /// Dependencies form a cycle.
    #[error("dependency cycle through test {test}: {}", .path.join(" -> "))]
    Cycle {
        /// A test on the cycle.
        test: String,
        /// Cycle path, starting and ending at `test`.
        path: Vec<String>,
    },
    /// Two definitions provide the same slot.
    #[error("slot {slot} is provided by both {first} and {second}")]
    DuplicateProvidedSlot {
        /// Slot name.
        slot: String,
        /// First provider in declaration order.
        first: String,
        /// Second provider in declaration order.
        second: String,
    },
    /// No definition provides an expected slot.
    #[error("test {test} expects slot {slot} but no test provides it")]
    UnsatisfiedSlot {
        /// Requesting test.
        test: String,
        /// Slot name.
        slot: String,
    },
    /// The provider of an expected slot is not a transitive dependency.
    #[error("test {test} expects slot {slot} from {provider}, which is not among its dependencies")]
    UnreachableSlot {
        /// Requesting test.
        test: String,
        /// Slot name.
        slot: String,
        /// Providing test.
        provider: String,
    },
}

// ============================================================================
// SECTION: Execution Plan
// ============================================================================

/// Resolved wiring of one expects slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotBinding {
    /// Slot name.
    pub slot: SlotName,
    /// Declaration index of the providing test.
    pub provider: usize,
}

/// Validated execution plan for one suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Declaration indices in execution order.
    order: Vec<usize>,
    /// Direct dependency indices per test, in declaration order.
    dependencies: Vec<Vec<usize>>,
    /// Slot bindings per test, in expects order.
    bindings: Vec<Vec<SlotBinding>>,
}

impl ExecutionPlan {
    /// Validates a suite and computes its execution plan.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] naming the offending test(s) when the
    /// suite has invalid identifiers, unknown or cyclic dependencies, or
    /// unsatisfiable context slots.
    pub fn build(suite: &Suite) -> Result<Self, ConfigurationError> {
        ensure_identifiers(suite)?;
        let index = index_tests(suite)?;
        let dependencies = resolve_dependencies(suite, &index)?;
        ensure_acyclic(suite, &dependencies)?;
        let order = topological_order(suite, &dependencies)?;
        let bindings = bind_slots(suite, &dependencies, &order)?;
        Ok(Self {
            order,
            dependencies,
            bindings,
        })
    }

    /// Returns declaration indices in execution order.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Returns test identifiers in execution order.
    #[must_use]
    pub fn ordered_ids<'a>(&self, suite: &'a Suite) -> Vec<&'a TestId> {
        self.order.iter().filter_map(|index| suite.tests().get(*index)).map(|test| test.id()).collect()
    }

    /// Returns the direct dependency indices of a test.
    #[must_use]
    pub fn dependencies(&self, index: usize) -> &[usize] {
        self.dependencies.get(index).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the slot bindings of a test.
    #[must_use]
    pub fn bindings(&self, index: usize) -> &[SlotBinding] {
        self.bindings.get(index).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the number of planned tests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true when the plan is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// ============================================================================
// SECTION: Validation Helpers
// ============================================================================

/// Rejects empty suite and test identifiers.
fn ensure_identifiers(suite: &Suite) -> Result<(), ConfigurationError> {
    if suite.suite_id().as_str().trim().is_empty() {
        return Err(ConfigurationError::InvalidIdentifier {
            kind: "suite",
            value: suite.suite_id().to_string(),
        });
    }
    for test in suite.tests() {
        if test.id().as_str().trim().is_empty() {
            return Err(ConfigurationError::InvalidIdentifier {
                kind: "test",
                value: test.id().to_string(),
            });
        }
    }
    Ok(())
}

/// Maps test identifiers to declaration indices, rejecting duplicates.
fn index_tests(suite: &Suite) -> Result<BTreeMap<&TestId, usize>, ConfigurationError> {
    let mut index = BTreeMap::new();
    for (position, test) in suite.tests().iter().enumerate() {
        if index.insert(test.id(), position).is_some() {
            return Err(ConfigurationError::DuplicateTest(test.id().to_string()));
        }
    }
    Ok(index)
}

/// Resolves dependency references into declaration indices.
fn resolve_dependencies(
    suite: &Suite,
    index: &BTreeMap<&TestId, usize>,
) -> Result<Vec<Vec<usize>>, ConfigurationError> {
    let mut resolved = Vec::with_capacity(suite.len());
    for test in suite.tests() {
        let mut deps = Vec::with_capacity(test.dependencies().len());
        for dependency in test.dependencies() {
            let Some(position) = index.get(dependency) else {
                return Err(ConfigurationError::UnknownDependency {
                    test: test.id().to_string(),
                    dependency: dependency.to_string(),
                });
            };
            deps.push(*position);
        }
        resolved.push(deps);
    }
    Ok(resolved)
}

/// Depth-first traversal marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// Not yet reached.
    Unvisited,
    /// On the current traversal path.
    Visiting,
    /// Fully explored.
    Done,
}

/// Detects cycles with a depth-first traversal using visiting markers.
fn ensure_acyclic(suite: &Suite, dependencies: &[Vec<usize>]) -> Result<(), ConfigurationError> {
    let mut marks = vec![Mark::Unvisited; dependencies.len()];
    let mut path = Vec::new();
    for start in 0 .. dependencies.len() {
        if marks[start] == Mark::Unvisited {
            visit(start, dependencies, &mut marks, &mut path)
                .map_err(|cycle| cycle_error(suite, &cycle))?;
        }
    }
    Ok(())
}

/// Visits one node; returns the cycle path when a back edge is found.
fn visit(
    node: usize,
    dependencies: &[Vec<usize>],
    marks: &mut [Mark],
    path: &mut Vec<usize>,
) -> Result<(), Vec<usize>> {
    marks[node] = Mark::Visiting;
    path.push(node);
    for &next in &dependencies[node] {
        match marks[next] {
            Mark::Visiting => {
                let start = path.iter().position(|entry| *entry == next).unwrap_or(0);
                let mut cycle = path[start ..].to_vec();
                cycle.push(next);
                return Err(cycle);
            }
            Mark::Unvisited => visit(next, dependencies, marks, path)?,
            Mark::Done => {}
        }
    }
    path.pop();
    marks[node] = Mark::Done;
    Ok(())
}

/// Converts a cycle path of indices into a configuration error.
///
/// Traversal follows dependency edges, so the path is reversed to read in
/// execution direction (dependency before dependent).
fn cycle_error(suite: &Suite, cycle: &[usize]) -> ConfigurationError {
    let names: Vec<String> = cycle
        .iter()
        .rev()
        .filter_map(|index| suite.tests().get(*index))
        .map(|test| test.id().to_string())
        .collect();
    ConfigurationError::Cycle {
        test: names.first().cloned().unwrap_or_default(),
        path: names,
    }
}

/// Computes Kahn's order, releasing ready tests by lowest declaration index.
fn topological_order(
    suite: &Suite,
    dependencies: &[Vec<usize>],
) -> Result<Vec<usize>, ConfigurationError> {
    let count = dependencies.len();
    let mut remaining: Vec<usize> = dependencies.iter().map(Vec::len).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (node, deps) in dependencies.iter().enumerate() {
        for &dep in deps {
            dependents[dep].push(node);
        }
    }

    let mut ready: BTreeSet<usize> = (0 .. count).filter(|node| remaining[*node] == 0).collect();
    let mut order = Vec::with_capacity(count);
    while let Some(node) = ready.pop_first() {
        order.push(node);
        for &dependent in &dependents[node] {
            remaining[dependent] -= 1;
            if remaining[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() == count {
        return Ok(order);
    }
    // Unreachable after `ensure_acyclic`; report the first unplaced test.
    let stuck = (0 .. count).find(|node| remaining[*node] > 0).unwrap_or(0);
    let name = suite.tests().get(stuck).map(|test| test.id().to_string()).unwrap_or_default();
    Err(ConfigurationError::Cycle {
        test: name.clone(),
        path: vec![name],
    })
}

/// Wires each expects slot to its unique provider among transitive dependencies.
fn bind_slots(
    suite: &Suite,
    dependencies: &[Vec<usize>],
    order: &[usize],
) -> Result<Vec<Vec<SlotBinding>>, ConfigurationError> {
    let tests = suite.tests();

    let mut providers: BTreeMap<&SlotName, usize> = BTreeMap::new();
    for (position, test) in tests.iter().enumerate() {
        for slot in test.provides() {
            if let Some(first) = providers.insert(slot, position) {
                return Err(ConfigurationError::DuplicateProvidedSlot {
                    slot: slot.to_string(),
                    first: tests[first].id().to_string(),
                    second: test.id().to_string(),
                });
            }
        }
    }

    let mut ancestors: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); tests.len()];
    for &node in order {
        let mut reach = BTreeSet::new();
        for &dep in &dependencies[node] {
            reach.insert(dep);
            reach.extend(ancestors[dep].iter().copied());
        }
        ancestors[node] = reach;
    }

    let mut bindings = Vec::with_capacity(tests.len());
    for (position, test) in tests.iter().enumerate() {
        let mut wired = Vec::with_capacity(test.expects().len());
        for slot in test.expects() {
            let Some(&provider) = providers.get(slot) else {
                return Err(ConfigurationError::UnsatisfiedSlot {
                    test: test.id().to_string(),
                    slot: slot.to_string(),
                });
            };
            if !ancestors[position].contains(&provider) {
                return Err(ConfigurationError::UnreachableSlot {
                    test: test.id().to_string(),
                    slot: slot.to_string(),
                    provider: tests[provider].id().to_string(),
                });
            }
            wired.push(SlotBinding {
                slot: slot.clone(),
                provider,
            });
        }
        bindings.push(wired);
    }
    Ok(bindings)
}
