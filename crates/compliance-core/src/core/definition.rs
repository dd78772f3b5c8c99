// crates/compliance-core/src/core/definition.rs
// ============================================================================
// Module: Test Definitions
// Description: Declarative compliance checks and their executable routines.
// Purpose: Describe one check: assertion, group, dependencies, context contract.
// Dependencies: crate::core::{config, context, failure, identifiers, result}, async-trait
// ============================================================================

//! ## Overview
//! A [`TestDefinition`] is built once at suite registration and never
//! mutated. It declares which tests it depends on, which context slots it
//! expects and provides, which failure kinds it may report, and the [`Check`]
//! that performs the verification. Per-run state never lives on the
//! definition; it flows through [`CheckInput`] and [`CheckOutput`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::config::RunConfig;
use crate::core::context::ContextValues;
use crate::core::failure::FailureCatalog;
use crate::core::failure::FailureKind;
use crate::core::identifiers::GroupLabel;
use crate::core::identifiers::SlotName;
use crate::core::identifiers::TestId;
use crate::core::result::TestResult;

// ============================================================================
// SECTION: Check Contract
// ============================================================================

/// Inputs handed to a check invocation.
#[derive(Debug, Clone)]
pub struct CheckInput {
    /// Shared run configuration.
    pub config: Arc<RunConfig>,
    /// Resolved expects slots.
    pub expects: ContextValues,
}

/// Output of a completed check invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckOutput {
    /// Verification result.
    pub result: TestResult,
    /// Values for the declared provides slots.
    pub provides: ContextValues,
}

impl CheckOutput {
    /// Wraps a result with no provided values.
    #[must_use]
    pub const fn from_result(result: TestResult) -> Self {
        Self {
            result,
            provides: ContextValues::new(),
        }
    }

    /// Wraps a result with provided values.
    #[must_use]
    pub const fn with_provides(result: TestResult, provides: ContextValues) -> Self {
        Self {
            result,
            provides,
        }
    }
}

/// Error raised by a check outside its failure vocabulary.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CheckError {
    /// Error description.
    message: String,
}

impl CheckError {
    /// Creates a check error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for CheckError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("json error: {err}"))
    }
}

/// Executable verification routine.
#[async_trait]
pub trait Check: Send + Sync {
    /// Runs the check against the shared configuration and resolved inputs.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError`] for failures outside the declared vocabulary;
    /// the engine converts them into an unexpected-error failure.
    async fn run(&self, input: CheckInput) -> Result<CheckOutput, CheckError>;
}

/// Check backed by an async closure.
pub struct FnCheck<F> {
    /// Closure invoked per run.
    func: F,
}

#[async_trait]
impl<F, Fut> Check for FnCheck<F>
where
    F: Fn(CheckInput) -> Fut + Send + Sync,
    Fut: Future<Output = Result<CheckOutput, CheckError>> + Send + 'static,
{
    async fn run(&self, input: CheckInput) -> Result<CheckOutput, CheckError> {
        (self.func)(input).await
    }
}

/// Adapts an async closure into a shareable [`Check`].
pub fn check_fn<F, Fut>(func: F) -> Arc<dyn Check>
where
    F: Fn(CheckInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<CheckOutput, CheckError>> + Send + 'static,
{
    Arc::new(FnCheck {
        func,
    })
}

// ============================================================================
// SECTION: Test Definition
// ============================================================================

/// Declarative compliance check.
#[derive(Clone)]
pub struct TestDefinition {
    /// Test identifier, unique within the suite.
    id: TestId,
    /// Assertion text shown in reports.
    assertion: String,
    /// Reporting group label.
    group: GroupLabel,
    /// Direct dependencies in declaration order.
    dependencies: Vec<TestId>,
    /// Slots this test reads.
    expects: Vec<SlotName>,
    /// Slots this test populates.
    provides: Vec<SlotName>,
    /// Failure kinds this test may report.
    failures: FailureCatalog,
    /// Executable check.
    check: Arc<dyn Check>,
}

impl TestDefinition {
    /// Starts a definition builder.
    #[must_use]
    pub fn builder(id: impl Into<TestId>, group: impl Into<GroupLabel>) -> TestDefinitionBuilder {
        TestDefinitionBuilder {
            id: id.into(),
            assertion: String::new(),
            group: group.into(),
            dependencies: Vec::new(),
            expects: Vec::new(),
            provides: Vec::new(),
            failures: FailureCatalog::new(),
        }
    }

    /// Returns the test identifier.
    #[must_use]
    pub const fn id(&self) -> &TestId {
        &self.id
    }

    /// Returns the assertion text.
    #[must_use]
    pub fn assertion(&self) -> &str {
        &self.assertion
    }

    /// Returns the reporting group.
    #[must_use]
    pub const fn group(&self) -> &GroupLabel {
        &self.group
    }

    /// Returns direct dependencies in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &[TestId] {
        &self.dependencies
    }

    /// Returns expected slot names.
    #[must_use]
    pub fn expects(&self) -> &[SlotName] {
        &self.expects
    }

    /// Returns provided slot names.
    #[must_use]
    pub fn provides(&self) -> &[SlotName] {
        &self.provides
    }

    /// Returns the failure catalog.
    #[must_use]
    pub const fn failures(&self) -> &FailureCatalog {
        &self.failures
    }

    /// Returns a shared handle to the check.
    #[must_use]
    pub fn check(&self) -> Arc<dyn Check> {
        Arc::clone(&self.check)
    }
}

impl fmt::Debug for TestDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDefinition")
            .field("id", &self.id)
            .field("group", &self.group)
            .field("dependencies", &self.dependencies)
            .field("expects", &self.expects)
            .field("provides", &self.provides)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder for [`TestDefinition`].
#[derive(Debug, Clone)]
pub struct TestDefinitionBuilder {
    /// Test identifier.
    id: TestId,
    /// Assertion text.
    assertion: String,
    /// Reporting group.
    group: GroupLabel,
    /// Direct dependencies.
    dependencies: Vec<TestId>,
    /// Expected slots.
    expects: Vec<SlotName>,
    /// Provided slots.
    provides: Vec<SlotName>,
    /// Failure catalog, seeded with generic kinds.
    failures: FailureCatalog,
}

impl TestDefinitionBuilder {
    /// Sets the assertion text.
    #[must_use]
    pub fn assertion(mut self, assertion: impl Into<String>) -> Self {
        self.assertion = assertion.into();
        self
    }

    /// Adds a direct dependency.
    #[must_use]
    pub fn depends_on(mut self, dependency: impl Into<TestId>) -> Self {
        let dependency = dependency.into();
        if !self.dependencies.contains(&dependency) {
            self.dependencies.push(dependency);
        }
        self
    }

    /// Declares an expected slot.
    #[must_use]
    pub fn expects(mut self, slot: impl Into<SlotName>) -> Self {
        let slot = slot.into();
        if !self.expects.contains(&slot) {
            self.expects.push(slot);
        }
        self
    }

    /// Declares a provided slot.
    #[must_use]
    pub fn provides(mut self, slot: impl Into<SlotName>) -> Self {
        let slot = slot.into();
        if !self.provides.contains(&slot) {
            self.provides.push(slot);
        }
        self
    }

    /// Merges the catalog of a suite-specific failure kind enum.
    #[must_use]
    pub fn failure_kinds<K: FailureKind>(mut self) -> Self {
        self.failures.merge::<K>();
        self
    }

    /// Finishes the definition with its check.
    #[must_use]
    pub fn check(self, check: Arc<dyn Check>) -> TestDefinition {
        TestDefinition {
            id: self.id,
            assertion: self.assertion,
            group: self.group,
            dependencies: self.dependencies,
            expects: self.expects,
            provides: self.provides,
            failures: self.failures,
            check,
        }
    }
}
