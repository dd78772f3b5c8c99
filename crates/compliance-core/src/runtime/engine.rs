// crates/compliance-core/src/runtime/engine.rs
// ============================================================================
// Module: Suite Execution Engine
// Description: Sequential, dependency-aware execution of one suite.
// Purpose: Wire context, invoke checks, cascade skips, and stream test runs.
// Dependencies: crate::{core, interfaces, runtime}, tokio
// ============================================================================

//! ## Overview
//! [`SuiteRunner`] walks a validated [`ExecutionPlan`] once per run. Checks
//! execute strictly one at a time in plan order: a later check may rely on
//! state minted by an earlier network call, and the service under test is
//! rate limited. Each check runs in its own task so an error or panic inside
//! it becomes an `unexpected_error` failure instead of aborting the suite.
//! Every [`TestRun`] is handed to the sink as soon as it is final.
//!
//! Independent suites can run concurrently through [`run_suites`]; they share
//! only the read-only [`RunConfig`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use thiserror::Error;
use tokio::task::JoinSet;

use crate::core::CheckInput;
use crate::core::CheckOutput;
use crate::core::ContextValues;
use crate::core::Failure;
use crate::core::Outcome;
use crate::core::RunConfig;
use crate::core::Suite;
use crate::core::SuiteId;
use crate::core::SuiteRunId;
use crate::core::TestDefinition;
use crate::core::TestResult;
use crate::core::TestRun;
use crate::interfaces::RunSink;
use crate::interfaces::SinkError;
use crate::runtime::audit::EngineAuditEvent;
use crate::runtime::audit::EngineAuditSink;
use crate::runtime::audit::NoopAuditSink;
use crate::runtime::context::ContextError;
use crate::runtime::context::ContextStore;
use crate::runtime::graph::ConfigurationError;
use crate::runtime::graph::ExecutionPlan;
use crate::runtime::stats::Stats;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal engine errors. Per-test problems never surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A validated slot binding had no recorded value.
    #[error("internal invariant violated: {0}")]
    MissingContextValue(#[from] ContextError),
    /// The output stream rejected a record.
    #[error(transparent)]
    Sink(#[from] SinkError),
    /// A concurrently running suite task could not be joined.
    #[error("suite task failed: {0}")]
    Join(String),
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Summary returned when a suite run completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteReport {
    /// Suite identifier.
    pub suite_id: SuiteId,
    /// Suite run identifier.
    pub run_id: SuiteRunId,
    /// Final statistics.
    pub stats: Stats,
}

// ============================================================================
// SECTION: Suite Runner
// ============================================================================

/// Monotonic sequence used to mint suite run identifiers.
static RUN_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Executes one suite against a run configuration.
pub struct SuiteRunner {
    /// Suite under execution.
    suite: Arc<Suite>,
    /// Validated execution plan.
    plan: ExecutionPlan,
    /// Audit sink for execution events.
    audit: Arc<dyn EngineAuditSink>,
}

impl SuiteRunner {
    /// Validates the suite and prepares a runner.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when the suite graph is malformed; no
    /// test runs in that case.
    pub fn new(suite: Arc<Suite>) -> Result<Self, ConfigurationError> {
        let plan = suite.plan()?;
        Ok(Self {
            suite,
            plan,
            audit: Arc::new(NoopAuditSink),
        })
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn EngineAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the suite.
    #[must_use]
    pub fn suite(&self) -> &Suite {
        &self.suite
    }

    /// Returns the execution plan.
    #[must_use]
    pub const fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    /// Runs every test once in plan order, streaming runs into `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the sink fails or an internal invariant is
    /// violated. Runs already delivered to the sink remain valid.
    pub async fn run<S>(&self, config: Arc<RunConfig>, sink: &mut S) -> Result<SuiteReport, EngineError>
    where
        S: RunSink + ?Sized,
    {
        let suite_id = self.suite.suite_id().clone();
        let run_id = next_run_id(&suite_id);
        let tests = self.suite.tests();
        let mut context = ContextStore::new(run_id.clone());
        let mut passed = vec![false; tests.len()];
        let mut stats = Stats::default();

        self.audit.record(&EngineAuditEvent::suite_started(
            suite_id.as_str(),
            run_id.as_str(),
            self.plan.len(),
        ));

        for &index in self.plan.order() {
            let test = &tests[index];
            let blocked =
                self.plan.dependencies(index).iter().copied().find(|dep| !passed[*dep]);
            let outcome = if let Some(dep) = blocked {
                Outcome::Skipped {
                    blocked_by: tests[dep].id().clone(),
                }
            } else {
                let expects = context.resolve(&self.suite, self.plan.bindings(index))?;
                let output = invoke(test, Arc::clone(&config), expects).await;
                let (result, provides) = enforce_contract(test, output);
                if result.is_success() {
                    context.record(test.id().clone(), provides);
                }
                Outcome::from_result(result)
            };
            passed[index] = outcome.is_passed();

            let run = TestRun {
                suite_id: suite_id.clone(),
                run_id: run_id.clone(),
                test_id: test.id().clone(),
                assertion: test.assertion().to_string(),
                group: test.group().clone(),
                outcome,
            };
            stats.add(&run);
            self.audit.record(&EngineAuditEvent::test_completed(&run));
            sink.record(&run)?;
        }

        sink.finish(&suite_id, &stats)?;
        self.audit.record(&EngineAuditEvent::suite_finished(
            suite_id.as_str(),
            run_id.as_str(),
            &stats,
        ));
        Ok(SuiteReport {
            suite_id,
            run_id,
            stats,
        })
    }
}

// ============================================================================
// SECTION: Concurrent Suites
// ============================================================================

/// Runs independent suites concurrently, each with its own sink and context.
///
/// Reports are returned in input order together with their sinks.
///
/// # Errors
///
/// Returns the first [`EngineError`] raised by any suite; remaining suite
/// tasks are aborted.
pub async fn run_suites<S>(
    runners: Vec<(SuiteRunner, S)>,
    config: Arc<RunConfig>,
) -> Result<Vec<(SuiteReport, S)>, EngineError>
where
    S: RunSink + 'static,
{
    let count = runners.len();
    let mut tasks = JoinSet::new();
    for (position, (runner, mut sink)) in runners.into_iter().enumerate() {
        let config = Arc::clone(&config);
        tasks.spawn(async move {
            let outcome = runner.run(config, &mut sink).await;
            (position, outcome.map(|report| (report, sink)))
        });
    }

    let mut slots: Vec<Option<(SuiteReport, S)>> = (0 .. count).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        let (position, outcome) = joined.map_err(|err| EngineError::Join(err.to_string()))?;
        slots[position] = Some(outcome?);
    }
    Ok(slots.into_iter().flatten().collect())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Mints a run identifier unique within this process.
fn next_run_id(suite_id: &SuiteId) -> SuiteRunId {
    let seq = RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SuiteRunId::new(format!("{suite_id}-{seq}"))
}

/// Invokes a check in its own task, converting errors and panics into messages.
///
/// The task lives in a local [`JoinSet`], so dropping the run future aborts
/// the in-flight check instead of detaching it.
async fn invoke(
    test: &TestDefinition,
    config: Arc<RunConfig>,
    expects: ContextValues,
) -> Result<CheckOutput, String> {
    let check = test.check();
    let input = CheckInput {
        config,
        expects,
    };
    let mut task = JoinSet::new();
    task.spawn(async move { check.run(input).await });
    let Some(joined) = task.join_next().await else {
        return Err("check task was not scheduled".to_string());
    };
    match joined {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(err)) => Err(err.to_string()),
        Err(err) if err.is_panic() => Err(panic_message(err.into_panic().as_ref())),
        Err(err) => Err(format!("check task did not complete: {err}")),
    }
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return format!("check panicked: {message}");
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return format!("check panicked: {message}");
    }
    "check panicked".to_string()
}

/// Converts a failure outside the catalog into `unexpected_error`, keeping its
/// original kind, message, and payloads.
fn relabel_undeclared(failure: Failure) -> Failure {
    let mut relabelled =
        Failure::unexpected(format!("undeclared failure kind {}: {}", failure.kind, failure.message));
    if let Some(expected) = failure.expected {
        relabelled = relabelled.with_expected(expected);
    }
    if let Some(actual) = failure.actual {
        relabelled = relabelled.with_actual(actual);
    }
    relabelled
}

/// Applies the failure catalog and provides contract to a check outcome.
fn enforce_contract(
    test: &TestDefinition,
    output: Result<CheckOutput, String>,
) -> (TestResult, ContextValues) {
    let CheckOutput {
        mut result,
        provides,
    } = match output {
        Ok(output) => output,
        Err(message) => {
            return (TestResult::failed(Failure::unexpected(message)), ContextValues::new());
        }
    };

    if let Some(failure) = result.failure.take() {
        let failure = if test.failures().contains(&failure.kind) {
            failure
        } else {
            relabel_undeclared(failure)
        };
        result.failure = Some(failure);
        return (result, ContextValues::new());
    }

    let missing: Vec<String> = test
        .provides()
        .iter()
        .filter(|slot| !provides.contains(slot))
        .map(ToString::to_string)
        .collect();
    let undeclared: Vec<String> = provides
        .slots()
        .filter(|slot| !test.provides().contains(slot))
        .map(ToString::to_string)
        .collect();
    if !missing.is_empty() {
        result.fail(Failure::contract_violation(format!(
            "{} did not provide slot(s) {}",
            test.id(),
            missing.join(", ")
        )));
    } else if !undeclared.is_empty() {
        result.fail(Failure::contract_violation(format!(
            "{} provided undeclared slot(s) {}",
            test.id(),
            undeclared.join(", ")
        )));
    }
    (result, provides)
}
