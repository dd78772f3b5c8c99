// crates/compliance-core/tests/engine_execution.rs
// ============================================================================
// Module: Engine Execution Tests
// Description: Tests for ordering, context wiring, cascade skips, and stats.
// ============================================================================
//! ## Overview
//! Drives small in-memory suites through [`SuiteRunner`] and checks the
//! emitted runs and statistics.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use compliance_core::ChannelRunSink;
use compliance_core::Check;
use compliance_core::CheckError;
use compliance_core::CheckInput;
use compliance_core::CheckOutput;
use compliance_core::ContextValues;
use compliance_core::EngineError;
use compliance_core::Failure;
use compliance_core::FailureKind;
use compliance_core::FailureKindInfo;
use compliance_core::GroupLabel;
use compliance_core::GroupStatus;
use compliance_core::Outcome;
use compliance_core::RunConfig;
use compliance_core::RunEvent;
use compliance_core::RunSink;
use compliance_core::SinkError;
use compliance_core::Stats;
use compliance_core::Suite;
use compliance_core::SuiteId;
use compliance_core::SuiteRunner;
use compliance_core::TestDefinition;
use compliance_core::TestResult;
use compliance_core::TestRun;
use compliance_core::VecRunSink;
use compliance_core::check_fn;
use compliance_core::run_suites;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

#[derive(Debug)]
enum TransportFailure {
    NoHttps { url: String },
}

const TRANSPORT_CATALOG: &[FailureKindInfo] = &[FailureKindInfo {
    name: "no_https",
    summary: "service url is not https",
}];

impl FailureKind for TransportFailure {
    fn catalog() -> &'static [FailureKindInfo] {
        TRANSPORT_CATALOG
    }

    fn name(&self) -> &'static str {
        "no_https"
    }

    fn render(&self) -> String {
        match self {
            Self::NoHttps {
                url,
            } => format!("{url} does not use https"),
        }
    }
}

fn passing() -> Arc<dyn Check> {
    check_fn(|_input| async { Ok::<_, CheckError>(CheckOutput::from_result(TestResult::new())) })
}

fn providing(slot: &'static str, value: Value) -> Arc<dyn Check> {
    check_fn(move |_input| {
        let value = value.clone();
        async move {
            Ok::<_, CheckError>(CheckOutput::with_provides(
                TestResult::new(),
                ContextValues::new().with(slot, value),
            ))
        }
    })
}

fn require_https() -> Arc<dyn Check> {
    check_fn(|input: CheckInput| async move {
        let url = input.expects.get_str("url").unwrap_or_default().to_string();
        let mut result = TestResult::new();
        if !url.contains("https") {
            result.fail_with(&TransportFailure::NoHttps {
                url,
            });
        }
        Ok::<_, CheckError>(CheckOutput::from_result(result))
    })
}

fn config() -> Arc<RunConfig> {
    Arc::new(RunConfig::new("http://localhost:9"))
}

async fn run(suite: Suite) -> (Vec<TestRun>, Stats) {
    let runner = SuiteRunner::new(Arc::new(suite)).unwrap();
    let mut sink = VecRunSink::new();
    let report = runner.run(config(), &mut sink).await.unwrap();
    let (runs, stats) = sink.into_parts();
    assert_eq!(stats.as_ref(), Some(&report.stats));
    (runs, report.stats)
}

fn abc_suite() -> Suite {
    Suite::new(
        "transport",
        vec![
            TestDefinition::builder("A", "discovery")
                .assertion("service url is published")
                .provides("url")
                .check(providing("url", json!("http://x"))),
            TestDefinition::builder("B", "transport")
                .assertion("service url uses https")
                .depends_on("A")
                .expects("url")
                .failure_kinds::<TransportFailure>()
                .check(require_https()),
            TestDefinition::builder("C", "transport")
                .assertion("downstream check")
                .depends_on("B")
                .check(passing()),
        ],
    )
}

// ============================================================================
// SECTION: Cascade and Stats
// ============================================================================

#[tokio::test]
async fn failed_dependency_skips_dependents_and_is_excluded_from_totals() {
    let (runs, stats) = run(abc_suite()).await;

    assert_eq!(runs.len(), 3);
    assert!(runs[0].outcome.is_passed());
    let failure = runs[1].outcome.failure().unwrap();
    assert_eq!(failure.kind, "no_https");
    assert_eq!(failure.message, "http://x does not use https");
    assert_eq!(
        runs[2].outcome,
        Outcome::Skipped {
            blocked_by: "B".into(),
        }
    );

    assert_eq!(stats.total, 2);
    assert_eq!(stats.passed, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.passed + stats.failed, stats.total);
    assert!(!stats.success());
    assert_eq!(stats.group_status(&GroupLabel::new("transport")), Some(GroupStatus::Failed));
    assert_eq!(stats.group_status(&GroupLabel::new("discovery")), Some(GroupStatus::Passed));
}

#[tokio::test]
async fn skip_propagates_transitively() {
    let suite = Suite::new(
        "s",
        vec![
            TestDefinition::builder("root", "g").check(check_fn(|_input| async {
                Ok::<_, CheckError>(CheckOutput::from_result(TestResult::failed(
                    Failure::unexpected("down"),
                )))
            })),
            TestDefinition::builder("mid", "g").depends_on("root").check(passing()),
            TestDefinition::builder("leaf", "other").depends_on("mid").check(passing()),
        ],
    );
    let (runs, stats) = run(suite).await;

    assert_eq!(
        runs[2].outcome,
        Outcome::Skipped {
            blocked_by: "mid".into(),
        }
    );
    assert_eq!(stats.total, 1);
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.group_status(&GroupLabel::new("other")), Some(GroupStatus::Undetermined));
}

#[tokio::test]
async fn blocked_by_names_first_non_passed_dependency_in_declaration_order() {
    let failing = || {
        check_fn(|_input| async {
            Ok::<_, CheckError>(CheckOutput::from_result(TestResult::failed(
                Failure::unexpected("no"),
            )))
        })
    };
    let suite = Suite::new(
        "s",
        vec![
            TestDefinition::builder("ok", "g").check(passing()),
            TestDefinition::builder("bad_one", "g").check(failing()),
            TestDefinition::builder("bad_two", "g").check(failing()),
            TestDefinition::builder("joined", "g")
                .depends_on("ok")
                .depends_on("bad_two")
                .depends_on("bad_one")
                .check(passing()),
        ],
    );
    let (runs, _) = run(suite).await;
    assert_eq!(
        runs[3].outcome,
        Outcome::Skipped {
            blocked_by: "bad_two".into(),
        }
    );
}

#[tokio::test]
async fn repeated_runs_yield_identical_stats() {
    let runner = SuiteRunner::new(Arc::new(abc_suite())).unwrap();
    let mut first = VecRunSink::new();
    let mut second = VecRunSink::new();
    let one = runner.run(config(), &mut first).await.unwrap();
    let two = runner.run(config(), &mut second).await.unwrap();

    assert_eq!(one.stats, two.stats);
    assert_ne!(one.run_id, two.run_id);
    let outcomes = |sink: &VecRunSink| -> Vec<&'static str> {
        sink.runs().iter().map(|run| run.outcome.label()).collect()
    };
    assert_eq!(outcomes(&first), outcomes(&second));
}

// ============================================================================
// SECTION: Context Wiring
// ============================================================================

#[tokio::test]
async fn provided_value_reaches_dependent_unchanged() {
    let payload = json!({"url": "https://svc", "codes": ["EUR", "USD"], "limit": 3});
    let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let observer = Arc::clone(&seen);
    let suite = Suite::new(
        "s",
        vec![
            TestDefinition::builder("producer", "g")
                .provides("doc")
                .check(providing("doc", payload.clone())),
            TestDefinition::builder("consumer", "g")
                .depends_on("producer")
                .expects("doc")
                .check(check_fn(move |input: CheckInput| {
                    let observer = Arc::clone(&observer);
                    async move {
                        *observer.lock().unwrap() = input.expects.get("doc").cloned();
                        Ok::<_, CheckError>(CheckOutput::from_result(TestResult::new()))
                    }
                })),
        ],
    );
    let (_, stats) = run(suite).await;
    assert!(stats.success());
    assert_eq!(seen.lock().unwrap().clone(), Some(payload));
}

#[tokio::test]
async fn each_run_sees_only_its_own_values() {
    let counter = Arc::new(AtomicUsize::new(0));
    let seen: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let producer_counter = Arc::clone(&counter);
    let observer = Arc::clone(&seen);
    let suite = Suite::new(
        "s",
        vec![
            TestDefinition::builder("producer", "g").provides("n").check(check_fn(
                move |_input| {
                    let next = producer_counter.fetch_add(1, Ordering::SeqCst);
                    async move {
                        Ok::<_, CheckError>(CheckOutput::with_provides(
                            TestResult::new(),
                            ContextValues::new().with("n", json!(next)),
                        ))
                    }
                },
            )),
            TestDefinition::builder("consumer", "g")
                .depends_on("producer")
                .expects("n")
                .check(check_fn(move |input: CheckInput| {
                    let observer = Arc::clone(&observer);
                    async move {
                        observer.lock().unwrap().push(input.expects.get("n").cloned().unwrap());
                        Ok::<_, CheckError>(CheckOutput::from_result(TestResult::new()))
                    }
                })),
        ],
    );
    let runner = SuiteRunner::new(Arc::new(suite)).unwrap();
    for _ in 0 .. 3 {
        runner.run(config(), &mut VecRunSink::new()).await.unwrap();
    }
    assert_eq!(*seen.lock().unwrap(), vec![json!(0), json!(1), json!(2)]);
}

// ============================================================================
// SECTION: Check Failures
// ============================================================================

#[tokio::test]
async fn check_error_becomes_unexpected_failure_and_suite_continues() {
    let suite = Suite::new(
        "s",
        vec![
            TestDefinition::builder("erroring", "g").check(check_fn(|_input| async {
                Err::<CheckOutput, _>(CheckError::new("socket exploded"))
            })),
            TestDefinition::builder("next", "g").check(passing()),
        ],
    );
    let (runs, stats) = run(suite).await;
    let failure = runs[0].outcome.failure().unwrap();
    assert_eq!(failure.kind, "unexpected_error");
    assert!(failure.message.contains("socket exploded"));
    assert!(runs[1].outcome.is_passed());
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.passed, 1);
}

#[tokio::test]
async fn panicking_check_is_isolated() {
    let suite = Suite::new(
        "s",
        vec![
            TestDefinition::builder("panics", "g").check(check_fn(|_input| async {
                if true {
                    panic!("kaboom");
                }
                Ok::<_, CheckError>(CheckOutput::from_result(TestResult::new()))
            })),
            TestDefinition::builder("after", "g").check(passing()),
        ],
    );
    let (runs, _) = run(suite).await;
    let failure = runs[0].outcome.failure().unwrap();
    assert_eq!(failure.kind, "unexpected_error");
    assert!(failure.message.contains("kaboom"));
    assert!(runs[1].outcome.is_passed());
}

#[tokio::test]
async fn missing_provided_slot_is_a_contract_violation() {
    let suite = Suite::new(
        "s",
        vec![
            TestDefinition::builder("forgetful", "g").provides("token").check(passing()),
            TestDefinition::builder("user", "g")
                .depends_on("forgetful")
                .expects("token")
                .check(passing()),
        ],
    );
    let (runs, _) = run(suite).await;
    let failure = runs[0].outcome.failure().unwrap();
    assert_eq!(failure.kind, "contract_violation");
    assert!(failure.message.contains("token"));
    assert!(runs[1].outcome.is_skipped());
}

#[tokio::test]
async fn undeclared_provided_slot_is_a_contract_violation() {
    let suite =
        Suite::new("s", vec![TestDefinition::builder("chatty", "g").check(providing("extra", json!(1)))]);
    let (runs, _) = run(suite).await;
    assert_eq!(runs[0].outcome.failure().unwrap().kind, "contract_violation");
}

#[tokio::test]
async fn undeclared_failure_kind_is_relabelled() {
    let suite = Suite::new(
        "s",
        vec![TestDefinition::builder("a", "g").check(check_fn(|_input| async {
            let failure = Failure::from_kind(&TransportFailure::NoHttps {
                url: "http://plain".to_string(),
            })
            .with_expected(json!("https"))
            .with_actual(json!("http://plain"));
            Ok::<_, CheckError>(CheckOutput::from_result(TestResult::failed(failure)))
        }))],
    );
    let (runs, _) = run(suite).await;
    let failure = runs[0].outcome.failure().unwrap();
    assert_eq!(failure.kind, "unexpected_error");
    assert!(failure.message.contains("no_https"));
    assert!(failure.message.contains("http://plain"));
    assert_eq!(failure.expected, Some(json!("https")));
    assert_eq!(failure.actual, Some(json!("http://plain")));
}

// ============================================================================
// SECTION: Sinks and Errors
// ============================================================================

#[tokio::test]
async fn channel_sink_streams_runs_then_stats() {
    let runner = SuiteRunner::new(Arc::new(abc_suite())).unwrap();
    let (mut sink, mut receiver) = ChannelRunSink::channel();
    runner.run(config(), &mut sink).await.unwrap();
    drop(sink);

    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        events.push(event);
    }
    assert_eq!(events.len(), 4);
    let ids: Vec<String> = events
        .iter()
        .filter_map(|event| match event {
            RunEvent::Run(run) => Some(run.test_id.to_string()),
            RunEvent::Finished {
                ..
            } => None,
        })
        .collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
    assert!(matches!(events.last(), Some(RunEvent::Finished { .. })));
}

struct RejectingSink;

impl RunSink for RejectingSink {
    fn record(&mut self, _run: &TestRun) -> Result<(), SinkError> {
        Err(SinkError::Write("disk full".to_string()))
    }

    fn finish(&mut self, _suite_id: &SuiteId, _stats: &Stats) -> Result<(), SinkError> {
        Ok(())
    }
}

#[tokio::test]
async fn sink_failure_aborts_the_run() {
    let runner = SuiteRunner::new(Arc::new(abc_suite())).unwrap();
    let err = runner.run(config(), &mut RejectingSink).await.unwrap_err();
    assert!(matches!(err, EngineError::Sink(SinkError::Write(_))));
}

#[tokio::test]
async fn dropped_run_aborts_the_in_flight_check() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);
    let suite = Suite::new(
        "slow",
        vec![TestDefinition::builder("sleeper", "g").check(check_fn(move |_input| {
            let flag = Arc::clone(&flag);
            async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                flag.store(true, Ordering::SeqCst);
                Ok::<_, CheckError>(CheckOutput::from_result(TestResult::new()))
            }
        }))],
    );
    let runner = SuiteRunner::new(Arc::new(suite)).unwrap();
    let mut sink = VecRunSink::new();

    let outcome =
        tokio::time::timeout(Duration::from_millis(20), runner.run(config(), &mut sink)).await;
    assert!(outcome.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!finished.load(Ordering::SeqCst));
    assert!(sink.runs().is_empty());
    assert!(sink.stats().is_none());
}

#[test]
fn invalid_suite_never_runs_a_check() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let suite = Suite::new(
        "s",
        vec![TestDefinition::builder("a", "g").depends_on("missing").check(check_fn(
            move |_input| {
                counted.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, CheckError>(CheckOutput::from_result(TestResult::new())) }
            },
        ))],
    );
    assert!(SuiteRunner::new(Arc::new(suite)).is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_suites_report_in_input_order() {
    let second = Suite::new(
        "second",
        vec![TestDefinition::builder("only", "g").check(check_fn(|_input| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, CheckError>(CheckOutput::from_result(TestResult::new()))
        }))],
    );
    let runners = vec![
        (SuiteRunner::new(Arc::new(abc_suite())).unwrap(), VecRunSink::new()),
        (SuiteRunner::new(Arc::new(second)).unwrap(), VecRunSink::new()),
    ];
    let reports = run_suites(runners, config()).await.unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].0.suite_id.as_str(), "transport");
    assert_eq!(reports[0].1.runs().len(), 3);
    assert_eq!(reports[1].0.suite_id.as_str(), "second");
    assert!(reports[1].0.stats.success());
}
