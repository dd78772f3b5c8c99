// crates/compliance-core/src/core/mod.rs
// ============================================================================
// Module: Compliance Core Types
// Description: Canonical definitions, results, and run records.
// Purpose: Provide stable types shared by the engine, suites, and reporters.
// Dependencies: serde, serde_json, tokio
// ============================================================================

//! ## Overview
//! Core types describe what a suite verifies (definitions and checks), what
//! a check returns (results and failures), and what the engine emits (test
//! runs). They carry no scheduling logic; see [`crate::runtime`] for that.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod config;
pub mod context;
pub mod definition;
pub mod failure;
pub mod identifiers;
pub mod result;
pub mod run;
pub mod suite;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::Credentials;
pub use config::RunConfig;
pub use context::ContextValues;
pub use definition::Check;
pub use definition::CheckError;
pub use definition::CheckInput;
pub use definition::CheckOutput;
pub use definition::FnCheck;
pub use definition::TestDefinition;
pub use definition::TestDefinitionBuilder;
pub use definition::check_fn;
pub use failure::CONTRACT_VIOLATION;
pub use failure::Failure;
pub use failure::FailureCatalog;
pub use failure::FailureKind;
pub use failure::FailureKindInfo;
pub use failure::GenericFailure;
pub use failure::UNEXPECTED_ERROR;
pub use identifiers::GroupLabel;
pub use identifiers::SlotName;
pub use identifiers::SuiteId;
pub use identifiers::SuiteRunId;
pub use identifiers::TestId;
pub use result::CapturedBody;
pub use result::NetworkCall;
pub use result::RequestRecord;
pub use result::ResponseRecord;
pub use result::TestResult;
pub use run::Outcome;
pub use run::TestRun;
pub use suite::Suite;
