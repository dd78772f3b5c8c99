// crates/compliance-cli/src/main.rs
// ============================================================================
// Module: Compliance Harness CLI Entry Point
// Description: Command dispatcher for running and listing conformance suites.
// Purpose: Load configuration, fan suites out, stream reports, set exit codes.
// Dependencies: clap, compliance-config, compliance-core, compliance-suites, tokio
// ============================================================================

//! ## Overview
//! `compliance-harness run` loads the TOML configuration, validates every
//! selected suite graph before any request is sent, resolves the asset code
//! once, and then runs the suites concurrently. Test runs are reported as
//! they arrive. Exit codes: 0 when no executed test failed, 1 when at least
//! one failed (or the run aborted), 2 for configuration problems. Skipped
//! tests never fail a run on their own.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use compliance_cli::report::ReportFormat;
use compliance_cli::report::Reporter;
use compliance_config::AuditConfig;
use compliance_config::ConfigError;
use compliance_config::HarnessConfig;
use compliance_core::ChannelRunSink;
use compliance_core::ConfigurationError;
use compliance_core::EngineAuditSink;
use compliance_core::EngineError;
use compliance_core::FileAuditSink;
use compliance_core::NoopAuditSink;
use compliance_core::RunEvent;
use compliance_core::StderrAuditSink;
use compliance_core::SuiteRunner;
use compliance_core::run_suites;
use compliance_http::CaptureConfig;
use compliance_http::CaptureError;
use compliance_http::HttpCapture;
use compliance_suites::discover_defaults;
use compliance_suites::suite_by_id;
use compliance_suites::suite_ids;
use thiserror::Error;
use tokio::sync::mpsc;

// ============================================================================
// SECTION: Exit Codes
// ============================================================================

/// Exit code when at least one executed test failed.
const EXIT_TEST_FAILURE: u8 = 1;
/// Exit code for configuration and suite graph errors.
const EXIT_CONFIGURATION: u8 = 2;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "compliance-harness", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run conformance suites against the configured target.
    Run(RunCommand),
    /// List registered suites and their tests.
    List,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Configuration file (defaults to `COMPLIANCE_HARNESS_CONFIG`, then `compliance-harness.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Suite to run; repeatable. Overrides `[suites] enabled`.
    #[arg(long = "suite", value_name = "ID")]
    suites: Vec<String>,
    /// Report format.
    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    format: FormatArg,
}

/// Report format flag values.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    /// Human-readable lines.
    Text,
    /// JSON lines.
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI errors.
#[derive(Debug, Error)]
enum CliError {
    /// Configuration file could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A requested suite is not registered.
    #[error("unknown suite: {0}")]
    UnknownSuite(String),
    /// A suite graph is malformed.
    #[error("suite {suite} is misconfigured: {source}")]
    Suite {
        /// Suite identifier.
        suite: String,
        /// Graph validation error.
        source: ConfigurationError,
    },
    /// The HTTP client could not be built.
    #[error(transparent)]
    Capture(#[from] CaptureError),
    /// The audit log could not be opened.
    #[error("failed to open audit log: {0}")]
    Audit(std::io::Error),
    /// A suite run aborted.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Report output failed.
    #[error("failed to write report: {0}")]
    Output(std::io::Error),
}

impl CliError {
    /// Returns the process exit code for this error.
    const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_)
            | Self::UnknownSuite(_)
            | Self::Suite {
                ..
            }
            | Self::Capture(_)
            | Self::Audit(_) => EXIT_CONFIGURATION,
            Self::Engine(_) | Self::Output(_) => EXIT_TEST_FAILURE,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Run(command) => command_run(command).await,
        Commands::List => command_list(),
    };
    match outcome {
        Ok(code) => code,
        Err(err) => {
            let _ = write_stderr_line(&format!("error: {err}"));
            ExitCode::from(err.exit_code())
        }
    }
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
async fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let config = HarnessConfig::load(command.config.as_deref())?;
    let selected = select_suites(&command.suites, config.suites.enabled.as_deref())?;
    let capture = Arc::new(HttpCapture::new(config.capture_config())?);
    let audit = open_audit(&config.audit)?;

    let (sender, mut receiver) = mpsc::unbounded_channel();
    let mut runners = Vec::with_capacity(selected.len());
    for suite_id in &selected {
        let suite =
            suite_by_id(suite_id, &capture).ok_or_else(|| CliError::UnknownSuite(suite_id.clone()))?;
        let runner = SuiteRunner::new(Arc::new(suite))
            .map_err(|source| CliError::Suite {
                suite: suite_id.clone(),
                source,
            })?
            .with_audit(Arc::clone(&audit));
        runners.push((runner, ChannelRunSink::from_sender(sender.clone())));
    }
    drop(sender);

    let run_config = Arc::new(config.run_config());
    if let Err(err) = discover_defaults(&run_config, &capture).await {
        let _ = write_stderr_line(&format!("warning: asset code discovery failed: {err}"));
    }

    let mut reporter = Reporter::new(std::io::stdout(), command.format.into());
    let mut pending = runners.len();
    let report = async {
        while pending > 0 {
            let Some(event) = receiver.recv().await else {
                break;
            };
            if matches!(event, RunEvent::Finished { .. }) {
                pending -= 1;
            }
            reporter.event(&event)?;
        }
        Ok::<_, std::io::Error>(())
    };
    let (reports, written) = tokio::join!(run_suites(runners, Arc::clone(&run_config)), report);
    written.map_err(CliError::Output)?;
    let reports = reports?;

    if reports.iter().any(|(report, _)| !report.stats.success()) {
        return Ok(ExitCode::from(EXIT_TEST_FAILURE));
    }
    Ok(ExitCode::SUCCESS)
}

/// Chooses the suites to run: CLI flags first, then config, then all registered.
///
/// Duplicates are dropped, keeping the first occurrence.
fn select_suites(requested: &[String], enabled: Option<&[String]>) -> CliResult<Vec<String>> {
    let candidates: Vec<String> = if !requested.is_empty() {
        requested.to_vec()
    } else if let Some(enabled) = enabled {
        enabled.to_vec()
    } else {
        suite_ids().iter().map(ToString::to_string).collect()
    };
    let mut selected: Vec<String> = Vec::with_capacity(candidates.len());
    for suite_id in candidates {
        if !suite_ids().contains(&suite_id.as_str()) {
            return Err(CliError::UnknownSuite(suite_id));
        }
        if !selected.contains(&suite_id) {
            selected.push(suite_id);
        }
    }
    Ok(selected)
}

/// Opens the configured audit sink.
fn open_audit(config: &AuditConfig) -> CliResult<Arc<dyn EngineAuditSink>> {
    if let Some(path) = &config.path {
        let sink = FileAuditSink::new(path).map_err(CliError::Audit)?;
        return Ok(Arc::new(sink));
    }
    if config.stderr {
        return Ok(Arc::new(StderrAuditSink));
    }
    Ok(Arc::new(NoopAuditSink))
}

// ============================================================================
// SECTION: List Command
// ============================================================================

/// Executes the `list` command.
fn command_list() -> CliResult<ExitCode> {
    let capture = Arc::new(HttpCapture::new(CaptureConfig::default())?);
    let mut stdout = std::io::stdout();
    for line in list_lines(&capture) {
        writeln!(&mut stdout, "{line}").map_err(CliError::Output)?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Renders every registered suite with its tests and their failure kinds.
fn list_lines(capture: &Arc<HttpCapture>) -> Vec<String> {
    let mut lines = Vec::new();
    for suite_id in suite_ids() {
        let Some(suite) = suite_by_id(suite_id, capture) else {
            continue;
        };
        lines.push((*suite_id).to_string());
        for test in suite.tests() {
            lines.push(format!("  {} ({})", test.id(), test.group()));
            let kinds: Vec<&str> = test.failures().entries().iter().map(|info| info.name).collect();
            lines.push(format!("    failure kinds: {}", kinds.join(", ")));
        }
    }
    lines
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}
