//! Config load and validation tests for compliance-config.
// crates/compliance-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards and section validation.
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

#![allow(clippy::use_debug, reason = "Debug output is asserted to redact credentials.")]

use std::io::Write;

use compliance_config::ConfigError;
use compliance_config::HarnessConfig;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<HarnessConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

fn write_config(content: &str) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content.as_bytes()).map_err(|err| err.to_string())?;
    Ok(file)
}

// ============================================================================
// SECTION: Loading
// ============================================================================

#[test]
fn load_reads_full_config() -> TestResult {
    let file = write_config(
        r#"
[target]
base_url = "https://api.example.com/v1/"
asset_code = "EUR"
bearer_token = "s3cret"

[target.identifiers]
account = "alice"

[http]
timeout_ms = 2500
max_response_bytes = 65536

[audit]
path = "audit.jsonl"

[suites]
enabled = ["service"]
"#,
    )?;
    let config = HarnessConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    let run = config.run_config();
    if run.base_url() != "https://api.example.com/v1" {
        return Err(format!("unexpected base url {}", run.base_url()));
    }
    if run.asset_code() != Some("EUR") || run.identifier("account") != Some("alice") {
        return Err("run config lost target fields".to_string());
    }
    if run.credentials().map(|creds| creds.bearer_token()) != Some("s3cret") {
        return Err("bearer token not carried over".to_string());
    }
    let capture = config.capture_config();
    if capture.timeout_ms != 2500 || capture.max_response_bytes != 65536 {
        return Err("http limits not carried over".to_string());
    }
    if format!("{config:?}").contains("s3cret") {
        return Err("debug output leaked the bearer token".to_string());
    }
    Ok(())
}

#[test]
fn load_applies_defaults() -> TestResult {
    let config = HarnessConfig::from_toml("[target]\nbase_url = \"https://svc\"\n")
        .map_err(|err| err.to_string())?;
    if config.http.allow_http || config.http.timeout_ms != 10_000 {
        return Err("unexpected http defaults".to_string());
    }
    if config.suites.enabled.is_some() || config.audit.path.is_some() {
        return Err("unexpected optional sections".to_string());
    }
    if config.run_config().asset_code().is_some() {
        return Err("asset code must stay unset".to_string());
    }
    Ok(())
}

#[test]
fn load_rejects_missing_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    assert_invalid(HarnessConfig::load(Some(&path)), "config io error")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let file = write_config(&"#".repeat(1_048_577))?;
    assert_invalid(HarnessConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_oversized_file_before_reading() -> TestResult {
    let file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.as_file().set_len(16 * 1024 * 1024 * 1024).map_err(|err| err.to_string())?;
    assert_invalid(HarnessConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_accepts_file_at_size_limit() -> TestResult {
    let header = "[target]\nbase_url = \"https://api.example.com\"\n";
    let padding = "#".repeat(1_048_576 - header.len());
    let file = write_config(&format!("{header}{padding}"))?;
    HarnessConfig::load(Some(file.path())).map(|_| ()).map_err(|err| err.to_string())
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(HarnessConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_rejects_unknown_fields() -> TestResult {
    assert_invalid(
        HarnessConfig::from_toml("[target]\nbase_url = \"https://svc\"\nbase = 1\n"),
        "config parse error",
    )
}

// ============================================================================
// SECTION: Validation
// ============================================================================

#[test]
fn http_base_url_requires_opt_in() -> TestResult {
    assert_invalid(
        HarnessConfig::from_toml("[target]\nbase_url = \"http://svc\"\n"),
        "http.allow_http",
    )?;
    HarnessConfig::from_toml("[target]\nbase_url = \"http://svc\"\n[http]\nallow_http = true\n")
        .map(|_| ())
        .map_err(|err| err.to_string())
}

#[test]
fn relative_base_url_is_rejected() -> TestResult {
    assert_invalid(
        HarnessConfig::from_toml("[target]\nbase_url = \"/v1\"\n"),
        "target.base_url is invalid",
    )
}

#[test]
fn unsupported_scheme_is_rejected() -> TestResult {
    assert_invalid(
        HarnessConfig::from_toml("[target]\nbase_url = \"ftp://svc\"\n"),
        "scheme ftp",
    )
}

#[test]
fn embedded_credentials_are_rejected() -> TestResult {
    assert_invalid(
        HarnessConfig::from_toml("[target]\nbase_url = \"https://user:pw@svc\"\n"),
        "must not embed credentials",
    )
}

#[test]
fn empty_optional_values_are_rejected() -> TestResult {
    assert_invalid(
        HarnessConfig::from_toml("[target]\nbase_url = \"https://svc\"\nasset_code = \" \"\n"),
        "target.asset_code must not be empty",
    )?;
    assert_invalid(
        HarnessConfig::from_toml("[target]\nbase_url = \"https://svc\"\nbearer_token = \"\"\n"),
        "target.bearer_token must not be empty",
    )?;
    assert_invalid(
        HarnessConfig::from_toml(
            "[target]\nbase_url = \"https://svc\"\n[target.identifiers]\naccount = \"\"\n",
        ),
        "target.identifiers.account must not be empty",
    )
}

#[test]
fn http_limits_are_bounded() -> TestResult {
    assert_invalid(
        HarnessConfig::from_toml("[target]\nbase_url = \"https://svc\"\n[http]\ntimeout_ms = 50\n"),
        "http.timeout_ms",
    )?;
    assert_invalid(
        HarnessConfig::from_toml(
            "[target]\nbase_url = \"https://svc\"\n[http]\nmax_response_bytes = 100\n",
        ),
        "http.max_response_bytes",
    )
}

#[test]
fn duplicate_enabled_suite_is_rejected() -> TestResult {
    assert_invalid(
        HarnessConfig::from_toml(
            "[target]\nbase_url = \"https://svc\"\n[suites]\nenabled = [\"service\", \"service\"]\n",
        ),
        "twice",
    )
}

#[test]
fn audit_targets_are_exclusive() -> TestResult {
    assert_invalid(
        HarnessConfig::from_toml(
            "[target]\nbase_url = \"https://svc\"\n[audit]\npath = \"a.jsonl\"\nstderr = true\n",
        ),
        "mutually exclusive",
    )
}
