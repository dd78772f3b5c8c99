// crates/compliance-config/src/config.rs
// ============================================================================
// Module: Harness Configuration
// Description: Configuration loading and validation for the compliance harness.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: compliance-core, compliance-http, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with a size limit and a UTF-8
//! check, then validated section by section. Invalid configuration fails
//! closed before any suite is built.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use compliance_core::Credentials;
use compliance_core::RunConfig;
use compliance_http::CaptureConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "compliance-harness.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "COMPLIANCE_HARNESS_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Minimum request timeout in milliseconds.
pub const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum request timeout in milliseconds.
pub const MAX_TIMEOUT_MS: u64 = 120_000;
/// Minimum response body limit in bytes.
pub const MIN_RESPONSE_BYTES: usize = 1024;
/// Maximum response body limit in bytes.
pub const MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;
/// Default request timeout in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
/// Default response body limit in bytes.
const DEFAULT_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Complete harness configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    /// Service under test.
    pub target: TargetConfig,
    /// Outbound HTTP settings.
    #[serde(default)]
    pub http: HttpConfig,
    /// Audit log settings.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Suite selection.
    #[serde(default)]
    pub suites: SuitesConfig,
}

impl HarnessConfig {
    /// Loads configuration from disk using the default resolution rules:
    /// explicit path, then `COMPLIANCE_HARNESS_CONFIG`, then
    /// `compliance-harness.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path);
        let io_error = |err: std::io::Error| ConfigError::Io(format!("{}: {err}", resolved.display()));
        let declared = fs::metadata(&resolved).map_err(io_error)?.len();
        if !usize::try_from(declared).is_ok_and(|len| len <= MAX_CONFIG_FILE_SIZE) {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let file = fs::File::open(&resolved).map_err(io_error)?;
        let mut bytes = Vec::new();
        file.take(declared.saturating_add(1)).read_to_end(&mut bytes).map_err(io_error)?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.target.validate(&self.http)?;
        self.http.validate()?;
        self.audit.validate()?;
        self.suites.validate()?;
        Ok(())
    }

    /// Builds the core run configuration.
    #[must_use]
    pub fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::new(self.target.base_url.clone());
        for (name, value) in &self.target.identifiers {
            config = config.with_identifier(name.clone(), value.clone());
        }
        if let Some(token) = &self.target.bearer_token {
            config = config.with_credentials(Credentials::bearer(token.clone()));
        }
        if let Some(code) = &self.target.asset_code {
            config = config.with_asset_code(code.clone());
        }
        config
    }

    /// Builds the HTTP capture configuration.
    #[must_use]
    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            timeout_ms: self.http.timeout_ms,
            max_response_bytes: self.http.max_response_bytes,
            user_agent: self.http.user_agent.clone(),
        }
    }
}

// ============================================================================
// SECTION: Target
// ============================================================================

/// Service under test.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Absolute base URL of the service.
    pub base_url: String,
    /// Asset code to exercise; discovered from the service when omitted.
    #[serde(default)]
    pub asset_code: Option<String>,
    /// Suite-specific identifiers.
    #[serde(default)]
    pub identifiers: BTreeMap<String, String>,
    /// Bearer token attached to outbound requests.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl TargetConfig {
    /// Validates target settings.
    fn validate(&self, http: &HttpConfig) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url)
            .map_err(|err| ConfigError::Invalid(format!("target.base_url is invalid: {err}")))?;
        match url.scheme() {
            "https" => {}
            "http" if http.allow_http => {}
            "http" => {
                return Err(ConfigError::Invalid(
                    "target.base_url uses http; set http.allow_http = true".to_string(),
                ));
            }
            other => {
                return Err(ConfigError::Invalid(format!(
                    "target.base_url scheme {other} is not supported"
                )));
            }
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::Invalid("target.base_url must include a host".to_string()));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(ConfigError::Invalid(
                "target.base_url must not embed credentials".to_string(),
            ));
        }
        if let Some(code) = &self.asset_code {
            ensure_non_empty("target.asset_code", code)?;
        }
        if let Some(token) = &self.bearer_token {
            ensure_non_empty("target.bearer_token", token)?;
        }
        for (name, value) in &self.identifiers {
            ensure_non_empty("target.identifiers key", name)?;
            ensure_non_empty(&format!("target.identifiers.{name}"), value)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("base_url", &self.base_url)
            .field("asset_code", &self.asset_code)
            .field("identifiers", &self.identifiers)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ============================================================================
// SECTION: HTTP
// ============================================================================

/// Outbound HTTP settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Allow cleartext `http://` base URLs.
    #[serde(default)]
    pub allow_http: bool,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum response body size in bytes.
    #[serde(default = "default_response_bytes")]
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            allow_http: false,
            timeout_ms: default_timeout_ms(),
            max_response_bytes: default_response_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    /// Validates HTTP limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TIMEOUT_MS ..= MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "http.timeout_ms must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
            )));
        }
        if !(MIN_RESPONSE_BYTES ..= MAX_RESPONSE_BYTES).contains(&self.max_response_bytes) {
            return Err(ConfigError::Invalid(format!(
                "http.max_response_bytes must be between {MIN_RESPONSE_BYTES} and \
                 {MAX_RESPONSE_BYTES}"
            )));
        }
        ensure_non_empty("http.user_agent", &self.user_agent)
    }
}

/// Default request timeout.
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Default response body limit.
const fn default_response_bytes() -> usize {
    DEFAULT_RESPONSE_BYTES
}

/// Default user agent.
fn default_user_agent() -> String {
    CaptureConfig::default().user_agent
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit log settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Append JSON-line audit events to this file.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Write JSON-line audit events to stderr.
    #[serde(default)]
    pub stderr: bool,
}

impl AuditConfig {
    /// Validates audit settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("audit.path must not be empty".to_string()));
            }
            if self.stderr {
                return Err(ConfigError::Invalid(
                    "audit.path and audit.stderr are mutually exclusive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Suites
// ============================================================================

/// Suite selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuitesConfig {
    /// Suite identifiers to run; every registered suite when omitted.
    #[serde(default)]
    pub enabled: Option<Vec<String>>,
}

impl SuitesConfig {
    /// Validates suite selection.
    fn validate(&self) -> Result<(), ConfigError> {
        let Some(enabled) = &self.enabled else {
            return Ok(());
        };
        let mut seen = BTreeSet::new();
        for suite in enabled {
            ensure_non_empty("suites.enabled entry", suite)?;
            if !seen.insert(suite.as_str()) {
                return Err(ConfigError::Invalid(format!("suites.enabled lists {suite} twice")));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from explicit input, env, or default.
fn resolve_path(path: Option<&Path>) -> PathBuf {
    if let Some(path) = path {
        return path.to_path_buf();
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR)
        && !env_path.trim().is_empty()
    {
        return PathBuf::from(env_path);
    }
    PathBuf::from(DEFAULT_CONFIG_NAME)
}

/// Rejects empty or whitespace-only values.
fn ensure_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must not be empty")));
    }
    Ok(())
}
