// crates/compliance-core/src/core/config.rs
// ============================================================================
// Module: Run Configuration
// Description: Read-only inputs shared across one suite run.
// Purpose: Carry the target URL, identifiers, credentials, and asset code.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! A [`RunConfig`] is built once by the configuration loader and shared as an
//! `Arc` across every check of every suite. The only sanctioned mutation is
//! filling the optional asset code through auto-discovery; the value lives in
//! a set-once cell so concurrent suites observe a single winner.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use tokio::sync::OnceCell;

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Credentials attached to outbound requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Bearer token sent in the `Authorization` header.
    bearer_token: String,
}

impl Credentials {
    /// Creates bearer credentials.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer_token: token.into(),
        }
    }

    /// Returns the bearer token.
    #[must_use]
    pub fn bearer_token(&self) -> &str {
        &self.bearer_token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("bearer_token", &"<redacted>").finish()
    }
}

// ============================================================================
// SECTION: Run Configuration
// ============================================================================

/// Inputs shared by every check of a suite run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Base URL of the service under test.
    base_url: String,
    /// Suite-specific identifiers keyed by name.
    identifiers: BTreeMap<String, String>,
    /// Optional request credentials.
    credentials: Option<Credentials>,
    /// Asset code, configured or discovered at most once.
    asset_code: OnceCell<String>,
}

impl RunConfig {
    /// Creates a configuration targeting the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            identifiers: BTreeMap::new(),
            credentials: None,
            asset_code: OnceCell::new(),
        }
    }

    /// Adds a suite-specific identifier.
    #[must_use]
    pub fn with_identifier(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.identifiers.insert(name.into(), value.into());
        self
    }

    /// Sets request credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets an explicitly configured asset code.
    #[must_use]
    pub fn with_asset_code(self, code: impl Into<String>) -> Self {
        let asset_code = OnceCell::new_with(Some(code.into()));
        Self {
            asset_code,
            ..self
        }
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Returns a suite-specific identifier.
    #[must_use]
    pub fn identifier(&self, name: &str) -> Option<&str> {
        self.identifiers.get(name).map(String::as_str)
    }

    /// Returns all identifiers in name order.
    #[must_use]
    pub const fn identifiers(&self) -> &BTreeMap<String, String> {
        &self.identifiers
    }

    /// Returns the configured credentials.
    #[must_use]
    pub const fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Returns the asset code when configured or already discovered.
    #[must_use]
    pub fn asset_code(&self) -> Option<&str> {
        self.asset_code.get().map(String::as_str)
    }

    /// Records a discovered asset code if none is set yet.
    ///
    /// Returns `false` when a value was already present; the existing value is kept.
    pub fn offer_asset_code(&self, code: impl Into<String>) -> bool {
        self.asset_code.set(code.into()).is_ok()
    }

    /// Returns the asset code, running `discover` once when it is absent.
    ///
    /// # Errors
    ///
    /// Returns the discovery error when the code is absent and discovery fails.
    pub async fn asset_code_or_discover<F, Fut, E>(&self, discover: F) -> Result<&str, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        self.asset_code.get_or_try_init(discover).await.map(String::as_str)
    }
}
