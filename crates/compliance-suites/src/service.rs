// crates/compliance-suites/src/service.rs
// ============================================================================
// Module: Service Suite
// Description: Generic capability, transport, and asset conformance checks.
// Purpose: Verify a service publishes its capabilities and serves its assets.
// Dependencies: compliance-core, compliance-http, async-trait, serde_json
// ============================================================================

//! ## Overview
//! The service suite discovers the service from `{base_url}/capabilities`,
//! then checks that the advertised service URL uses https and that the
//! configured (or first advertised) asset can be fetched and matches its
//! code.
//!
//! ```text
//! service.capabilities ──service_url──▶ service.transport
//!        │
//!        └──service_url──▶ service.asset ──asset_record──▶ service.asset_consistency
//! ```

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use compliance_core::Check;
use compliance_core::CheckError;
use compliance_core::CheckInput;
use compliance_core::CheckOutput;
use compliance_core::ContextValues;
use compliance_core::FailureKind;
use compliance_core::FailureKindInfo;
use compliance_core::GenericFailure;
use compliance_core::RunConfig;
use compliance_core::Suite;
use compliance_core::TestDefinition;
use compliance_core::TestResult;
use compliance_http::CaptureRequest;
use compliance_http::HttpCapture;
use compliance_http::ResponseBody;
use compliance_http::assert_schema;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Suite identifier.
pub const SUITE_ID: &str = "service";
/// Capability discovery test.
pub const CAPABILITIES: &str = "service.capabilities";
/// Transport security test.
pub const TRANSPORT: &str = "service.transport";
/// Asset retrieval test.
pub const ASSET: &str = "service.asset";
/// Asset record consistency test.
pub const ASSET_CONSISTENCY: &str = "service.asset_consistency";

/// Slot carrying the advertised service URL.
pub const SLOT_SERVICE_URL: &str = "service_url";
/// Slot carrying every advertised asset code.
pub const SLOT_ASSET_CODES: &str = "asset_codes";
/// Slot carrying the fetched asset record.
pub const SLOT_ASSET_RECORD: &str = "asset_record";

// ============================================================================
// SECTION: Failure Kinds
// ============================================================================

/// Failure kinds specific to the service suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceFailure {
    /// The advertised service URL does not use https.
    NoHttps {
        /// Advertised URL.
        url: String,
    },
    /// No asset code was configured and none could be discovered.
    AssetUnavailable {
        /// Why no asset code is available.
        reason: String,
    },
    /// The fetched asset record describes a different asset.
    AssetMismatch {
        /// Requested asset code.
        expected: String,
        /// Code found in the record, if any.
        actual: Option<String>,
    },
}

/// Catalog for [`ServiceFailure`].
const SERVICE_CATALOG: &[FailureKindInfo] = &[
    FailureKindInfo {
        name: "no_https",
        summary: "service url does not use https",
    },
    FailureKindInfo {
        name: "asset_unavailable",
        summary: "no asset code is configured or advertised",
    },
    FailureKindInfo {
        name: "asset_mismatch",
        summary: "asset record does not match the requested asset",
    },
];

impl FailureKind for ServiceFailure {
    fn catalog() -> &'static [FailureKindInfo] {
        SERVICE_CATALOG
    }

    fn name(&self) -> &'static str {
        match self {
            Self::NoHttps {
                ..
            } => "no_https",
            Self::AssetUnavailable {
                ..
            } => "asset_unavailable",
            Self::AssetMismatch {
                ..
            } => "asset_mismatch",
        }
    }

    fn render(&self) -> String {
        match self {
            Self::NoHttps {
                url,
            } => format!("service url {url} does not use https"),
            Self::AssetUnavailable {
                reason,
            } => format!("no asset code available: {reason}"),
            Self::AssetMismatch {
                expected,
                actual,
            } => match actual {
                Some(actual) => format!("asset record has code {actual}, expected {expected}"),
                None => format!("asset record has no code, expected {expected}"),
            },
        }
    }

    fn expected(&self) -> Option<Value> {
        match self {
            Self::AssetMismatch {
                expected, ..
            } => Some(json!(expected)),
            _ => None,
        }
    }

    fn actual(&self) -> Option<Value> {
        match self {
            Self::AssetMismatch {
                actual, ..
            } => Some(json!(actual)),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Suite Definition
// ============================================================================

/// Builds the service suite.
#[must_use]
pub fn suite(capture: &Arc<HttpCapture>) -> Suite {
    Suite::new(
        SUITE_ID,
        vec![
            TestDefinition::builder(CAPABILITIES, "discovery")
                .assertion("GET /capabilities returns a document matching the capabilities schema")
                .provides(SLOT_SERVICE_URL)
                .provides(SLOT_ASSET_CODES)
                .failure_kinds::<ServiceFailure>()
                .check(Arc::new(CapabilitiesCheck {
                    capture: Arc::clone(capture),
                })),
            TestDefinition::builder(TRANSPORT, "transport")
                .assertion("the advertised service url uses https")
                .depends_on(CAPABILITIES)
                .expects(SLOT_SERVICE_URL)
                .failure_kinds::<ServiceFailure>()
                .check(Arc::new(TransportCheck)),
            TestDefinition::builder(ASSET, "assets")
                .assertion("GET {service_url}/assets/{code} returns the asset record")
                .depends_on(CAPABILITIES)
                .expects(SLOT_SERVICE_URL)
                .provides(SLOT_ASSET_RECORD)
                .failure_kinds::<ServiceFailure>()
                .check(Arc::new(AssetCheck {
                    capture: Arc::clone(capture),
                })),
            TestDefinition::builder(ASSET_CONSISTENCY, "assets")
                .assertion("the asset record describes the requested asset")
                .depends_on(ASSET)
                .expects(SLOT_ASSET_RECORD)
                .failure_kinds::<ServiceFailure>()
                .check(Arc::new(AssetConsistencyCheck)),
        ],
    )
}

/// JSON schema for the capabilities document.
fn capabilities_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["service_url", "assets"],
        "properties": {
            "service_url": {"type": "string", "minLength": 1},
            "assets": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["code"],
                    "properties": {"code": {"type": "string", "minLength": 1}}
                }
            }
        }
    })
}

/// Extracts advertised asset codes from a schema-valid capabilities document.
fn asset_codes(document: &Value) -> Vec<String> {
    document
        .get("assets")
        .and_then(Value::as_array)
        .map(|assets| {
            assets
                .iter()
                .filter_map(|asset| asset.get("code").and_then(Value::as_str))
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Fetches and validates the capabilities document.
struct CapabilitiesCheck {
    /// Shared capture client.
    capture: Arc<HttpCapture>,
}

#[async_trait]
impl Check for CapabilitiesCheck {
    async fn run(&self, input: CheckInput) -> Result<CheckOutput, CheckError> {
        let config = &input.config;
        let url = format!("{}/capabilities", config.base_url());
        let mut result = TestResult::new();
        let request = CaptureRequest::get(url.clone()).credentials(config.credentials());
        let Some(body) = self.capture.call(&mut result, request, 200).await else {
            return Ok(CheckOutput::from_result(result));
        };
        let Some(document) = body.as_json() else {
            result.fail_with(&GenericFailure::MalformedBody {
                url,
                reason: "expected a json document".to_string(),
            });
            return Ok(CheckOutput::from_result(result));
        };
        if !assert_schema(&mut result, &capabilities_schema(), document) {
            return Ok(CheckOutput::from_result(result));
        }

        let codes = asset_codes(document);
        if let Some(first) = codes.first() {
            config.offer_asset_code(first.clone());
        }
        let provides = ContextValues::new()
            .with(SLOT_SERVICE_URL, document["service_url"].clone())
            .with(SLOT_ASSET_CODES, json!(codes));
        Ok(CheckOutput::with_provides(result, provides))
    }
}

/// Requires the advertised service URL to use https.
struct TransportCheck;

#[async_trait]
impl Check for TransportCheck {
    async fn run(&self, input: CheckInput) -> Result<CheckOutput, CheckError> {
        let url: String = input.expects.decode(SLOT_SERVICE_URL)?;
        let mut result = TestResult::new();
        if !url.to_ascii_lowercase().starts_with("https://") {
            result.fail_with(&ServiceFailure::NoHttps {
                url,
            });
        }
        Ok(CheckOutput::from_result(result))
    }
}

/// Fetches the record of the configured or discovered asset.
struct AssetCheck {
    /// Shared capture client.
    capture: Arc<HttpCapture>,
}

#[async_trait]
impl Check for AssetCheck {
    async fn run(&self, input: CheckInput) -> Result<CheckOutput, CheckError> {
        let service_url: String = input.expects.decode(SLOT_SERVICE_URL)?;
        let config = &input.config;
        let mut result = TestResult::new();
        let Some(code) = config.asset_code() else {
            result.fail_with(&ServiceFailure::AssetUnavailable {
                reason: "none configured and the service advertises none".to_string(),
            });
            return Ok(CheckOutput::from_result(result));
        };
        let url = format!("{}/assets/{code}", service_url.trim_end_matches('/'));
        let request = CaptureRequest::get(url.clone()).credentials(config.credentials());
        let Some(body) = self.capture.call(&mut result, request, 200).await else {
            return Ok(CheckOutput::from_result(result));
        };
        let Some(record) = body.as_json() else {
            result.fail_with(&GenericFailure::MalformedBody {
                url,
                reason: "expected a json document".to_string(),
            });
            return Ok(CheckOutput::from_result(result));
        };
        let provides = ContextValues::new().with(SLOT_ASSET_RECORD, record.clone());
        Ok(CheckOutput::with_provides(result, provides))
    }
}

/// Compares the fetched record with the requested asset code.
struct AssetConsistencyCheck;

#[async_trait]
impl Check for AssetConsistencyCheck {
    async fn run(&self, input: CheckInput) -> Result<CheckOutput, CheckError> {
        let record: Value = input.expects.decode(SLOT_ASSET_RECORD)?;
        let Some(expected) = input.config.asset_code() else {
            return Err(CheckError::new("asset code vanished after the asset was fetched"));
        };
        let actual = record.get("code").and_then(Value::as_str);
        let mut result = TestResult::new();
        if actual != Some(expected) {
            result.fail_with(&ServiceFailure::AssetMismatch {
                expected: expected.to_string(),
                actual: actual.map(ToString::to_string),
            });
        }
        Ok(CheckOutput::from_result(result))
    }
}

// ============================================================================
// SECTION: Default Discovery
// ============================================================================

/// Default discovery errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// The capabilities document could not be fetched or decoded.
    #[error("capabilities unavailable: {0}")]
    Unavailable(String),
    /// The service advertises no assets.
    #[error("service advertises no assets")]
    NoAssets,
}

/// Resolves the asset code once, before suites fan out.
///
/// A configured code is returned unchanged; otherwise the first asset listed
/// by `{base_url}/capabilities` is stored in `config` and returned.
///
/// # Errors
///
/// Returns [`DiscoveryError`] when no code is configured and discovery fails.
pub async fn discover_defaults(
    config: &RunConfig,
    capture: &HttpCapture,
) -> Result<String, DiscoveryError> {
    let code = config
        .asset_code_or_discover(|| async {
            let url = format!("{}/capabilities", config.base_url());
            let mut scratch = TestResult::new();
            let request = CaptureRequest::get(url).credentials(config.credentials());
            let body = capture.call(&mut scratch, request, 200).await;
            let Some(document) = body.as_ref().and_then(ResponseBody::as_json) else {
                let reason = scratch.failure.map_or_else(
                    || "expected a json document".to_string(),
                    |failure| failure.message,
                );
                return Err(DiscoveryError::Unavailable(reason));
            };
            asset_codes(document).into_iter().next().ok_or(DiscoveryError::NoAssets)
        })
        .await?;
    Ok(code.to_string())
}
