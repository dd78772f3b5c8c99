// crates/compliance-http/src/capture.rs
// ============================================================================
// Module: Request/Response Capture
// Description: Issues one outbound request and records it on a test result.
// Purpose: Map transport, status, and body problems onto generic failure kinds.
// Dependencies: compliance-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`HttpCapture::call`] sends one request, reads the response body exactly
//! once under a hard byte limit, and appends a [`NetworkCall`] to the
//! [`TestResult`]. On a status mismatch or an undecodable body it records a
//! failure and returns `None`; otherwise it returns the decoded body.
//!
//! Security posture: redirects are never followed, bearer tokens are attached
//! to the request only and never copied into captured records.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use compliance_core::CapturedBody;
use compliance_core::Credentials;
use compliance_core::Failure;
use compliance_core::GenericFailure;
use compliance_core::NetworkCall;
use compliance_core::RequestRecord;
use compliance_core::ResponseRecord;
use compliance_core::TestResult;
use reqwest::Client;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use reqwest::redirect::Policy;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for outbound capture requests.
///
/// # Invariants
/// - `timeout_ms` applies to the full request lifecycle.
/// - `max_response_bytes` is a hard upper bound on response bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_response_bytes: 4 * 1024 * 1024,
            user_agent: "compliance-harness/0.1".to_string(),
        }
    }
}

/// Capture client construction errors.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The underlying HTTP client could not be built.
    #[error("http client build failed: {0}")]
    ClientBuild(String),
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Outbound request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    None,
    /// JSON document.
    Json(Value),
    /// Plain text.
    Text(String),
    /// Multipart form with text fields, in order.
    Multipart(Vec<(String, String)>),
}

impl RequestBody {
    /// Returns the content type recorded for this body.
    fn content_type(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Json(_) => Some("application/json".to_string()),
            Self::Text(_) => Some("text/plain".to_string()),
            Self::Multipart(_) => Some("multipart/form-data".to_string()),
        }
    }
}

/// One outbound request.
#[derive(Clone)]
pub struct CaptureRequest {
    /// HTTP method.
    method: Method,
    /// Absolute request URL.
    url: String,
    /// Request body.
    body: RequestBody,
    /// Bearer token attached as an `Authorization` header.
    bearer: Option<String>,
}

impl CaptureRequest {
    /// Creates a request with no body.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: RequestBody::None,
            bearer: None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Sets a plain-text body.
    #[must_use]
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = RequestBody::Text(body.into());
        self
    }

    /// Sets a multipart body from text fields.
    #[must_use]
    pub fn multipart<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Multipart(
            fields.into_iter().map(|(name, value)| (name.into(), value.into())).collect(),
        );
        self
    }

    /// Attaches bearer credentials when present.
    #[must_use]
    pub fn credentials(mut self, credentials: Option<&Credentials>) -> Self {
        self.bearer = credentials.map(|creds| creds.bearer_token().to_string());
        self
    }

    /// Returns the request URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the request body.
    #[must_use]
    pub const fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Returns the diagnostic record for this request.
    fn record(&self) -> RequestRecord {
        RequestRecord {
            method: self.method.as_str().to_string(),
            url: self.url.clone(),
            content_type: self.body.content_type(),
        }
    }
}

impl std::fmt::Debug for CaptureRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("body", &self.body)
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// JSON document, for JSON content types.
    Json(Value),
    /// UTF-8 text, for every other content type.
    Text(String),
}

impl ResponseBody {
    /// Returns the JSON document, if any.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Returns the text body, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }

    /// Returns the captured form of this body.
    fn captured(&self) -> CapturedBody {
        match self {
            Self::Json(value) => CapturedBody::Json(value.clone()),
            Self::Text(text) => CapturedBody::Text(text.clone()),
        }
    }
}

/// Body read errors.
#[derive(Debug)]
enum BodyError {
    /// The body exceeded the configured limit.
    TooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },
    /// The body stream failed.
    Read(String),
}

impl BodyError {
    /// Renders the error for a failure message.
    fn describe(&self) -> String {
        match self {
            Self::TooLarge {
                limit,
            } => format!("response body exceeds {limit} bytes"),
            Self::Read(reason) => format!("failed to read response body: {reason}"),
        }
    }
}

// ============================================================================
// SECTION: Capture Client
// ============================================================================

/// HTTP client that records every exchange on the calling check's result.
#[derive(Debug, Clone)]
pub struct HttpCapture {
    /// Capture configuration.
    config: CaptureConfig,
    /// Shared HTTP client.
    client: Client,
}

impl HttpCapture {
    /// Builds a capture client.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] when the HTTP client cannot be created.
    pub fn new(config: CaptureConfig) -> Result<Self, CaptureError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|err| CaptureError::ClientBuild(err.to_string()))?;
        Ok(Self {
            config,
            client,
        })
    }

    /// Returns the capture configuration.
    #[must_use]
    pub const fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Issues `request`, records it on `result`, and returns the decoded body
    /// when the response status equals `expected_status`.
    pub async fn call(
        &self,
        result: &mut TestResult,
        request: CaptureRequest,
        expected_status: u16,
    ) -> Option<ResponseBody> {
        let record = request.record();
        let url = request.url.clone();

        let response = match self.send(request).await {
            Ok(response) => response,
            Err(err) => {
                result.push_call(NetworkCall {
                    request: record,
                    response: None,
                });
                if err.is_builder() {
                    result.fail(Failure::unexpected(format!("invalid request to {url}: {err}")));
                } else {
                    result.fail_with(&GenericFailure::ConnectionRefused {
                        url,
                        reason: err.to_string(),
                    });
                }
                return None;
            }
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let raw = read_body_limited(response, self.config.max_response_bytes).await;
        let decoded = raw
            .map_err(|err| err.describe())
            .and_then(|bytes| decode_body(content_type.as_deref(), &bytes));

        let captured = decoded.as_ref().map_or(CapturedBody::Omitted, ResponseBody::captured);
        result.push_call(NetworkCall {
            request: record,
            response: Some(ResponseRecord {
                status,
                content_type,
                body: captured,
            }),
        });

        if status != expected_status {
            result.fail_with(&GenericFailure::UnexpectedStatus {
                url,
                expected: expected_status,
                actual: status,
            });
            return None;
        }
        match decoded {
            Ok(body) => Some(body),
            Err(reason) => {
                result.fail_with(&GenericFailure::MalformedBody {
                    url,
                    reason,
                });
                None
            }
        }
    }

    /// Builds and sends a request.
    async fn send(&self, request: CaptureRequest) -> Result<reqwest::Response, reqwest::Error> {
        let mut builder = self.client.request(request.method, &request.url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match request.body {
            RequestBody::None => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Text(text) => builder.header(CONTENT_TYPE, "text/plain").body(text),
            RequestBody::Multipart(fields) => {
                let form =
                    fields.into_iter().fold(Form::new(), |form, (name, value)| form.text(name, value));
                builder.multipart(form)
            }
        };
        builder.send().await
    }
}

// ============================================================================
// SECTION: Body Helpers
// ============================================================================

/// Reads a response body while enforcing a hard byte limit.
async fn read_body_limited(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, BodyError> {
    if let Some(expected) = response.content_length()
        && usize::try_from(expected).map_or(true, |expected| expected > limit)
    {
        return Err(BodyError::TooLarge {
            limit,
        });
    }
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|err| BodyError::Read(err.to_string()))? {
        if body.len().saturating_add(chunk.len()) > limit {
            return Err(BodyError::TooLarge {
                limit,
            });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Decodes a body as JSON for JSON content types, otherwise as UTF-8 text.
fn decode_body(content_type: Option<&str>, bytes: &[u8]) -> Result<ResponseBody, String> {
    let is_json = content_type.is_some_and(|value| {
        let essence = value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        essence == "application/json" || essence.ends_with("+json")
    });
    if is_json {
        return serde_json::from_slice(bytes)
            .map(ResponseBody::Json)
            .map_err(|err| format!("invalid json: {err}"));
    }
    String::from_utf8(bytes.to_vec())
        .map(ResponseBody::Text)
        .map_err(|err| format!("invalid utf-8: {err}"))
}
