// crates/compliance-http/tests/capture_calls.rs
// ============================================================================
// Module: HTTP Capture Tests
// Description: Tests for request capture against local tiny_http servers.
// Purpose: Verify failure mapping, body decoding, limits, and credentials.
// Dependencies: compliance-core, compliance-http, tiny_http, tokio
// ============================================================================

//! ## Overview
//! Each test starts a one-shot local server, issues a single capture call,
//! and inspects the decoded body, the recorded failure, and the captured
//! network call.

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

use std::net::SocketAddr;
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use compliance_core::CapturedBody;
use compliance_core::Credentials;
use compliance_core::TestResult;
use compliance_http::CaptureConfig;
use compliance_http::CaptureRequest;
use compliance_http::HttpCapture;
use compliance_http::ResponseBody;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Request details observed by the local server.
#[derive(Debug)]
struct Seen {
    method: String,
    url: String,
    authorization: Option<String>,
    content_type: Option<String>,
    body: String,
}

/// Serves exactly one response and reports the request it received.
fn one_shot(status: u16, content_type: &str, body: &str) -> (SocketAddr, mpsc::Receiver<Seen>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (sender, receiver) = mpsc::channel();
    let content_type = content_type.to_string();
    let body = body.to_string();
    thread::spawn(move || {
        if let Ok(mut request) = server.recv() {
            let header_value = |name: &'static str| {
                request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv(name))
                    .map(|header| header.value.as_str().to_string())
            };
            let authorization = header_value("Authorization");
            let request_type = header_value("Content-Type");
            let mut received = String::new();
            let _ = request.as_reader().read_to_string(&mut received);
            let _ = sender.send(Seen {
                method: request.method().to_string(),
                url: request.url().to_string(),
                authorization,
                content_type: request_type,
                body: received,
            });
            let header = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()).unwrap();
            let response = Response::from_string(body).with_status_code(status).with_header(header);
            let _ = request.respond(response);
        }
    });
    (addr, receiver)
}

fn capture() -> HttpCapture {
    HttpCapture::new(CaptureConfig::default()).unwrap()
}

/// Returns an address nothing listens on.
fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

// ============================================================================
// SECTION: Success Paths
// ============================================================================

#[tokio::test]
async fn json_response_is_decoded_and_recorded() {
    let (addr, seen) = one_shot(200, "application/json; charset=utf-8", r#"{"assets":["EUR"]}"#);
    let mut result = TestResult::new();
    let url = format!("http://{addr}/capabilities");

    let body = capture().call(&mut result, CaptureRequest::get(url.clone()), 200).await;

    assert_eq!(body, Some(ResponseBody::Json(json!({"assets": ["EUR"]}))));
    assert!(result.is_success());
    assert_eq!(result.network_calls.len(), 1);
    let call = &result.network_calls[0];
    assert_eq!(call.request.method, "GET");
    assert_eq!(call.request.url, url);
    let response = call.response.as_ref().unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, CapturedBody::Json(json!({"assets": ["EUR"]})));
    assert_eq!(seen.recv().unwrap().url, "/capabilities");
}

#[tokio::test]
async fn text_response_is_returned_as_text() {
    let (addr, _seen) = one_shot(200, "text/plain", "pong");
    let mut result = TestResult::new();
    let body = capture().call(&mut result, CaptureRequest::get(format!("http://{addr}/ping")), 200).await;
    assert_eq!(body.as_ref().and_then(ResponseBody::as_text), Some("pong"));
}

#[tokio::test]
async fn json_body_and_bearer_token_are_sent() {
    let (addr, seen) = one_shot(201, "application/json", "{}");
    let mut result = TestResult::new();
    let credentials = Credentials::bearer("s3cret");
    let request = CaptureRequest::post(format!("http://{addr}/assets"))
        .json(json!({"code": "EUR"}))
        .credentials(Some(&credentials));

    let body = capture().call(&mut result, request, 201).await;

    assert!(body.is_some());
    let seen = seen.recv().unwrap();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.authorization.as_deref(), Some("Bearer s3cret"));
    assert_eq!(serde_json::from_str::<serde_json::Value>(&seen.body).unwrap(), json!({"code": "EUR"}));
    let recorded = serde_json::to_string(&result.network_calls).unwrap();
    assert!(!recorded.contains("s3cret"));
    assert_eq!(result.network_calls[0].request.content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn multipart_fields_are_sent() {
    let (addr, seen) = one_shot(200, "text/plain", "ok");
    let mut result = TestResult::new();
    let request = CaptureRequest::post(format!("http://{addr}/upload"))
        .multipart([("account", "alice"), ("memo", "hello")]);

    capture().call(&mut result, request, 200).await;

    let seen = seen.recv().unwrap();
    assert!(seen.content_type.unwrap().starts_with("multipart/form-data"));
    assert!(seen.body.contains("name=\"account\""));
    assert!(seen.body.contains("alice"));
    assert!(seen.body.contains("hello"));
}

// ============================================================================
// SECTION: Failure Mapping
// ============================================================================

#[tokio::test]
async fn status_mismatch_fails_with_payloads() {
    let (addr, _seen) = one_shot(404, "application/json", r#"{"error":"missing"}"#);
    let mut result = TestResult::new();

    let body = capture().call(&mut result, CaptureRequest::get(format!("http://{addr}/x")), 200).await;

    assert!(body.is_none());
    let failure = result.failure.as_ref().unwrap();
    assert_eq!(failure.kind, "unexpected_status");
    assert_eq!(failure.expected, Some(json!(200)));
    assert_eq!(failure.actual, Some(json!(404)));
    let response = result.network_calls[0].response.as_ref().unwrap();
    assert_eq!(response.body, CapturedBody::Json(json!({"error": "missing"})));
}

#[tokio::test]
async fn unparsable_json_is_malformed_body() {
    let (addr, _seen) = one_shot(200, "application/json", "{not json");
    let mut result = TestResult::new();

    let body = capture().call(&mut result, CaptureRequest::get(format!("http://{addr}/x")), 200).await;

    assert!(body.is_none());
    assert_eq!(result.failure.as_ref().unwrap().kind, "malformed_body");
    let response = result.network_calls[0].response.as_ref().unwrap();
    assert_eq!(response.body, CapturedBody::Omitted);
}

#[tokio::test]
async fn oversized_body_is_malformed_body() {
    let (addr, _seen) = one_shot(200, "text/plain", &"x".repeat(4096));
    let mut result = TestResult::new();
    let capture = HttpCapture::new(CaptureConfig {
        max_response_bytes: 1024,
        ..CaptureConfig::default()
    })
    .unwrap();

    let body = capture.call(&mut result, CaptureRequest::get(format!("http://{addr}/x")), 200).await;

    assert!(body.is_none());
    let failure = result.failure.as_ref().unwrap();
    assert_eq!(failure.kind, "malformed_body");
    assert!(failure.message.contains("1024"));
}

#[tokio::test]
async fn unreachable_server_is_connection_refused() {
    let addr = closed_addr();
    let mut result = TestResult::new();

    let body = capture().call(&mut result, CaptureRequest::get(format!("http://{addr}/x")), 200).await;

    assert!(body.is_none());
    assert_eq!(result.failure.as_ref().unwrap().kind, "connection_refused");
    assert_eq!(result.network_calls.len(), 1);
    assert!(result.network_calls[0].response.is_none());
}

#[tokio::test]
async fn first_failure_is_kept_across_calls() {
    let addr = closed_addr();
    let (ok_addr, _seen) = one_shot(500, "text/plain", "boom");
    let mut result = TestResult::new();
    let capture = capture();

    capture.call(&mut result, CaptureRequest::get(format!("http://{addr}/a")), 200).await;
    capture.call(&mut result, CaptureRequest::get(format!("http://{ok_addr}/b")), 200).await;

    assert_eq!(result.failure.as_ref().unwrap().kind, "connection_refused");
    assert_eq!(result.network_calls.len(), 2);
}
