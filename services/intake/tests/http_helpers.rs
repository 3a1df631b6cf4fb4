#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use incident_intake::auth::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER, compute_signature};

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

/// A POST signed the way Slack signs webhook deliveries.
pub fn signed_request(
    uri: &str,
    content_type: &str,
    body: &str,
    secret: &str,
    timestamp: i64,
) -> Request<Body> {
    let timestamp = timestamp.to_string();
    let signature = compute_signature(secret, &timestamp, body.as_bytes());
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .header(TIMESTAMP_HEADER, timestamp)
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn signed_form(uri: &str, body: &str, secret: &str) -> Request<Body> {
    signed_request(
        uri,
        "application/x-www-form-urlencoded",
        body,
        secret,
        chrono::Utc::now().timestamp(),
    )
}
