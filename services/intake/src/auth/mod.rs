//! Inbound request authentication.
//!
//! # Purpose
//! Hosts the webhook signature verifier and the legacy verification-token
//! check used by the Slack endpoints.
pub mod signature;

/// Compare a request's legacy verification token with the configured one.
///
/// Returns `true` when no token is configured.
pub fn verification_token_matches(expected: Option<&str>, provided: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => provided
            .map(|provided| signature::constant_time_eq(expected.as_bytes(), provided.as_bytes()))
            .unwrap_or(false),
    }
}
