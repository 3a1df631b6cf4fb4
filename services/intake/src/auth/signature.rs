//! Slack request signature verification.
//!
//! # Purpose and responsibility
//! Authenticates inbound webhook requests by recomputing the `v0` HMAC-SHA256
//! signature over the raw request body and comparing it with the value the
//! platform sent in `X-Slack-Signature`.
//!
//! # Key invariants and assumptions
//! - The signed base string is `v0:{timestamp}:{raw body}` over the exact
//!   bytes received; the body must not be re-encoded before verification.
//! - Comparison is constant-time over the full hex signature.
//! - A [`VerifiedRequest`] can only be obtained from this module.
//!
//! # Security considerations
//! - The signing secret is never logged or included in error messages.
//! - Timestamps outside the configured age window are rejected to limit
//!   replay of captured requests.
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_VERSION: &str = "v0";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing request signature or timestamp")]
    MissingCredentials,
    #[error("invalid request signature")]
    SignatureMismatch,
    #[error("malformed request timestamp")]
    MalformedTimestamp,
    #[error("request timestamp outside the accepted window")]
    StaleTimestamp,
}

/// Proof that a single request passed signature verification.
///
/// Holds the exact body bytes that were signed; downstream parsing reads the
/// body through [`VerifiedRequest::body`] so it cannot run on unverified input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedRequest<'a> {
    timestamp: String,
    body: &'a [u8],
}

impl<'a> VerifiedRequest<'a> {
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn body(&self) -> &'a [u8] {
        self.body
    }
}

/// Compute the `v0=<hex>` signature for a request.
pub fn compute_signature(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("hmac accepts keys of any length"));
    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    format!(
        "{SIGNATURE_VERSION}={}",
        hex::encode(mac.finalize().into_bytes())
    )
}

/// Verify a request signature without any timestamp window check.
///
/// # Errors
/// - [`AuthError::MissingCredentials`] when either header is absent or blank.
/// - [`AuthError::SignatureMismatch`] when the signature does not match.
pub fn verify_signature<'a>(
    body: &'a [u8],
    timestamp: Option<&str>,
    signature: Option<&str>,
    secret: &str,
) -> Result<VerifiedRequest<'a>, AuthError> {
    let timestamp = timestamp
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingCredentials)?;
    let signature = signature
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingCredentials)?;

    let expected = compute_signature(secret, timestamp, body);
    if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
        return Err(AuthError::SignatureMismatch);
    }
    Ok(VerifiedRequest {
        timestamp: timestamp.to_string(),
        body,
    })
}

/// Signature verifier bound to a signing secret and replay window.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
    max_age: Option<Duration>,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"<redacted>")
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl SignatureVerifier {
    /// `max_age` of `None` disables the timestamp window check.
    pub fn new(secret: impl Into<String>, max_age: Option<Duration>) -> Self {
        Self {
            secret: secret.into(),
            max_age,
        }
    }

    /// Verify a request against the current unix time `now`.
    ///
    /// The signature is checked before the timestamp window so that a forged
    /// request never learns anything about clock skew.
    pub fn verify<'a>(
        &self,
        body: &'a [u8],
        timestamp: Option<&str>,
        signature: Option<&str>,
        now: i64,
    ) -> Result<VerifiedRequest<'a>, AuthError> {
        let verified = verify_signature(body, timestamp, signature, &self.secret)?;
        if let Some(max_age) = self.max_age {
            let sent = verified
                .timestamp()
                .parse::<i64>()
                .map_err(|_| AuthError::MalformedTimestamp)?;
            let age = now.saturating_sub(sent).unsigned_abs();
            if age > max_age.as_secs() {
                return Err(AuthError::StaleTimestamp);
            }
        }
        Ok(verified)
    }
}

pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (left, right) in a.iter().zip(b.iter()) {
        diff |= left ^ right;
    }
    diff == 0
}
