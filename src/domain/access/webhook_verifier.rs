//! Payment webhook signature verification.
//!
//! The provider signs the raw request body with HMAC-SHA256 and sends the
//! hex digest in `X-Webhook-Signature`, optionally prefixed with `sha256=`.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::payment_event::PaymentEvent;
use super::webhook_errors::WebhookError;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Verifier for payment webhook signatures.
///
/// Without a secret every payload is accepted unverified.
pub struct PaymentWebhookVerifier {
    secret: Option<SecretString>,
}

impl PaymentWebhookVerifier {
    /// Creates a verifier that checks signatures against `secret`.
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret: Some(secret),
        }
    }

    /// Creates a verifier that accepts unsigned payloads.
    pub fn unsigned() -> Self {
        Self { secret: None }
    }

    pub fn from_optional(secret: Option<SecretString>) -> Self {
        Self { secret }
    }

    /// True when signatures are checked.
    pub fn is_enforcing(&self) -> bool {
        self.secret.is_some()
    }

    /// Verifies the signature (when enforcing) and parses the event.
    ///
    /// # Errors
    ///
    /// - `MissingSignature` - enforcing and no header was sent
    /// - `InvalidSignature` - header is not hex or does not match
    /// - `ParseError` - payload is not a valid event
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<PaymentEvent, WebhookError> {
        if let Some(secret) = &self.secret {
            let header = signature_header.ok_or(WebhookError::MissingSignature)?;
            let provided = decode_signature(header)?;
            let expected = compute_signature(secret.expose_secret(), payload)?;

            if !constant_time_compare(&expected, &provided) {
                return Err(WebhookError::InvalidSignature);
            }
        }

        serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))
    }
}

fn decode_signature(header: &str) -> Result<Vec<u8>, WebhookError> {
    let hex_digest = header.trim();
    let hex_digest = hex_digest.strip_prefix("sha256=").unwrap_or(hex_digest);
    hex::decode(hex_digest).map_err(|_| WebhookError::InvalidSignature)
}

fn compute_signature(secret: &str, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes the hex signature a provider would send, for test fixtures.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, payload: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
