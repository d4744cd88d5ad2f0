//! Webhook signature verification.
//!
//! The gateway signs each webhook over a canonical string built from the
//! request parameters: every parameter except `sig`, sorted by name, each
//! rendered as `&name=value` with `&` and `=` inside values replaced by
//! `_`. Depending on account configuration the signature is either a plain
//! MD5 over canonical-string + secret, or an HMAC-SHA256 keyed by the
//! secret. Verification fails closed: empty secret, missing or malformed
//! signature, digest mismatch, and stale timestamps all reject.

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Maximum accepted distance between the signed timestamp and the server
/// clock. Requests outside the window are treated as replays.
pub const MAX_CLOCK_SKEW_SECS: i64 = 15 * 60;

/// Digest scheme the gateway is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureMethod {
    /// Hex MD5 over canonical-string + secret.
    #[default]
    Md5Hash,
    /// Hex HMAC-SHA256 over the canonical string, keyed by the secret.
    HmacSha256,
}

impl SignatureMethod {
    /// Parse a configuration value. Accepts `md5hash` and `hmac-sha256`.
    pub fn from_config(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "md5hash" => Some(SignatureMethod::Md5Hash),
            "hmac-sha256" => Some(SignatureMethod::HmacSha256),
            _ => None,
        }
    }
}

/// Verify an inbound webhook signature.
///
/// `params` is the full set of request parameters (the `sig` field itself
/// is skipped when signing). `timestamp` is the gateway's unix-seconds
/// timestamp parameter, checked against `now` with a ±15 minute window.
/// Pure check — no side effects.
pub fn verify(
    params: &[(String, String)],
    provided_sig: &str,
    secret: &str,
    timestamp: &str,
    now: DateTime<Utc>,
    method: SignatureMethod,
) -> bool {
    if secret.is_empty() || provided_sig.is_empty() {
        return false;
    }
    if !timestamp_fresh(timestamp, now) {
        return false;
    }

    let expected = sign(params, secret, method);

    // Signatures are hex; compare the decoded bytes in constant time.
    let Ok(provided) = hex::decode(provided_sig.trim().to_lowercase()) else {
        return false;
    };
    let Ok(expected) = hex::decode(expected) else {
        return false;
    };
    provided.ct_eq(&expected).into()
}

/// Compute the hex signature the gateway would produce for `params`.
///
/// The counterpart of [`verify`]; also what a gateway simulator uses to
/// build test traffic.
pub fn sign(params: &[(String, String)], secret: &str, method: SignatureMethod) -> String {
    let signing_input = canonical_string(params);
    match method {
        SignatureMethod::Md5Hash => {
            let mut hasher = Md5::new();
            hasher.update(signing_input.as_bytes());
            hasher.update(secret.as_bytes());
            hex::encode(hasher.finalize())
        }
        SignatureMethod::HmacSha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
                .expect("infallible: HMAC accepts keys of any length");
            mac.update(signing_input.as_bytes());
            hex::encode(mac.finalize().into_bytes())
        }
    }
}

/// Canonical signing string: params except `sig`, sorted by name, each as
/// `&name=value` with `&`/`=` inside values replaced by `_`.
fn canonical_string(params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> =
        params.iter().filter(|(k, _)| k != "sig").collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = String::new();
    for (key, value) in sorted {
        out.push('&');
        out.push_str(key);
        out.push('=');
        out.push_str(&value.replace(['&', '='], "_"));
    }
    out
}

fn timestamp_fresh(timestamp: &str, now: DateTime<Utc>) -> bool {
    let Ok(secs) = timestamp.trim().parse::<i64>() else {
        return false;
    };
    let Some(signed_at) = Utc.timestamp_opt(secs, 0).single() else {
        return false;
    };
    (now - signed_at).num_seconds().abs() <= MAX_CLOCK_SKEW_SECS
}
