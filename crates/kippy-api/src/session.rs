// Session and credential types
//
// A Session is the cached artifact of a successful login: the two codes
// every authenticated payload must carry, plus the raw login body for
// fields the vendor adds over time. Sessions are immutable -- a re-login
// replaces the whole Arc, never individual fields.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Cached authentication artifact from a successful login.
///
/// Invariant: a session always has both codes. A login response missing
/// either one is rejected at the boundary, so no half-populated session
/// can exist.
#[derive(Debug, Clone)]
pub struct Session {
    pub app_code: String,
    pub app_verification_code: String,
    /// Full decoded login response body.
    pub raw: Value,
}

impl Session {
    /// Build a session from a decoded login response, or `None` if
    /// either code is absent.
    pub(crate) fn from_login_response(raw: Value) -> Option<Self> {
        let app_code = field_as_string(&raw, "app_code")?;
        let app_verification_code = field_as_string(&raw, "app_verification_code")?;
        Some(Self {
            app_code,
            app_verification_code,
            raw,
        })
    }
}

/// Account credentials, cached after the first successful login so the
/// client can re-login on session expiry without caller involvement.
#[derive(Debug, Clone)]
pub(crate) struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// Both password digests the login endpoint expects: SHA-256 for the
/// current auth scheme and MD5 for the vendor's legacy one.
pub(crate) fn password_hashes(password: &SecretString) -> (String, String) {
    let bytes = password.expose_secret().as_bytes();
    let sha256_hex = format!("{:x}", Sha256::digest(bytes));
    let md5_hex = format!("{:x}", md5::compute(bytes));
    (sha256_hex, md5_hex)
}

/// Read a field as a string, accepting both string and numeric wire
/// encodings.
fn field_as_string(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
