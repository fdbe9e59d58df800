// Return-code classification
//
// Every Kippy endpoint embeds its real success/failure status in a
// `return` field (legacy spelling: `Result`), independent of the HTTP
// status line. The field's type is unstable across endpoints and server
// generations -- int, numeric string, or bool -- so all interpretation
// goes through the one classifier here.

use std::fmt;

use serde_json::Value;
use tracing::debug;

/// Return code for authorization-expired sessions; triggers one forced
/// re-login + retry in the protocol client.
pub const CODE_AUTHORIZATION_EXPIRED: i64 = 6;
/// Return code for rejected credentials.
pub const CODE_INVALID_CREDENTIALS: i64 = 108;
/// Return codes the server uses for structurally invalid requests.
pub const CODES_MALFORMED_REQUEST: [i64; 2] = [105, 106];

/// Raw return code as found on the wire, normalized only as far as
/// parsing numeric strings into integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnCode {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl ReturnCode {
    /// `true` for the vendor's success values: integer `0` or boolean
    /// `true`.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Int(0) | Self::Bool(true))
    }

    pub fn is_authorization_expired(&self) -> bool {
        matches!(self, Self::Int(CODE_AUTHORIZATION_EXPIRED))
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Extract the return code from a decoded response body, if present.
///
/// Checks `return` first, then the legacy `Result` key. Booleans pass
/// through; numbers and numeric strings normalize to [`ReturnCode::Int`];
/// anything else is kept verbatim as [`ReturnCode::Text`].
pub fn return_code(data: &Value) -> Option<ReturnCode> {
    let obj = data.as_object()?;
    let raw = obj.get("return").or_else(|| obj.get("Result"))?;
    match raw {
        Value::Bool(b) => Some(ReturnCode::Bool(*b)),
        Value::Number(n) => n.as_i64().map(ReturnCode::Int),
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(n) => Some(ReturnCode::Int(n)),
            Err(_) => Some(ReturnCode::Text(s.clone())),
        },
        Value::Null => None,
        other => Some(ReturnCode::Text(other.to_string())),
    }
}

/// Human-readable reason for a failure return code.
///
/// Unknown codes are included verbatim in the message so nothing is
/// swallowed.
pub fn reason(code: &ReturnCode) -> String {
    let known = match code {
        ReturnCode::Int(n) if CODES_MALFORMED_REQUEST.contains(n) => Some("Malformed request"),
        ReturnCode::Int(CODE_AUTHORIZATION_EXPIRED) => Some("Authorization expired"),
        ReturnCode::Int(CODE_INVALID_CREDENTIALS) => Some("Invalid credentials"),
        ReturnCode::Bool(false) => Some("Subscription inactive"),
        _ => None,
    };
    match known {
        Some(msg) => format!("{msg} (code {code})"),
        None => format!("Unknown error code {code}"),
    }
}

/// Decode `text` as JSON, returning `None` on failure.
pub(crate) fn decode_json(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// Whether an HTTP 401 response should be treated as a success.
///
/// The vendor conflates HTTP status and business-logic status: some
/// endpoints answer 401 with a perfectly successful body. The body's own
/// return code wins when it is in the success set.
pub(crate) fn treat_401_as_success(path: &str, data: &Value) -> bool {
    match return_code(data) {
        None => {
            debug!("{path} returned HTTP 401 without return code, treating as failure");
            false
        }
        Some(code) if code.is_success() => true,
        Some(code) => {
            debug!("{path} returned Result={code}, treating as failure");
            false
        }
    }
}
