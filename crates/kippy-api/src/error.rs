use thiserror::Error;

use crate::codes::ReturnCode;

/// Top-level error type for the `kippy-api` crate.
///
/// Covers every failure mode of the vendor API surface: authentication,
/// transport, and the business-logic "return code" protocol. `kippy-core`
/// maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login explicitly rejected by the vendor (wrong credentials,
    /// inactive subscription, malformed request).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// An authenticated operation was attempted before any login.
    #[error("No credentials cached -- call login first")]
    NoCredentials,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    /// Never retried by the protocol client.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or client construction failure.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Protocol ────────────────────────────────────────────────────
    /// Non-success return code, or an unrecoverable HTTP status after
    /// the single retry. Carries the mapped human-readable reason and,
    /// when the body had one, the raw return code.
    #[error("Kippy API error: {message}")]
    Protocol {
        message: String,
        code: Option<ReturnCode>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the session is no longer
    /// valid and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        match self {
            Self::Authentication { .. } => true,
            Self::Protocol { code, .. } => {
                matches!(code, Some(c) if c.is_authorization_expired())
            }
            _ => false,
        }
    }

    /// Returns `true` if this is a transient transport error worth
    /// retrying at a higher layer.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Extract the raw API return code, if the failure carried one.
    pub fn return_code(&self) -> Option<&ReturnCode> {
        match self {
            Self::Protocol { code, .. } => code.as_ref(),
            _ => None,
        }
    }
}
