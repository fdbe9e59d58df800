// ── Core error types ──
//
// User-facing errors from kippy-core. These are NOT API-specific --
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<kippy_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the Kippy API: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Tracker disconnected")]
    Disconnected,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Pet not found: {pet_id}")]
    PetNotFound { pet_id: i64 },

    #[error("Refresh failed: {message}")]
    UpdateFailed { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation rejected: {message}")]
    Rejected { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// The vendor return code, stringified, when the failure had one.
        code: Option<String>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<kippy_api::Error> for CoreError {
    fn from(err: kippy_api::Error) -> Self {
        match err {
            kippy_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            kippy_api::Error::NoCredentials => CoreError::AuthenticationFailed {
                message: "no credentials cached -- login first".into(),
            },
            kippy_api::Error::Transport(ref e) => {
                if e.is_connect() || e.is_timeout() {
                    CoreError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::UpdateFailed {
                        message: e.to_string(),
                    }
                }
            }
            kippy_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            kippy_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                reason: format!("TLS error: {msg}"),
            },
            kippy_api::Error::Protocol { message, code } => CoreError::Api {
                message,
                code: code.map(|c| c.to_string()),
            },
            kippy_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
