// Shared transport configuration for building reqwest::Client instances.
//
// The vendor endpoint terminates TLS with a legacy profile that strict
// clients reject, so the lenient mode exists and is the default -- the
// same accommodation the vendor's own mobile clients ship with.

use std::time::Duration;

/// User agent sent on every request.
pub(crate) const USER_AGENT: &str = "kippy-rs/0.1 (+reqwest)";

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store (strict).
    System,
    /// Accept the vendor's legacy TLS profile. Default.
    #[default]
    LenientLegacy,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        match self.tls {
            TlsMode::System => {}
            TlsMode::LenientLegacy => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| crate::error::Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
