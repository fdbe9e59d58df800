// Kippy API HTTP client
//
// Wraps `reqwest::Client` with the vendor's request conventions: JSON
// bodies posted as text/plain, auth codes carried in every payload, and
// a return-code protocol that is interpreted independently of the HTTP
// status line. Endpoint operations (pets, map, activity, settings) are
// implemented as inherent methods via separate files to keep this module
// focused on transport and session mechanics.

use std::sync::{Arc, RwLock};

use reqwest::StatusCode;
use secrecy::SecretString;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::codes;
use crate::error::Error;
use crate::redact::{LOGIN_SENSITIVE_FIELDS, redact, redact_json};
use crate::session::{Credentials, Session, password_hashes};
use crate::transport::TransportConfig;

/// Production API host.
pub const DEFAULT_HOST: &str = "https://prod.kippyapi.eu";

pub(crate) const LOGIN_PATH: &str = "/v2/login.php";
pub(crate) const GET_PETS_PATH: &str = "/v2/GetPetKippyList.php";
pub(crate) const KIPPYMAP_ACTION_PATH: &str = "/v2/kippymap_action.php";
pub(crate) const KIPPYMAP_MODIFY_SETTINGS_PATH: &str = "/v2/kippymap_modify_settings.php";
pub(crate) const GET_ACTIVITY_CATEGORIES_PATH: &str = "/v2/vita/get_activities_cat.php";

// Fixed app-identity block the vendor expects from clients.
pub(crate) const APP_IDENTITY: &str = "evo";
const APP_IDENTITY_EVO: &str = "1";
const PLATFORM_DEVICE: &str = "10";
const APP_VERSION: &str = "2.9.9";
const LOGIN_TIMEZONE: f64 = 1.0;
const PHONE_COUNTRY_CODE: &str = "1";
const DEVICE_NAME: &str = "kippy-rs";

/// Async client for the Kippy vendor API.
///
/// Holds the cached [`Session`] and account credentials; all endpoint
/// methods seed their payloads with the current session codes and go
/// through [`post_with_refresh`](Self::post_with_refresh), which retries
/// exactly once after a forced re-login when the server signals an
/// expired session.
pub struct KippyClient {
    http: reqwest::Client,
    base_url: Url,
    session: RwLock<Option<Arc<Session>>>,
    credentials: RwLock<Option<Credentials>>,
}

impl KippyClient {
    /// Create a client for the production host with default transport.
    pub fn new() -> Result<Self, Error> {
        Self::with_transport(DEFAULT_HOST, &TransportConfig::default())
    }

    /// Create a client for an arbitrary host (tests, staging).
    pub fn with_transport(host: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = Url::parse(host.trim_end_matches('/'))?;
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            session: RwLock::new(None),
            credentials: RwLock::new(None),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(host: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(host.trim_end_matches('/'))?;
        Ok(Self {
            http,
            base_url,
            session: RwLock::new(None),
            credentials: RwLock::new(None),
        })
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The currently cached session, if any.
    pub fn session(&self) -> Option<Arc<Session>> {
        self.session.read().expect("session lock poisoned").clone()
    }

    fn credentials(&self) -> Option<Credentials> {
        self.credentials
            .read()
            .expect("credentials lock poisoned")
            .clone()
    }

    /// Build a full URL for a given API path.
    fn url(&self, path: &str) -> Url {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}")).expect("invalid API URL")
    }

    /// POST a JSON body with the vendor's fixed headers.
    ///
    /// The API insists on `text/plain` for JSON payloads.
    fn post_raw(&self, url: Url, body: String) -> reqwest::RequestBuilder {
        self.http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .header(reqwest::header::ACCEPT, "application/json, */*;q=0.8")
            .body(body)
    }

    // ── Authentication ──────────────────────────────────────────────

    /// Authenticate with the vendor and cache the session.
    ///
    /// Returns the cached session unless `force` is set or no session
    /// exists. A failed login leaves any previously cached session
    /// untouched; a successful one replaces it wholesale.
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
        force: bool,
    ) -> Result<Arc<Session>, Error> {
        if !force {
            if let Some(session) = self.session() {
                return Ok(session);
            }
        }

        let (sha256_hex, md5_hex) = password_hashes(password);
        let payload = serde_json::json!({
            "login_email": email,
            "login_password_hash": sha256_hex,
            "login_password_hash_md5": md5_hex,
            "app_identity": APP_IDENTITY,
            "app_identity_evo": APP_IDENTITY_EVO,
            "platform_device": PLATFORM_DEVICE,
            "app_version": APP_VERSION,
            "timezone": LOGIN_TIMEZONE,
            "phone_country_code": PHONE_COUNTRY_CODE,
            "token_device": Value::Null,
            "device_name": DEVICE_NAME,
        });

        let url = self.url(LOGIN_PATH);
        debug!(
            "Login request: {}",
            redact(&payload, &LOGIN_SENSITIVE_FIELDS)
        );

        let body = payload.to_string();
        let resp = self
            .post_raw(url, body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let text = resp.text().await.map_err(Error::Transport)?;
        debug!("Login response: {}", redact_json(&text));

        if !status.is_success() {
            debug!("Login failed: status={status}");
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status})"),
            });
        }

        let data: Value = serde_json::from_str(&text).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: text.clone(),
        })?;

        match codes::return_code(&data) {
            Some(code) if code.is_success() => {}
            Some(code) => {
                debug!("Login failed: return={code}");
                return Err(Error::Authentication {
                    message: codes::reason(&code),
                });
            }
            None => {
                debug!("Login failed: response carried no return code");
                return Err(Error::Authentication {
                    message: "login response carried no return code".into(),
                });
            }
        }

        let session = Session::from_login_response(data).ok_or_else(|| Error::Authentication {
            message: "login response missing session codes".into(),
        })?;
        let session = Arc::new(session);

        *self.session.write().expect("session lock poisoned") = Some(Arc::clone(&session));
        *self.credentials.write().expect("credentials lock poisoned") = Some(Credentials {
            email: email.to_owned(),
            password: password.clone(),
        });

        debug!("login successful");
        Ok(session)
    }

    /// Guarantee a valid session exists, reusing the cache.
    ///
    /// Fails with [`Error::NoCredentials`] if `login` was never called.
    pub async fn ensure_session(&self) -> Result<Arc<Session>, Error> {
        let creds = self.credentials().ok_or(Error::NoCredentials)?;
        self.login(&creds.email, &creds.password, false).await
    }

    /// Force a re-login and swap the fresh session codes into `payload`.
    ///
    /// Both codes are replaced before the caller retries, so a retried
    /// request never carries a mix of old and new codes.
    async fn refresh_login(&self, payload: &mut Map<String, Value>) -> Result<(), Error> {
        let creds = self.credentials().ok_or(Error::NoCredentials)?;
        let session = self.login(&creds.email, &creds.password, true).await?;
        payload.insert("app_code".into(), session.app_code.clone().into());
        payload.insert(
            "app_verification_code".into(),
            session.app_verification_code.clone().into(),
        );
        Ok(())
    }

    /// Build a payload seeded with the current session codes and app
    /// identity. Ensures a session first.
    pub(crate) async fn authenticated_payload(&self) -> Result<Map<String, Value>, Error> {
        let session = self.ensure_session().await?;
        let mut payload = Map::new();
        payload.insert("app_code".into(), session.app_code.clone().into());
        payload.insert(
            "app_verification_code".into(),
            session.app_verification_code.clone().into(),
        );
        payload.insert("app_identity".into(), APP_IDENTITY.into());
        Ok(payload)
    }

    // ── Protocol core ───────────────────────────────────────────────

    /// POST to the API, interpreting the body's return code and
    /// refreshing the login on authentication errors.
    ///
    /// At most one forced re-login and one retried request per call:
    /// - transport failures propagate immediately, no retry;
    /// - HTTP 401 whose body carries a success return code is a success
    ///   (the vendor conflates the two status channels);
    /// - any other error status, or an "authorization expired" return
    ///   code, triggers one re-login + retry on the first attempt;
    /// - every other failure code maps to [`Error::Protocol`] at once.
    pub async fn post_with_refresh(
        &self,
        path: &str,
        payload: &mut Map<String, Value>,
    ) -> Result<Value, Error> {
        let url = self.url(path);

        for attempt in 0..2u8 {
            debug!(
                "{path} request: {}",
                redact(&serde_json::Value::Object(payload.clone()), &[])
            );

            let body = Value::Object(payload.clone()).to_string();
            let resp = self
                .post_raw(url.clone(), body)
                .send()
                .await
                .map_err(Error::Transport)?;

            let status = resp.status();
            let text = resp.text().await.map_err(Error::Transport)?;
            debug!("{path} response: {}", redact_json(&text));

            let data = codes::decode_json(&text);

            // The 401-success exception comes before any status-based
            // error handling.
            if status == StatusCode::UNAUTHORIZED {
                if let Some(body) = data.as_ref() {
                    if codes::treat_401_as_success(path, body) {
                        return Ok(body.clone());
                    }
                }
            }

            if status.is_client_error() || status.is_server_error() {
                debug!("{path} failed: status={status}");
                if attempt == 0 {
                    self.refresh_login(payload).await?;
                    continue;
                }
                return Err(Error::Protocol {
                    message: format!("HTTP {status}: {}", preview(&text)),
                    code: None,
                });
            }

            let Some(body) = data else {
                return Err(Error::Deserialization {
                    message: format!("response from {path} is not valid JSON"),
                    body: text,
                });
            };

            match codes::return_code(&body) {
                Some(code) if code.is_success() => return Ok(body),
                Some(code) => {
                    debug!("{path} failed: return={code}");
                    if code.is_authorization_expired() && attempt == 0 {
                        self.refresh_login(payload).await?;
                        continue;
                    }
                    return Err(Error::Protocol {
                        message: codes::reason(&code),
                        code: Some(code),
                    });
                }
                None => {
                    debug!("{path} failed: response carried no return code");
                    return Err(Error::Protocol {
                        message: "response carried no return code".into(),
                        code: None,
                    });
                }
            }
        }

        // Both attempts ended in a `continue`; cannot happen since the
        // second attempt always returns.
        Err(Error::Protocol {
            message: "retry attempts exhausted".into(),
            code: None,
        })
    }
}

/// Truncate a response body for error messages.
fn preview(text: &str) -> &str {
    &text[..text.len().min(200)]
}
