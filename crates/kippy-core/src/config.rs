// ── Runtime tracker configuration ──
//
// These types describe *how* to connect to the vendor API and how
// aggressively to poll. They carry credential data and tuning, but never
// touch disk -- the embedding host constructs a `TrackerConfig` and
// hands it in.

use std::time::Duration;

use secrecy::SecretString;

use kippy_api::{DEFAULT_HOST, TlsMode};

/// Default map poll cadence while a device idles, seconds.
pub const DEFAULT_IDLE_REFRESH_SECS: u32 = 300;
/// Default map poll cadence during live tracking, seconds.
pub const DEFAULT_LIVE_REFRESH_SECS: u32 = 10;
/// Default slack added after a device's expected check-in before the
/// activity refresh fires, minutes.
pub const DEFAULT_ACTIVITY_REFRESH_DELAY_MINS: u32 = 5;

/// Bounds for the pet-list refresh interval, minutes.
pub const MIN_DEVICE_UPDATE_INTERVAL_MINS: u32 = 5;
pub const MAX_DEVICE_UPDATE_INTERVAL_MINS: u32 = 1440;
pub const DEFAULT_DEVICE_UPDATE_INTERVAL_MINS: u32 = 60;

/// Configuration for a single Kippy account connection.
///
/// Built by the host, passed to `Tracker` -- core never reads config
/// files.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// API host (defaults to the production endpoint).
    pub host: String,
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: SecretString,
    /// TLS verification strategy.
    pub tls: TlsMode,
    /// Request timeout.
    pub timeout: Duration,
    /// Map poll cadence while idle, seconds.
    pub idle_refresh_secs: u32,
    /// Map poll cadence while live tracking, seconds.
    pub live_refresh_secs: u32,
    /// Slack after the expected device check-in before refreshing
    /// activity data, minutes.
    pub activity_refresh_delay_mins: u32,
    /// Minutes between pet-list refreshes. 0 = on demand only.
    pub device_update_interval_mins: u32,
    /// Hold the last known position through low-accuracy LBS fixes.
    pub ignore_lbs: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            email: String::new(),
            password: SecretString::from(String::new()),
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
            idle_refresh_secs: DEFAULT_IDLE_REFRESH_SECS,
            live_refresh_secs: DEFAULT_LIVE_REFRESH_SECS,
            activity_refresh_delay_mins: DEFAULT_ACTIVITY_REFRESH_DELAY_MINS,
            device_update_interval_mins: DEFAULT_DEVICE_UPDATE_INTERVAL_MINS,
            ignore_lbs: true,
        }
    }
}

/// Return a sanitized minutes value for the pet-list refresh interval,
/// or `None` when out of bounds.
pub fn normalize_device_update_interval(minutes: u32) -> Option<u32> {
    (MIN_DEVICE_UPDATE_INTERVAL_MINS..=MAX_DEVICE_UPDATE_INTERVAL_MINS)
        .contains(&minutes)
        .then_some(minutes)
}

/// Return `secs` as a positive refresh interval when valid.
pub fn normalize_refresh_secs(secs: u32) -> Option<u32> {
    (secs > 0).then_some(secs)
}
