// ── Refresh scheduling ──
//
// Two cadences drive polling, both computed here and driven by the
// Tracker's per-pet tasks:
//
// - map polls run on a fixed interval chosen by operating mode
//   (live vs idle), suspended entirely in energy-saving mode;
// - activity refreshes fire once per expected device check-in,
//   `contact_time + update_frequency + slack` ahead of now.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::model::OperatingStatus;
use crate::store::MapRefreshSettings;

/// Inputs a pet's scheduling decisions depend on. The Tracker publishes
/// a fresh value through a `watch` channel whenever any of them change,
/// which cancels and replaces the pending timers.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct ScheduleInputs {
    pub operating_status: Option<OperatingStatus>,
    pub contact_time: Option<DateTime<Utc>>,
    pub update_frequency_hours: Option<f64>,
    pub refresh: MapRefreshSettings,
}

/// Map poll interval for the current operating mode, or `None` while
/// polling is suspended (energy saving).
pub fn poll_interval(
    status: Option<OperatingStatus>,
    refresh: MapRefreshSettings,
) -> Option<Duration> {
    match status {
        Some(OperatingStatus::EnergySaving) => None,
        Some(OperatingStatus::Live) => Some(Duration::from_secs(u64::from(refresh.live_seconds))),
        _ => Some(Duration::from_secs(u64::from(refresh.idle_seconds))),
    }
}

/// Delay until the next activity refresh for a device.
///
/// `contact_time + update_frequency_hours*3600 + activity_delay - now`,
/// floored at zero. `None` when either server-side input is missing --
/// no timer is scheduled then.
pub fn next_refresh_delay(
    contact_time: Option<DateTime<Utc>>,
    update_frequency_hours: Option<f64>,
    activity_delay: Duration,
    now: DateTime<Utc>,
) -> Option<Duration> {
    let contact = contact_time?;
    let frequency_hours = update_frequency_hours?;

    let frequency_secs = (frequency_hours * 3600.0) as i64;
    let due = contact.timestamp() + frequency_secs + activity_delay.as_secs() as i64;
    let remaining = due - now.timestamp();

    Some(Duration::from_secs(remaining.max(0) as u64))
}
