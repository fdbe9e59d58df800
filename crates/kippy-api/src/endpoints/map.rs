// Map action endpoint
//
// One endpoint drives both location polling and live-tracking control:
// a bare call returns the current location snapshot, `app_action` codes
// toggle device behavior.

use serde_json::{Map, Value};
use tracing::debug;

use crate::client::{KIPPYMAP_ACTION_PATH, KippyClient};
use crate::error::Error;
use crate::models::MapActionResponse;

/// App-action code enabling live tracking.
pub const APP_ACTION_LIVE_TRACKING_ON: i64 = 1;
/// App-action code disabling live tracking.
pub const APP_ACTION_LIVE_TRACKING_OFF: i64 = 2;

pub const LOCALIZATION_TECHNOLOGY_LBS: &str = "LBS (Low accuracy)";
pub const LOCALIZATION_TECHNOLOGY_GPS: &str = "GPS";
pub const LOCALIZATION_TECHNOLOGY_WIFI: &str = "Wifi";

impl KippyClient {
    /// Perform a map action for a specific device.
    ///
    /// `POST /v2/kippymap_action.php`
    ///
    /// With no `app_action` this is a plain location poll. `do_sms`
    /// asks the backend to wake the device over SMS; `geofence_id`
    /// scopes geofence actions.
    pub async fn kippymap_action(
        &self,
        kippy_id: i64,
        do_sms: bool,
        app_action: Option<i64>,
        geofence_id: Option<i64>,
    ) -> Result<MapActionResponse, Error> {
        let mut payload = self.authenticated_payload().await?;
        payload.insert("kippy_id".into(), kippy_id.into());
        payload.insert("do_sms".into(), i64::from(do_sms).into());
        if let Some(action) = app_action {
            payload.insert("app_action".into(), action.into());
        }
        if let Some(geofence) = geofence_id {
            payload.insert("geofence_id".into(), geofence.into());
        }

        debug!(kippy_id, ?app_action, "map action");
        let data = self
            .post_with_refresh(KIPPYMAP_ACTION_PATH, &mut payload)
            .await?;

        // Newer servers nest the snapshot under `data`; older ones
        // answer flat.
        let mut response = match data.get("data") {
            Some(Value::Object(obj)) => obj.clone(),
            _ => data.as_object().cloned().unwrap_or_default(),
        };

        rename_field(&mut response, "lat", "gps_latitude");
        rename_field(&mut response, "lng", "gps_longitude");
        rename_field(&mut response, "radius", "gps_accuracy");
        rename_field(&mut response, "altitude", "gps_altitude");

        // Note the vendor's spelling of the source key.
        if let Some(tech) = response.get("localization_tecnology") {
            let label = localization_label(tech);
            response.insert("localization_technology".into(), label.into());
        }

        serde_json::from_value(Value::Object(response)).map_err(|e| Error::Deserialization {
            message: format!("map action: {e}"),
            body: data.to_string(),
        })
    }
}

fn rename_field(obj: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = obj.remove(from) {
        obj.insert(to.into(), value);
    }
}

/// Resolve a localization-technology code to its label; unmapped codes
/// pass through as their string form.
fn localization_label(code: &Value) -> String {
    let raw = match code {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    match raw.as_str() {
        "1" => LOCALIZATION_TECHNOLOGY_LBS.to_owned(),
        "2" => LOCALIZATION_TECHNOLOGY_GPS.to_owned(),
        "3" => LOCALIZATION_TECHNOLOGY_WIFI.to_owned(),
        _ => raw,
    }
}
