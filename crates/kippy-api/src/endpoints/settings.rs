// Device settings endpoint

use serde_json::Value;
use tracing::debug;

use crate::client::{KIPPYMAP_MODIFY_SETTINGS_PATH, KippyClient};
use crate::error::Error;

impl KippyClient {
    /// Modify settings for a specific device. Only provided fields are
    /// included in the request.
    ///
    /// `POST /v2/kippymap_modify_settings.php`
    ///
    /// `update_frequency` is the check-in cadence in hours, rounded to
    /// one decimal as the server requires.
    pub async fn modify_kippy_settings(
        &self,
        kippy_id: i64,
        update_frequency: Option<f64>,
        gps_on_default: Option<bool>,
        energy_saving_mode: Option<bool>,
    ) -> Result<Value, Error> {
        let mut payload = self.authenticated_payload().await?;
        payload.insert("modify_kippy_id".into(), kippy_id.into());

        if let Some(frequency) = update_frequency {
            payload.insert("update_frequency".into(), round_tenths(frequency).into());
        }
        if let Some(gps) = gps_on_default {
            payload.insert("gps_on_default".into(), gps.into());
        }
        if let Some(saving) = energy_saving_mode {
            payload.insert("energy_saving_mode".into(), i64::from(saving).into());
        }

        debug!(kippy_id, "modifying device settings");
        self.post_with_refresh(KIPPYMAP_MODIFY_SETTINGS_PATH, &mut payload)
            .await
    }
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
