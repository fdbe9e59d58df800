// Wire models for Kippy API responses
//
// Fields use `#[serde(default)]` liberally because the API is
// inconsistent about field presence across server generations, and
// numeric fields arrive as numbers or strings depending on endpoint.
// Everything not modeled explicitly lands in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Pet / device record ──────────────────────────────────────────────

/// One entry from the pet list endpoint.
///
/// A pet may have zero or one associated tracking device (`kippy_id`).
/// `expired_days < 0` means the subscription is active with that many
/// days remaining; `>= 0` means expired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetRecord {
    #[serde(rename = "petID", deserialize_with = "de::int_flex")]
    pub pet_id: i64,
    #[serde(
        default,
        rename = "kippyID",
        alias = "kippy_id",
        deserialize_with = "de::opt_int_flex"
    )]
    pub kippy_id: Option<i64>,
    #[serde(default, rename = "petName")]
    pub pet_name: Option<String>,
    #[serde(default, rename = "petKind", deserialize_with = "de::opt_string_flex")]
    pub pet_kind: Option<String>,
    #[serde(default, rename = "kippyType")]
    pub kippy_type: Option<String>,
    #[serde(default, rename = "kippyFirmware")]
    pub kippy_firmware: Option<String>,
    #[serde(default, rename = "kippySerial")]
    pub kippy_serial: Option<String>,
    #[serde(default, rename = "kippyIMEI")]
    pub kippy_imei: Option<String>,
    #[serde(default, deserialize_with = "de::opt_int_flex")]
    pub expired_days: Option<i64>,
    /// Device check-in cadence in hours.
    #[serde(
        default,
        rename = "updateFrequency",
        deserialize_with = "de::opt_f64_flex"
    )]
    pub update_frequency: Option<f64>,
    /// Canonical GPS-by-default flag (0/1). The legacy field name is
    /// normalized by the pets endpoint before decoding.
    #[serde(
        default,
        rename = "gpsOnDefault",
        deserialize_with = "de::opt_int_flex"
    )]
    pub gps_on_default: Option<i64>,
    #[serde(
        default,
        rename = "energySavingMode",
        deserialize_with = "de::opt_int_flex"
    )]
    pub energy_saving_mode: Option<i64>,
    #[serde(
        default,
        rename = "needFirmwareUpgrade",
        deserialize_with = "de::opt_bool_flex"
    )]
    pub firmware_upgrade: Option<bool>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ── Map action response ──────────────────────────────────────────────

/// Location snapshot from the map action endpoint.
///
/// The endpoint renames the vendor's `lat`/`lng`/`radius`/`altitude`
/// keys to the canonical `gps_*` names and resolves the localization
/// technology code to its label before this type is decoded, so the
/// struct only sees canonical fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapActionResponse {
    #[serde(default, deserialize_with = "de::opt_f64_flex")]
    pub gps_latitude: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64_flex")]
    pub gps_longitude: Option<f64>,
    /// Accuracy radius in meters.
    #[serde(default, deserialize_with = "de::opt_f64_flex")]
    pub gps_accuracy: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64_flex")]
    pub gps_altitude: Option<f64>,
    /// Human-readable label, e.g. "GPS" or "LBS (Low accuracy)".
    #[serde(default)]
    pub localization_technology: Option<String>,
    /// Raw operating-status code (1=idle, 5=live, 18=energy saving).
    #[serde(default, deserialize_with = "de::opt_int_flex")]
    pub operating_status: Option<i64>,
    /// Last device contact with the backend, unix seconds.
    #[serde(default, deserialize_with = "de::opt_int_flex")]
    pub contact_time: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_int_flex")]
    pub fix_time: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_int_flex")]
    pub gps_time: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_int_flex")]
    pub lbs_time: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_int_flex")]
    pub next_call_time: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ── Activity categories ──────────────────────────────────────────────

/// Normalized activity statistics for one pet.
///
/// Both server response generations (nested `data` object vs. flat
/// `ActivitiesData`/`AVGData`/`HealthData` keys) normalize to this
/// shape. The inner values keep their wire form; interpretation is the
/// consumer's concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityCategories {
    pub activities: Option<Value>,
    pub avg: Option<Value>,
    pub health: Option<Value>,
}

// ── Lenient deserializers ────────────────────────────────────────────

/// Coercing deserializers for the vendor's loosely typed fields.
pub(crate) mod de {
    use serde::{Deserialize, Deserializer, de::Error as _};
    use serde_json::Value;

    pub(crate) fn coerce_i64(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub(crate) fn coerce_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub(crate) fn coerce_bool(value: &Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|i| i != 0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn int_flex<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        coerce_i64(&value).ok_or_else(|| D::Error::custom(format!("expected integer, got {value}")))
    }

    pub fn opt_int_flex<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(coerce_i64))
    }

    pub fn opt_f64_flex<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(coerce_f64))
    }

    pub fn opt_bool_flex<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<bool>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(coerce_bool))
    }

    pub fn opt_string_flex<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn pet_record_coerces_string_ids() {
        let pet: PetRecord = serde_json::from_value(json!({
            "petID": "12345",
            "kippyID": "99",
            "petName": "Rex",
            "petKind": 4,
            "expired_days": "-3",
            "updateFrequency": "1.5",
            "gpsOnDefault": "1",
        }))
        .expect("decode");

        assert_eq!(pet.pet_id, 12345);
        assert_eq!(pet.kippy_id, Some(99));
        assert_eq!(pet.pet_kind.as_deref(), Some("4"));
        assert_eq!(pet.expired_days, Some(-3));
        assert_eq!(pet.update_frequency, Some(1.5));
        assert_eq!(pet.gps_on_default, Some(1));
    }

    #[test]
    fn pet_record_keeps_unknown_fields() {
        let pet: PetRecord = serde_json::from_value(json!({
            "petID": 1,
            "kippyIMEI": "8673",
            "somethingNew": true,
        }))
        .expect("decode");

        assert_eq!(pet.kippy_imei.as_deref(), Some("8673"));
        assert_eq!(pet.extra.get("somethingNew"), Some(&json!(true)));
    }

    #[test]
    fn map_response_coerces_strings() {
        let map: MapActionResponse = serde_json::from_value(json!({
            "gps_latitude": "45.1",
            "gps_longitude": 7.6,
            "operating_status": "5",
            "contact_time": "1700000000",
        }))
        .expect("decode");

        assert_eq!(map.gps_latitude, Some(45.1));
        assert_eq!(map.gps_longitude, Some(7.6));
        assert_eq!(map.operating_status, Some(5));
        assert_eq!(map.contact_time, Some(1_700_000_000));
    }
}
