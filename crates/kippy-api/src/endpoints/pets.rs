// Pet list endpoint

use serde_json::Value;
use tracing::debug;

use crate::client::{GET_PETS_PATH, KippyClient};
use crate::error::Error;
use crate::models::PetRecord;

const APP_SUB_IDENTITY: &str = "1";

impl KippyClient {
    /// Retrieve the list of pets (and their tracking devices) on the
    /// account.
    ///
    /// `POST /v2/GetPetKippyList.php`
    ///
    /// The legacy `enableGPSOnDefault` field is normalized into the
    /// canonical `gpsOnDefault` before decoding, so consumers only ever
    /// see the canonical name.
    pub async fn get_pet_kippy_list(&self) -> Result<Vec<PetRecord>, Error> {
        let mut payload = self.authenticated_payload().await?;
        payload.insert("app_sub_identity".into(), APP_SUB_IDENTITY.into());

        debug!("listing pets");
        let data = self.post_with_refresh(GET_PETS_PATH, &mut payload).await?;

        let mut pets = match data.get("data") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        for pet in &mut pets {
            normalize_gps_default(pet);
        }

        serde_json::from_value(Value::Array(pets)).map_err(|e| Error::Deserialization {
            message: format!("pet list: {e}"),
            body: data.to_string(),
        })
    }
}

/// Map the legacy `enableGPSOnDefault` field to canonical
/// `gpsOnDefault` (0/1), coercing string "true"/"1" forms. A record
/// that already carries the canonical field is left alone.
fn normalize_gps_default(pet: &mut Value) {
    let Some(obj) = pet.as_object_mut() else {
        return;
    };
    if obj.contains_key("gpsOnDefault") {
        return;
    }
    let Some(legacy) = obj.remove("enableGPSOnDefault") else {
        return;
    };

    let enabled = match &legacy {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(n) => n != 0,
            Err(_) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        },
        _ => false,
    };
    obj.insert("gpsOnDefault".into(), Value::from(i64::from(enabled)));
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn legacy_flag_becomes_canonical() {
        let mut pet = json!({"petID": 1, "enableGPSOnDefault": true});
        normalize_gps_default(&mut pet);
        assert_eq!(pet, json!({"petID": 1, "gpsOnDefault": 1}));

        let mut pet = json!({"petID": 2, "enableGPSOnDefault": false});
        normalize_gps_default(&mut pet);
        assert_eq!(pet, json!({"petID": 2, "gpsOnDefault": 0}));
    }

    #[test]
    fn string_forms_coerce() {
        for (raw, expected) in [("true", 1), ("1", 1), ("0", 0), ("nope", 0), ("7", 1)] {
            let mut pet = json!({"enableGPSOnDefault": raw});
            normalize_gps_default(&mut pet);
            assert_eq!(pet["gpsOnDefault"], json!(expected), "raw={raw}");
        }
    }

    #[test]
    fn canonical_field_wins() {
        let mut pet = json!({"gpsOnDefault": 0, "enableGPSOnDefault": true});
        normalize_gps_default(&mut pet);
        assert_eq!(pet["gpsOnDefault"], json!(0));
    }

    #[test]
    fn records_without_the_flag_are_untouched() {
        let mut pet = json!({"petID": 3});
        normalize_gps_default(&mut pet);
        assert_eq!(pet, json!({"petID": 3}));
    }
}
