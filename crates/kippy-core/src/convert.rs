// ── Wire → domain conversion ──
//
// `kippy-api` hands back lenient wire models; this module turns them
// into the domain types consumers observe.

use chrono::{DateTime, TimeZone, Utc};

use kippy_api::{ActivityCategories, MapActionResponse, PetRecord};

use crate::model::{
    ActivitySnapshot, LocalizationTechnology, MapSnapshot, OperatingStatus, Pet, PetHardware,
    PetKind, SubscriptionStatus,
};

/// Convert a pet-list record into the domain `Pet`.
pub fn pet_from_record(record: &PetRecord) -> Pet {
    Pet {
        id: record.pet_id,
        kippy_id: record.kippy_id,
        name: record.pet_name.clone(),
        kind: PetKind::from_code(record.pet_kind.as_deref()),
        hardware: PetHardware {
            model: record.kippy_type.clone(),
            firmware: record.kippy_firmware.clone(),
            serial: record.kippy_serial.clone(),
            imei: record.kippy_imei.clone(),
        },
        subscription: SubscriptionStatus::from_expired_days(record.expired_days),
        update_frequency_hours: record.update_frequency,
        gps_on_default: record.gps_on_default.unwrap_or(0) != 0,
        energy_saving: record.energy_saving_mode.unwrap_or(0) != 0,
        firmware_upgradable: record.firmware_upgrade.unwrap_or(false),
    }
}

/// Convert a map action response into a domain snapshot for `pet_id`.
pub fn map_snapshot_from_response(pet_id: i64, resp: &MapActionResponse) -> MapSnapshot {
    MapSnapshot {
        pet_id,
        latitude: resp.gps_latitude,
        longitude: resp.gps_longitude,
        accuracy: resp.gps_accuracy,
        altitude: resp.gps_altitude,
        technology: resp
            .localization_technology
            .as_deref()
            .map(LocalizationTechnology::from_label),
        operating_status: resp.operating_status.map(OperatingStatus::from_code),
        contact_time: epoch_seconds(resp.contact_time),
        fix_time: epoch_seconds(resp.fix_time),
        gps_time: epoch_seconds(resp.gps_time),
        lbs_time: epoch_seconds(resp.lbs_time),
        next_call_time: epoch_seconds(resp.next_call_time),
    }
}

/// Convert normalized activity categories into a domain snapshot.
pub fn activity_snapshot_from_categories(
    pet_id: i64,
    categories: ActivityCategories,
) -> ActivitySnapshot {
    ActivitySnapshot {
        pet_id,
        activities: categories.activities,
        avg: categories.avg,
        health: categories.health,
    }
}

fn epoch_seconds(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| Utc.timestamp_opt(s, 0).single())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: serde_json::Value) -> PetRecord {
        serde_json::from_value(value).expect("pet record")
    }

    #[test]
    fn pet_conversion_maps_flags_and_expiry() {
        let pet = pet_from_record(&record(json!({
            "petID": 7,
            "kippyID": 70,
            "petName": "Luna",
            "petKind": "3",
            "kippyType": "Evo",
            "expired_days": -30,
            "updateFrequency": 2,
            "gpsOnDefault": 1,
            "energySavingMode": 0,
        })));

        assert_eq!(pet.id, 7);
        assert_eq!(pet.tracker_id(), 70);
        assert_eq!(pet.kind, PetKind::Cat);
        assert_eq!(pet.subscription.days_remaining(), Some(30));
        assert!(pet.is_active());
        assert_eq!(pet.update_frequency_hours, Some(2.0));
        assert!(pet.gps_on_default);
        assert!(!pet.energy_saving);
    }

    #[test]
    fn pet_without_device_uses_own_id() {
        let pet = pet_from_record(&record(json!({"petID": 9})));
        assert_eq!(pet.tracker_id(), 9);
        assert_eq!(pet.kind, PetKind::Unknown);
        assert!(pet.is_active());
    }

    #[test]
    fn expired_pet_is_inactive() {
        let pet = pet_from_record(&record(json!({"petID": 9, "expired_days": 2})));
        assert!(!pet.is_active());
        assert_eq!(pet.subscription, SubscriptionStatus::Expired);
    }

    #[test]
    fn map_conversion_decodes_status_and_times() {
        let resp: MapActionResponse = serde_json::from_value(json!({
            "gps_latitude": 45.0,
            "gps_longitude": 7.0,
            "localization_technology": "GPS",
            "operating_status": 5,
            "contact_time": 1_700_000_000,
        }))
        .expect("map response");

        let snapshot = map_snapshot_from_response(3, &resp);
        assert_eq!(snapshot.pet_id, 3);
        assert_eq!(snapshot.operating_status, Some(OperatingStatus::Live));
        assert_eq!(
            snapshot.technology,
            Some(LocalizationTechnology::Gps)
        );
        assert_eq!(
            snapshot.contact_time,
            Utc.timestamp_opt(1_700_000_000, 0).single()
        );
        assert!(snapshot.has_position());
    }

    #[test]
    fn activity_conversion_keeps_sections() {
        let snapshot = activity_snapshot_from_categories(
            4,
            ActivityCategories {
                activities: Some(json!([{"steps": 12}])),
                avg: None,
                health: Some(json!({})),
            },
        );
        assert_eq!(snapshot.pet_id, 4);
        assert_eq!(snapshot.activities, Some(json!([{"steps": 12}])));
        assert_eq!(snapshot.avg, None);
        assert_eq!(snapshot.health, Some(json!({})));
    }
}
