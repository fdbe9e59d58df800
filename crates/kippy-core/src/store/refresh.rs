// ── Snapshot application logic ──
//
// Applies poll results into the DataStore. Pet lists replace wholesale;
// map snapshots pass through the LBS position guard; activity data
// replaces per pet.

use chrono::Utc;
use tracing::debug;

use super::DataStore;
use crate::model::{ActivitySnapshot, MapSnapshot, OperatingStatus, Pet};

impl DataStore {
    /// Apply a full pet-list refresh.
    ///
    /// Replaces all records wholesale; pets absent from the new list are
    /// dropped along with their snapshots. Poll preferences survive --
    /// they are local-only state.
    pub(crate) fn apply_pet_list(&self, pets: Vec<Pet>) {
        let ids: Vec<i64> = pets.iter().map(|p| p.id).collect();
        self.pets.replace_all(pets.into_iter().map(|p| (p.id, p)));

        for stale in self
            .map_snapshots
            .snapshot()
            .iter()
            .map(|s| s.pet_id)
            .filter(|id| !ids.contains(id))
            .collect::<Vec<_>>()
        {
            self.map_snapshots.remove(stale);
            self.activities.remove(stale);
        }

        let _ = self.last_pet_refresh.send(Some(Utc::now()));
    }

    /// Apply one pet's map snapshot, honoring the LBS position guard.
    ///
    /// Also mirrors an energy-saving operating status into the pet
    /// record, matching what the next list refresh would report.
    pub(crate) fn apply_map_snapshot(&self, snapshot: MapSnapshot, ignore_lbs: bool) {
        let pet_id = snapshot.pet_id;
        let previous = self.map_snapshots.get(pet_id);
        let merged = merge_map_snapshot(previous.as_deref(), snapshot, ignore_lbs);

        if merged.operating_status == Some(OperatingStatus::EnergySaving) {
            if let Some(pet) = self.pets.get(pet_id) {
                if !pet.energy_saving {
                    let mut updated = (*pet).clone();
                    updated.energy_saving = true;
                    self.pets.upsert(pet_id, updated);
                }
            }
        }

        self.map_snapshots.upsert(pet_id, merged);
    }

    /// Replace one pet's activity snapshot.
    pub(crate) fn apply_activity_snapshot(&self, snapshot: ActivitySnapshot) {
        self.activities.upsert(snapshot.pet_id, snapshot);
    }

    /// Patch the stored operating status (optimistic command feedback).
    pub(crate) fn set_operating_status(&self, pet_id: i64, status: OperatingStatus) {
        if let Some(current) = self.map_snapshots.get(pet_id) {
            let mut updated = (*current).clone();
            updated.operating_status = Some(status);
            self.map_snapshots.upsert(pet_id, updated);
        }
    }

    /// Patch the stored pet record (optimistic command feedback; the
    /// next list refresh confirms or reverts it).
    pub(crate) fn patch_pet(&self, pet_id: i64, patch: impl FnOnce(&mut Pet)) -> bool {
        match self.pets.get(pet_id) {
            Some(pet) => {
                let mut updated = (*pet).clone();
                patch(&mut updated);
                self.pets.upsert(pet_id, updated);
                true
            }
            None => false,
        }
    }
}

/// Merge a freshly polled snapshot against the previous one.
///
/// An LBS fix is low-accuracy cell triangulation; while `ignore_lbs` is
/// set and a real position is already known, the old coordinates are
/// kept and only the non-position fields update. With no prior position
/// the LBS fix is accepted as better than nothing.
pub(crate) fn merge_map_snapshot(
    previous: Option<&MapSnapshot>,
    mut new: MapSnapshot,
    ignore_lbs: bool,
) -> MapSnapshot {
    let lbs_fix = new.technology.as_ref().is_some_and(|t| t.is_lbs());
    if !(ignore_lbs && lbs_fix) {
        return new;
    }

    match previous {
        Some(prev) if prev.has_position() => {
            debug!(pet_id = new.pet_id, "ignoring LBS location update");
            new.latitude = prev.latitude;
            new.longitude = prev.longitude;
            new.accuracy = prev.accuracy;
            new.altitude = prev.altitude;
            new
        }
        _ => {
            debug!(
                pet_id = new.pet_id,
                "accepting LBS location update as current location is unknown"
            );
            new
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LocalizationTechnology;

    fn gps_snapshot(pet_id: i64, lat: f64, lng: f64) -> MapSnapshot {
        MapSnapshot {
            latitude: Some(lat),
            longitude: Some(lng),
            accuracy: Some(10.0),
            technology: Some(LocalizationTechnology::Gps),
            ..MapSnapshot::empty(pet_id)
        }
    }

    fn lbs_snapshot(pet_id: i64, lat: f64, lng: f64) -> MapSnapshot {
        MapSnapshot {
            latitude: Some(lat),
            longitude: Some(lng),
            accuracy: Some(900.0),
            technology: Some(LocalizationTechnology::Lbs),
            ..MapSnapshot::empty(pet_id)
        }
    }

    #[test]
    fn lbs_fix_keeps_known_position() {
        let prev = gps_snapshot(1, 45.0, 7.0);
        let merged = merge_map_snapshot(Some(&prev), lbs_snapshot(1, 44.0, 6.0), true);
        assert_eq!(merged.latitude, Some(45.0));
        assert_eq!(merged.longitude, Some(7.0));
        assert_eq!(merged.accuracy, Some(10.0));
        // Non-position fields still reflect the new poll.
        assert!(merged.technology.as_ref().is_some_and(|t| t.is_lbs()));
    }

    #[test]
    fn lbs_fix_accepted_without_prior_position() {
        let merged = merge_map_snapshot(None, lbs_snapshot(1, 44.0, 6.0), true);
        assert_eq!(merged.latitude, Some(44.0));

        let empty_prev = MapSnapshot::empty(1);
        let merged = merge_map_snapshot(Some(&empty_prev), lbs_snapshot(1, 44.0, 6.0), true);
        assert_eq!(merged.latitude, Some(44.0));
    }

    #[test]
    fn guard_disabled_accepts_lbs() {
        let prev = gps_snapshot(1, 45.0, 7.0);
        let merged = merge_map_snapshot(Some(&prev), lbs_snapshot(1, 44.0, 6.0), false);
        assert_eq!(merged.latitude, Some(44.0));
    }

    #[test]
    fn gps_fix_always_replaces() {
        let prev = lbs_snapshot(1, 44.0, 6.0);
        let merged = merge_map_snapshot(Some(&prev), gps_snapshot(1, 45.0, 7.0), true);
        assert_eq!(merged.latitude, Some(45.0));
    }

    #[test]
    fn pet_list_replacement_drops_stale_snapshots() {
        let store = DataStore::new();
        store.apply_pet_list(vec![pet(1), pet(2)]);
        store.apply_map_snapshot(gps_snapshot(1, 45.0, 7.0), true);
        store.apply_map_snapshot(gps_snapshot(2, 45.0, 7.0), true);

        store.apply_pet_list(vec![pet(2)]);
        assert!(store.map_snapshot(1).is_none());
        assert!(store.map_snapshot(2).is_some());
        assert_eq!(store.pet_count(), 1);
    }

    #[test]
    fn energy_saving_status_mirrors_into_pet() {
        let store = DataStore::new();
        store.apply_pet_list(vec![pet(1)]);

        let mut snapshot = gps_snapshot(1, 45.0, 7.0);
        snapshot.operating_status = Some(OperatingStatus::EnergySaving);
        store.apply_map_snapshot(snapshot, true);

        assert!(store.pet_by_id(1).expect("pet").energy_saving);
    }

    #[test]
    fn refresh_settings_survive_pet_replacement() {
        let store = DataStore::new();
        store.apply_pet_list(vec![pet(1)]);
        store.set_idle_refresh(1, 120);

        store.apply_pet_list(vec![pet(1)]);
        assert_eq!(store.refresh_settings(1).idle_seconds, 120);
        assert_eq!(
            store.refresh_settings(1).live_seconds,
            crate::config::DEFAULT_LIVE_REFRESH_SECS
        );
    }

    fn pet(id: i64) -> Pet {
        use crate::model::{PetHardware, PetKind, SubscriptionStatus};
        Pet {
            id,
            kippy_id: Some(id * 10),
            name: None,
            kind: PetKind::Unknown,
            hardware: PetHardware::default(),
            subscription: SubscriptionStatus::from_expired_days(Some(-10)),
            update_frequency_hours: Some(2.0),
            gps_on_default: false,
            energy_saving: false,
            firmware_upgradable: false,
        }
    }
}
