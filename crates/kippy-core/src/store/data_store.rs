// ── Central reactive data store ──
//
// Holds the pet list plus per-pet location and activity snapshots.
// Mutations are broadcast to subscribers via `watch` channels. The
// user-set idle/live refresh seconds live beside the snapshots so they
// survive wholesale snapshot replacement.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::watch;

use super::collection::EntityCollection;
use crate::config::{DEFAULT_IDLE_REFRESH_SECS, DEFAULT_LIVE_REFRESH_SECS};
use crate::model::{ActivitySnapshot, MapSnapshot, Pet};
use crate::stream::EntityStream;

/// Per-pet map poll cadence, user-adjustable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapRefreshSettings {
    pub idle_seconds: u32,
    pub live_seconds: u32,
}

impl Default for MapRefreshSettings {
    fn default() -> Self {
        Self {
            idle_seconds: DEFAULT_IDLE_REFRESH_SECS,
            live_seconds: DEFAULT_LIVE_REFRESH_SECS,
        }
    }
}

/// Central reactive store for all Kippy domain entities.
///
/// Thread-safe: reads are wait-free snapshots, writes use the
/// fine-grained per-shard locks inside `DashMap`.
pub struct DataStore {
    pub(crate) pets: EntityCollection<Pet>,
    pub(crate) map_snapshots: EntityCollection<MapSnapshot>,
    pub(crate) activities: EntityCollection<ActivitySnapshot>,
    /// Local-only poll preferences, preserved across snapshot
    /// replacement.
    pub(crate) refresh_settings: DashMap<i64, MapRefreshSettings>,
    pub(crate) last_pet_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl DataStore {
    pub fn new() -> Self {
        let (last_pet_refresh, _) = watch::channel(None);
        Self {
            pets: EntityCollection::new(),
            map_snapshots: EntityCollection::new(),
            activities: EntityCollection::new(),
            refresh_settings: DashMap::new(),
            last_pet_refresh,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    /// All pets, active and expired, ordered by id.
    pub fn pets_snapshot(&self) -> Arc<Vec<Arc<Pet>>> {
        self.pets.snapshot()
    }

    pub fn pet_by_id(&self, pet_id: i64) -> Option<Arc<Pet>> {
        self.pets.get(pet_id)
    }

    /// Pets that participate in polling (subscription active).
    pub fn active_pets(&self) -> Vec<Arc<Pet>> {
        self.pets
            .snapshot()
            .iter()
            .filter(|pet| pet.is_active())
            .cloned()
            .collect()
    }

    pub fn map_snapshot(&self, pet_id: i64) -> Option<Arc<MapSnapshot>> {
        self.map_snapshots.get(pet_id)
    }

    pub fn activity_snapshot(&self, pet_id: i64) -> Option<Arc<ActivitySnapshot>> {
        self.activities.get(pet_id)
    }

    pub fn pet_count(&self) -> usize {
        self.pets.len()
    }

    // ── Poll preferences ─────────────────────────────────────────────

    pub fn refresh_settings(&self, pet_id: i64) -> MapRefreshSettings {
        self.refresh_settings
            .get(&pet_id)
            .map_or_else(MapRefreshSettings::default, |r| *r.value())
    }

    pub fn set_idle_refresh(&self, pet_id: i64, seconds: u32) {
        self.refresh_settings
            .entry(pet_id)
            .or_default()
            .idle_seconds = seconds;
    }

    pub fn set_live_refresh(&self, pet_id: i64, seconds: u32) {
        self.refresh_settings
            .entry(pet_id)
            .or_default()
            .live_seconds = seconds;
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_pets(&self) -> EntityStream<Pet> {
        EntityStream::new(self.pets.subscribe())
    }

    pub fn subscribe_map_snapshots(&self) -> EntityStream<MapSnapshot> {
        EntityStream::new(self.map_snapshots.subscribe())
    }

    pub fn subscribe_activities(&self) -> EntityStream<ActivitySnapshot> {
        EntityStream::new(self.activities.subscribe())
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_pet_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_pet_refresh.borrow()
    }

    /// How long ago the pet list was last refreshed, or `None` if never.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_pet_refresh().map(|t| Utc::now() - t)
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
