// ── Tracker abstraction ──
//
// Full lifecycle management for one Kippy account connection: login,
// initial data load, background polling driven by the scheduler, and
// command routing. Consumers observe state through the DataStore's
// snapshot/subscription interfaces.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use kippy_api::{
    APP_ACTION_LIVE_TRACKING_OFF, APP_ACTION_LIVE_TRACKING_ON, KippyClient, TimeDivision,
    TransportConfig,
};

use crate::config::{TrackerConfig, normalize_refresh_secs};
use crate::convert;
use crate::error::CoreError;
use crate::model::{ActivitySnapshot, MapSnapshot, OperatingStatus, Pet};
use crate::scheduler::{ScheduleInputs, next_refresh_delay, poll_interval};
use crate::store::DataStore;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Tracker ──────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<TrackerInner>`. Manages the full
/// connection lifecycle: authentication, per-pet map polling, activity
/// refresh timing, and command routing.
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    config: TrackerConfig,
    api: KippyClient,
    store: Arc<DataStore>,
    connection_state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    pet_tasks: Mutex<HashMap<i64, PetTasks>>,
}

/// Handle to one pet's scheduling tasks: the input channel their timers
/// recompute from, and the token that stops them.
struct PetTasks {
    inputs: watch::Sender<ScheduleInputs>,
    cancel: CancellationToken,
}

impl Tracker {
    /// Create a new Tracker from configuration. Does NOT connect --
    /// call [`connect()`](Self::connect) to authenticate and start
    /// background polling.
    pub fn new(config: TrackerConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: config.tls.clone(),
            timeout: config.timeout,
        };
        let api = KippyClient::with_transport(&config.host, &transport)?;
        Ok(Self::with_client(config, api))
    }

    /// Create a Tracker around a pre-built API client (tests, custom
    /// transports).
    pub fn with_client(config: TrackerConfig, api: KippyClient) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(TrackerInner {
                config,
                api,
                store: Arc::new(DataStore::new()),
                connection_state,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
                pet_tasks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Access the tracker configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.inner.config
    }

    /// Access the underlying DataStore.
    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to the vendor API.
    ///
    /// Logs in, performs the initial pet/map/activity load, and spawns
    /// the background polling tasks. On failure the state moves to
    /// [`Failed`](ConnectionState::Failed); retry by creating a fresh
    /// Tracker.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Connecting);

        if let Err(err) = self.try_connect().await {
            // Stop any polling that already spawned; the tracker stays
            // unusable until recreated.
            self.disconnect().await;
            let _ = self.inner.connection_state.send(ConnectionState::Failed);
            return Err(err);
        }

        let _ = self.inner.connection_state.send(ConnectionState::Connected);
        info!(pets = self.inner.store.pet_count(), "connected to Kippy API");
        Ok(())
    }

    async fn try_connect(&self) -> Result<(), CoreError> {
        let config = &self.inner.config;
        self.inner
            .api
            .login(&config.email, &config.password, false)
            .await?;
        debug!("session authentication successful");

        // Initial data load; pet tasks spawn as a side effect of the
        // list refresh.
        self.refresh_pets().await?;
        for pet in self.inner.store.active_pets() {
            self.refresh_map(pet.id).await?;
            self.refresh_activities(pet.id).await?;
        }

        let interval_mins = config.device_update_interval_mins;
        if interval_mins > 0 {
            let tracker = self.clone();
            let cancel = self.inner.cancel.clone();
            let interval = Duration::from_secs(u64::from(interval_mins) * 60);
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(pets_refresh_task(tracker, interval, cancel)));
        }

        Ok(())
    }

    /// Disconnect: cancel background tasks, join them, and reset the
    /// connection state.
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();

        // Drain under the lock, await outside it -- a task shutting
        // down may itself need the handle list.
        let handles: Vec<JoinHandle<()>> = {
            let mut guard = self.inner.task_handles.lock().await;
            guard.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.await;
        }
        self.inner.pet_tasks.lock().await.clear();

        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    // ── Refresh operations ───────────────────────────────────────

    /// Fetch the pet list and replace the store's records wholesale.
    ///
    /// Pets whose subscription expired are kept in the snapshot but
    /// their polling tasks are stopped; newly active pets get tasks.
    pub async fn refresh_pets(&self) -> Result<(), CoreError> {
        let records = self.inner.api.get_pet_kippy_list().await?;
        let pets: Vec<Pet> = records.iter().map(convert::pet_from_record).collect();
        debug!(count = pets.len(), "pet list refreshed");
        self.inner.store.apply_pet_list(pets);
        self.sync_pet_tasks().await;
        Ok(())
    }

    /// Poll the location snapshot for one pet.
    pub async fn refresh_map(&self, pet_id: i64) -> Result<(), CoreError> {
        let pet = self.require_pet(pet_id)?;
        let resp = self
            .inner
            .api
            .kippymap_action(pet.tracker_id(), true, None, None)
            .await?;
        let snapshot = convert::map_snapshot_from_response(pet_id, &resp);
        self.inner
            .store
            .apply_map_snapshot(snapshot, self.inner.config.ignore_lbs);
        self.publish_inputs(pet_id).await;
        Ok(())
    }

    /// Fetch today's activity categories for one pet.
    pub async fn refresh_activities(&self, pet_id: i64) -> Result<(), CoreError> {
        let from_date = Local::now().date_naive();
        let to_date = from_date + chrono::Duration::days(1);
        let categories = self
            .inner
            .api
            .get_activity_categories(pet_id, from_date, to_date, TimeDivision::Day)
            .await?;
        self.inner
            .store
            .apply_activity_snapshot(convert::activity_snapshot_from_categories(
                pet_id, categories,
            ));
        Ok(())
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Toggle live tracking via the map action endpoint.
    ///
    /// Rejected while the device is in energy-saving mode. The device
    /// acknowledges lazily, so the requested Idle/Live transition is
    /// reflected optimistically until the next poll confirms it.
    pub async fn set_live_tracking(&self, pet_id: i64, enable: bool) -> Result<(), CoreError> {
        let pet = self.require_pet(pet_id)?;
        let store = &self.inner.store;

        let status = store.map_snapshot(pet_id).and_then(|s| s.operating_status);
        if status == Some(OperatingStatus::EnergySaving) {
            return Err(CoreError::Rejected {
                message: "live tracking cannot be toggled in energy saving mode".into(),
            });
        }

        let action = if enable {
            APP_ACTION_LIVE_TRACKING_ON
        } else {
            APP_ACTION_LIVE_TRACKING_OFF
        };
        let resp = self
            .inner
            .api
            .kippymap_action(pet.tracker_id(), true, Some(action), None)
            .await?;
        store.apply_map_snapshot(
            convert::map_snapshot_from_response(pet_id, &resp),
            self.inner.config.ignore_lbs,
        );

        let status = store.map_snapshot(pet_id).and_then(|s| s.operating_status);
        if enable && status == Some(OperatingStatus::Idle) {
            store.set_operating_status(pet_id, OperatingStatus::Live);
        } else if !enable && status == Some(OperatingStatus::Live) {
            store.set_operating_status(pet_id, OperatingStatus::Idle);
        }

        self.publish_inputs(pet_id).await;
        Ok(())
    }

    /// Toggle the device's energy-saving mode.
    pub async fn set_energy_saving(&self, pet_id: i64, enable: bool) -> Result<(), CoreError> {
        let pet = self.require_pet(pet_id)?;
        self.inner
            .api
            .modify_kippy_settings(pet.tracker_id(), None, None, Some(enable))
            .await?;
        self.inner
            .store
            .patch_pet(pet_id, |p| p.energy_saving = enable);
        self.publish_inputs(pet_id).await;
        Ok(())
    }

    /// Change the device's check-in cadence (hours).
    pub async fn set_update_frequency(&self, pet_id: i64, hours: f64) -> Result<(), CoreError> {
        if hours <= 0.0 || hours.is_nan() {
            return Err(CoreError::ValidationFailed {
                message: format!("update frequency must be positive, got {hours}"),
            });
        }
        let pet = self.require_pet(pet_id)?;
        self.inner
            .api
            .modify_kippy_settings(pet.tracker_id(), Some(hours), None, None)
            .await?;
        self.inner
            .store
            .patch_pet(pet_id, |p| p.update_frequency_hours = Some(hours));
        self.publish_inputs(pet_id).await;
        Ok(())
    }

    /// Toggle GPS-by-default on the device.
    pub async fn set_gps_on_default(&self, pet_id: i64, enable: bool) -> Result<(), CoreError> {
        let pet = self.require_pet(pet_id)?;
        self.inner
            .api
            .modify_kippy_settings(pet.tracker_id(), None, Some(enable), None)
            .await?;
        self.inner
            .store
            .patch_pet(pet_id, |p| p.gps_on_default = enable);
        Ok(())
    }

    /// Adjust the idle map poll cadence for one pet.
    pub async fn set_idle_refresh(&self, pet_id: i64, seconds: u32) -> Result<(), CoreError> {
        let seconds = normalize_refresh_secs(seconds).ok_or_else(|| CoreError::ValidationFailed {
            message: "idle refresh must be positive".into(),
        })?;
        self.inner.store.set_idle_refresh(pet_id, seconds);
        self.publish_inputs(pet_id).await;
        Ok(())
    }

    /// Adjust the live map poll cadence for one pet.
    pub async fn set_live_refresh(&self, pet_id: i64, seconds: u32) -> Result<(), CoreError> {
        let seconds = normalize_refresh_secs(seconds).ok_or_else(|| CoreError::ValidationFailed {
            message: "live refresh must be positive".into(),
        })?;
        self.inner.store.set_live_refresh(pet_id, seconds);
        self.publish_inputs(pet_id).await;
        Ok(())
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    // ── Snapshot accessors (delegate to DataStore) ───────────────

    pub fn pets_snapshot(&self) -> Arc<Vec<Arc<Pet>>> {
        self.inner.store.pets_snapshot()
    }

    pub fn map_snapshot(&self, pet_id: i64) -> Option<Arc<MapSnapshot>> {
        self.inner.store.map_snapshot(pet_id)
    }

    pub fn activity_snapshot(&self, pet_id: i64) -> Option<Arc<ActivitySnapshot>> {
        self.inner.store.activity_snapshot(pet_id)
    }

    // ── Internals ────────────────────────────────────────────────

    fn require_pet(&self, pet_id: i64) -> Result<Arc<Pet>, CoreError> {
        self.inner
            .store
            .pet_by_id(pet_id)
            .ok_or(CoreError::PetNotFound { pet_id })
    }

    /// Current scheduling inputs for a pet, read from the store.
    fn current_inputs(&self, pet_id: i64) -> ScheduleInputs {
        let store = &self.inner.store;
        let snapshot = store.map_snapshot(pet_id);
        ScheduleInputs {
            operating_status: snapshot.as_ref().and_then(|s| s.operating_status),
            contact_time: snapshot.as_ref().and_then(|s| s.contact_time),
            update_frequency_hours: store
                .pet_by_id(pet_id)
                .and_then(|p| p.update_frequency_hours),
            refresh: store.refresh_settings(pet_id),
        }
    }

    /// Push fresh scheduling inputs to a pet's timers. A change cancels
    /// and replaces any pending timer in the receiving tasks.
    async fn publish_inputs(&self, pet_id: i64) {
        let tasks = self.inner.pet_tasks.lock().await;
        if let Some(pet_tasks) = tasks.get(&pet_id) {
            let inputs = self.current_inputs(pet_id);
            pet_tasks.inputs.send_if_modified(|current| {
                if *current == inputs {
                    false
                } else {
                    *current = inputs;
                    true
                }
            });
        }
    }

    /// Reconcile per-pet polling tasks with the current active set:
    /// spawn for newly active pets, stop for expired/removed ones.
    async fn sync_pet_tasks(&self) {
        let active: Vec<Arc<Pet>> = self.inner.store.active_pets();
        let active_ids: Vec<i64> = active.iter().map(|p| p.id).collect();

        let mut tasks = self.inner.pet_tasks.lock().await;

        let stale: Vec<i64> = tasks
            .keys()
            .copied()
            .filter(|id| !active_ids.contains(id))
            .collect();
        for pet_id in stale {
            if let Some(pet_tasks) = tasks.remove(&pet_id) {
                debug!(pet_id, "stopping polling for inactive pet");
                pet_tasks.cancel.cancel();
            }
        }

        let mut handles = self.inner.task_handles.lock().await;
        for pet in active {
            if tasks.contains_key(&pet.id) {
                continue;
            }
            debug!(pet_id = pet.id, "starting polling tasks");
            let (inputs_tx, inputs_rx) = watch::channel(self.current_inputs(pet.id));
            let cancel = self.inner.cancel.child_token();

            handles.push(tokio::spawn(map_poll_task(
                self.clone(),
                pet.id,
                inputs_rx.clone(),
                cancel.clone(),
            )));
            handles.push(tokio::spawn(activity_timer_task(
                self.clone(),
                pet.id,
                inputs_rx,
                cancel.clone(),
            )));

            tasks.insert(
                pet.id,
                PetTasks {
                    inputs: inputs_tx,
                    cancel,
                },
            );
        }

        // Existing tasks pick up list-refresh changes (frequency, mode).
        drop(handles);
        drop(tasks);
        for pet_id in active_ids {
            self.publish_inputs(pet_id).await;
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically refresh the pet list.
async fn pets_refresh_task(tracker: Tracker, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = tracker.refresh_pets().await {
                    warn!(error = %e, "periodic pet refresh failed");
                }
            }
        }
    }
}

/// Poll one pet's location on the mode-dependent cadence.
///
/// Energy-saving mode suspends polling until the inputs change; an
/// input change always cancels the pending sleep and recomputes, so at
/// most one timer exists per device.
async fn map_poll_task(
    tracker: Tracker,
    pet_id: i64,
    mut inputs: watch::Receiver<ScheduleInputs>,
    cancel: CancellationToken,
) {
    loop {
        let current = inputs.borrow_and_update().clone();
        let interval = poll_interval(current.operating_status, current.refresh);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            changed = inputs.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            () = sleep_or_forever(interval) => {
                if let Err(e) = tracker.refresh_map(pet_id).await {
                    warn!(pet_id, error = %e, "map poll failed");
                }
            }
        }
    }
}

/// Fire an activity (and map) refresh once per expected device
/// check-in.
async fn activity_timer_task(
    tracker: Tracker,
    pet_id: i64,
    mut inputs: watch::Receiver<ScheduleInputs>,
    cancel: CancellationToken,
) {
    let slack = Duration::from_secs(
        u64::from(tracker.inner.config.activity_refresh_delay_mins) * 60,
    );

    loop {
        let current = inputs.borrow_and_update().clone();
        let delay = if current.operating_status == Some(OperatingStatus::EnergySaving) {
            None
        } else {
            next_refresh_delay(
                current.contact_time,
                current.update_frequency_hours,
                slack,
                Utc::now(),
            )
            // An already-elapsed deadline fires after the slack rather
            // than spinning.
            .map(|d| if d.is_zero() { slack } else { d })
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            changed = inputs.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            () = sleep_or_forever(delay) => {
                debug!(pet_id, "activity refresh due");
                if let Err(e) = tracker.refresh_activities(pet_id).await {
                    warn!(pet_id, error = %e, "activity refresh failed");
                }
                if let Err(e) = tracker.refresh_map(pet_id).await {
                    warn!(pet_id, error = %e, "post-activity map refresh failed");
                }
            }
        }
    }
}

async fn sleep_or_forever(duration: Option<Duration>) {
    match duration {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending().await,
    }
}
