// ── Activity statistics domain type ──

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-pet activity statistics, replaced wholesale per poll window.
///
/// The inner values keep their wire form (per-period records of steps,
/// calories, and run/walk/sleep/rest durations keyed by date) -- the
/// vendor varies their shape across server generations and display
/// formatting is the host's concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    pub pet_id: i64,
    pub activities: Option<Value>,
    pub avg: Option<Value>,
    pub health: Option<Value>,
}

impl ActivitySnapshot {
    pub fn empty(pet_id: i64) -> Self {
        Self {
            pet_id,
            ..Self::default()
        }
    }
}
