// ── Location snapshot domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kippy_api::{
    LOCALIZATION_TECHNOLOGY_GPS, LOCALIZATION_TECHNOLOGY_LBS, LOCALIZATION_TECHNOLOGY_WIFI,
};

/// Server-reported device power/tracking state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingStatus {
    Idle,
    StartingLive,
    Live,
    EnergySaving,
    /// Unmapped status code, preserved verbatim.
    Unknown(i64),
}

impl OperatingStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Idle,
            3 => Self::StartingLive,
            5 => Self::Live,
            18 => Self::EnergySaving,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Idle => 1,
            Self::StartingLive => 3,
            Self::Live => 5,
            Self::EnergySaving => 18,
            Self::Unknown(code) => code,
        }
    }
}

impl std::fmt::Display for OperatingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::StartingLive => f.write_str("Starting live"),
            Self::Live => f.write_str("Live"),
            Self::EnergySaving => f.write_str("Energy saving"),
            Self::Unknown(code) => write!(f, "Unknown ({code})"),
        }
    }
}

/// How the last position fix was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalizationTechnology {
    /// Cell-tower triangulation; low accuracy.
    Lbs,
    Gps,
    Wifi,
    Other(String),
}

impl LocalizationTechnology {
    pub fn from_label(label: &str) -> Self {
        match label {
            LOCALIZATION_TECHNOLOGY_LBS => Self::Lbs,
            LOCALIZATION_TECHNOLOGY_GPS => Self::Gps,
            LOCALIZATION_TECHNOLOGY_WIFI => Self::Wifi,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn is_lbs(&self) -> bool {
        matches!(self, Self::Lbs)
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Lbs => LOCALIZATION_TECHNOLOGY_LBS,
            Self::Gps => LOCALIZATION_TECHNOLOGY_GPS,
            Self::Wifi => LOCALIZATION_TECHNOLOGY_WIFI,
            Self::Other(label) => label,
        }
    }
}

/// One device's location snapshot, fully replaced on each successful
/// poll (modulo the LBS position guard applied by the store).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSnapshot {
    pub pet_id: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Accuracy radius in meters.
    pub accuracy: Option<f64>,
    pub altitude: Option<f64>,
    pub technology: Option<LocalizationTechnology>,
    pub operating_status: Option<OperatingStatus>,
    /// Last device contact with the vendor backend.
    pub contact_time: Option<DateTime<Utc>>,
    pub fix_time: Option<DateTime<Utc>>,
    pub gps_time: Option<DateTime<Utc>>,
    pub lbs_time: Option<DateTime<Utc>>,
    pub next_call_time: Option<DateTime<Utc>>,
}

impl MapSnapshot {
    pub fn empty(pet_id: i64) -> Self {
        Self {
            pet_id,
            latitude: None,
            longitude: None,
            accuracy: None,
            altitude: None,
            technology: None,
            operating_status: None,
            contact_time: None,
            fix_time: None,
            gps_time: None,
            lbs_time: None,
            next_call_time: None,
        }
    }

    /// Whether the snapshot carries a usable position.
    pub fn has_position(&self) -> bool {
        self.latitude.is_some() || self.longitude.is_some()
    }
}
