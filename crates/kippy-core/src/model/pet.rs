// ── Pet / device domain types ──

use serde::{Deserialize, Serialize};

/// Display label for an expired subscription.
pub const LABEL_EXPIRED: &str = "Expired";

/// A trackable pet. One pet has zero or one associated tracking device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
    /// Stable vendor identifier for the pet.
    pub id: i64,
    /// Identifier of the tracking device, when one is paired.
    pub kippy_id: Option<i64>,
    pub name: Option<String>,
    pub kind: PetKind,
    pub hardware: PetHardware,
    pub subscription: SubscriptionStatus,
    /// Device check-in cadence in hours.
    pub update_frequency_hours: Option<f64>,
    pub gps_on_default: bool,
    pub energy_saving: bool,
    pub firmware_upgradable: bool,
}

impl Pet {
    /// The identifier used for device-scoped endpoints: the paired
    /// device id, falling back to the pet id for older accounts where
    /// the two coincide.
    pub fn tracker_id(&self) -> i64 {
        self.kippy_id.unwrap_or(self.id)
    }

    /// Whether this pet participates in polling/scheduling.
    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }
}

/// Tracker hardware details, for host device registries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PetHardware {
    pub model: Option<String>,
    pub firmware: Option<String>,
    pub serial: Option<String>,
    pub imei: Option<String>,
}

/// Pet species, decoded from the vendor's `petKind` code table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PetKind {
    Cat,
    Dog,
    /// Unmapped code, preserved verbatim.
    Other(String),
    Unknown,
}

impl PetKind {
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("3") => Self::Cat,
            Some("4") => Self::Dog,
            Some(other) => Self::Other(other.to_owned()),
            None => Self::Unknown,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Cat => Some("Cat"),
            Self::Dog => Some("Dog"),
            Self::Other(code) => Some(code),
            Self::Unknown => None,
        }
    }
}

/// Subscription state derived from the server's `expired_days`.
///
/// Negative `expired_days` means active with that many days remaining;
/// non-negative means expired. Missing or unparsable values count as
/// active (the server omits the field for lifetime plans).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Active { days_remaining: Option<i64> },
    Expired,
}

impl SubscriptionStatus {
    pub fn from_expired_days(expired_days: Option<i64>) -> Self {
        match expired_days {
            Some(days) if days >= 0 => Self::Expired,
            Some(days) => Self::Active {
                days_remaining: Some(days.abs()),
            },
            None => Self::Active {
                days_remaining: None,
            },
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn days_remaining(&self) -> Option<i64> {
        match self {
            Self::Active { days_remaining } => *days_remaining,
            Self::Expired => None,
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expired => f.write_str(LABEL_EXPIRED),
            Self::Active {
                days_remaining: Some(days),
            } => write!(f, "{days} days remaining"),
            Self::Active {
                days_remaining: None,
            } => f.write_str("Active"),
        }
    }
}
