// kippy-core: Reactive data layer between kippy-api and consumers.

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod scheduler;
pub mod store;
pub mod stream;
pub mod tracker;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::TrackerConfig;
pub use error::CoreError;
pub use scheduler::{next_refresh_delay, poll_interval};
pub use store::{DataStore, MapRefreshSettings};
pub use stream::EntityStream;
pub use tracker::{ConnectionState, Tracker};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    ActivitySnapshot, LocalizationTechnology, MapSnapshot, OperatingStatus, Pet, PetHardware,
    PetKind, SubscriptionStatus,
};
