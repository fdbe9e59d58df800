// kippy-api: Async Rust client for the Kippy pet-tracker vendor API

pub mod client;
pub mod codes;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod redact;
pub mod session;
pub mod transport;

pub use client::{DEFAULT_HOST, KippyClient};
pub use codes::ReturnCode;
pub use endpoints::{
    APP_ACTION_LIVE_TRACKING_OFF, APP_ACTION_LIVE_TRACKING_ON, LOCALIZATION_TECHNOLOGY_GPS,
    LOCALIZATION_TECHNOLOGY_LBS, LOCALIZATION_TECHNOLOGY_WIFI, TimeDivision,
};
pub use error::Error;
pub use models::{ActivityCategories, MapActionResponse, PetRecord};
pub use session::Session;
pub use transport::{TlsMode, TransportConfig};
