// Endpoint operations
//
// Each module adds inherent methods to `KippyClient` for one vendor
// endpoint, building on `authenticated_payload` + `post_with_refresh`.

mod activity;
mod map;
mod pets;
mod settings;

pub use activity::TimeDivision;
pub use map::{
    APP_ACTION_LIVE_TRACKING_OFF, APP_ACTION_LIVE_TRACKING_ON, LOCALIZATION_TECHNOLOGY_GPS,
    LOCALIZATION_TECHNOLOGY_LBS, LOCALIZATION_TECHNOLOGY_WIFI,
};
