// ── Domain model ──
//
// Consumer-facing types, decoupled from the wire shapes in `kippy-api`.
// Conversion lives in `crate::convert`.

mod activity;
mod map;
mod pet;

pub use activity::ActivitySnapshot;
pub use map::{LocalizationTechnology, MapSnapshot, OperatingStatus};
pub use pet::{LABEL_EXPIRED, Pet, PetHardware, PetKind, SubscriptionStatus};
