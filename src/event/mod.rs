//! Restaurant business events and their Klaviyo representation

pub mod kind;
pub mod payload;
pub mod record;

pub use kind::{Domain, EventKind, KindSpec, PointsEffect};
pub use payload::EventPayload;
pub use record::{EventRecord, ProfileRef, Properties};
