pub mod geo;
pub mod pending_event;
pub mod status;
pub mod tag;

pub use geo::GeoFix;
pub use pending_event::{OBS_LOCATION_REFRESH, PendingEvent};
pub use status::Status;
pub use tag::{Lookup, TagRecord};
