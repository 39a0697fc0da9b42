//! Device capabilities the core consumes but does not implement: decoded
//! scans, positioning, operator confirmation and network reachability.

pub mod confirm;
pub mod geo;
pub mod network;
pub mod scan;
pub mod visibility;

pub use confirm::{Confirmer, Decision};
pub use geo::Geolocator;
pub use network::Connectivity;
