//! Session logic: everything that decides, independent of how the operator
//! or the backend are reached.

pub mod cache;
pub mod export;
pub mod hold;
pub mod log;
pub mod policy;
pub mod queue;
pub mod sync;
pub mod tracker;

pub use sync::{Scheduler, SyncEngine, SyncOutcome, Trigger};
pub use tracker::{RecordOptions, RecordOutcome, TagView, Tracker, TrackerOptions};
