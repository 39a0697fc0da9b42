//! CSV export of the offline queue.

use crate::errors::{AppError, AppResult};
use crate::models::PendingEvent;
use crate::models::geo::coord_to_wire;
use serde::Serialize;
use std::io;
use std::path::Path;

/// One queued event as written to the CSV file. Coordinates keep the
/// backend's decimal-comma spelling.
#[derive(Debug, Serialize)]
pub struct QueueRow {
    pub event_id: String,
    pub timestamp_iso: String,
    pub tag: String,
    pub status: String,
    pub usuario: String,
    pub lat: String,
    pub lon: String,
    pub accuracy: String,
    pub device_id: String,
    pub obs: String,
}

impl From<&PendingEvent> for QueueRow {
    fn from(ev: &PendingEvent) -> Self {
        Self {
            event_id: ev.event_id.to_string(),
            timestamp_iso: ev.timestamp_str(),
            tag: ev.tag.clone(),
            status: ev.status.to_wire().to_string(),
            usuario: ev.user.clone(),
            lat: coord_to_wire(ev.lat),
            lon: coord_to_wire(ev.lon),
            accuracy: coord_to_wire(ev.accuracy),
            device_id: ev.device_id.clone(),
            obs: ev.obs.clone(),
        }
    }
}

pub struct ExportLogic;

impl ExportLogic {
    /// Write `events` (queue order, newest first) to `path`.
    /// Returns the number of rows written.
    pub fn queue_csv<'a, I>(events: I, path: &Path) -> AppResult<usize>
    where
        I: IntoIterator<Item = &'a PendingEvent>,
    {
        if path.is_dir() {
            return Err(AppError::Export(format!(
                "{} is a directory",
                path.display()
            )));
        }

        let mut wtr = csv::Writer::from_path(path)
            .map_err(|e| AppError::Export(format!("{}: {e}", path.display())))?;

        let mut written = 0;
        for ev in events {
            wtr.serialize(QueueRow::from(ev))
                .map_err(|e| AppError::Export(format!("CSV write error: {e}")))?;
            written += 1;
        }
        wtr.flush()
            .map_err(|e| AppError::from(io::Error::other(format!("CSV flush error: {e}"))))?;
        Ok(written)
    }
}
