use super::geo::{GeoFix, wire_coord};
use super::status::Status;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `obs` marker for an event that only refreshes the coordinates of a tag.
pub const OBS_LOCATION_REFRESH: &str = "ATUALIZAR_GEOLOC";

/// A status observation captured on this device and not yet transmitted.
///
/// `event_id` is the deduplication key: the backend must treat a second
/// delivery of the same id as a no-op, since the batch transport cannot tell
/// whether an earlier delivery arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEvent {
    pub event_id: Uuid,
    #[serde(rename = "timestamp_iso", with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    pub tag: String,
    pub status: Status,
    #[serde(rename = "usuario")]
    pub user: String,
    #[serde(default, with = "wire_coord")]
    pub lat: Option<f64>,
    #[serde(default, with = "wire_coord")]
    pub lon: Option<f64>,
    #[serde(default, with = "wire_coord")]
    pub accuracy: Option<f64>,
    pub device_id: String,
    #[serde(default)]
    pub obs: String,
}

impl PendingEvent {
    /// Build a fresh event with a new random id, stamped now.
    pub fn new(
        tag: &str,
        status: Status,
        user: &str,
        fix: GeoFix,
        device_id: &str,
        obs: &str,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            tag: tag.to_string(),
            status,
            user: user.to_string(),
            lat: fix.lat,
            lon: fix.lon,
            accuracy: fix.accuracy,
            device_id: device_id.to_string(),
            obs: obs.to_string(),
        }
    }

    pub fn fix(&self) -> GeoFix {
        GeoFix::new(self.lat, self.lon, self.accuracy)
    }

    pub fn timestamp_str(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn is_location_refresh(&self) -> bool {
        self.obs == OBS_LOCATION_REFRESH
    }
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_matches_the_ingestion_contract() {
        let ev = PendingEvent::new(
            "T-100",
            Status::PendingObra,
            "campo",
            GeoFix::new(Some(-23.5), Some(-46.25), None),
            "dev-1",
            "",
        );
        let v = serde_json::to_value(&ev).unwrap();

        assert_eq!(v["tag"], "T-100");
        assert_eq!(v["status"], "PENDENTE OBRA");
        assert_eq!(v["usuario"], "campo");
        assert_eq!(v["lat"], "-23,5");
        assert_eq!(v["lon"], "-46,25");
        assert_eq!(v["accuracy"], "");
        assert!(v["timestamp_iso"].as_str().unwrap().ends_with('Z'));

        let back: PendingEvent = serde_json::from_value(v).unwrap();
        assert_eq!(back.event_id, ev.event_id);
        assert_eq!(back.accuracy, None);
    }
}
