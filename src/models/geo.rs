use serde::Serialize;

/// Coordinates attached to an event. Every field is independently optional:
/// a denied or timed-out geolocation yields an empty fix, never an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GeoFix {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub accuracy: Option<f64>,
}

impl GeoFix {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(lat: Option<f64>, lon: Option<f64>, accuracy: Option<f64>) -> Self {
        Self { lat, lon, accuracy }
    }

    pub fn is_empty(&self) -> bool {
        self.lat.is_none() && self.lon.is_none() && self.accuracy.is_none()
    }
}

/// Backend spelling of a coordinate: decimal comma, empty string when absent.
pub fn coord_to_wire(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => x.to_string().replace('.', ","),
        _ => String::new(),
    }
}

/// Parse a coordinate written with either decimal separator.
pub fn coord_from_wire(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    t.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// serde adapter for `Option<f64>` coordinates using the backend spelling.
pub mod wire_coord {
    use super::{coord_from_wire, coord_to_wire};
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(v: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&coord_to_wire(*v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<Raw>::deserialize(d)? {
            Some(Raw::Num(n)) => Some(n),
            Some(Raw::Text(t)) => coord_from_wire(&t),
            None => None,
        })
    }
}
