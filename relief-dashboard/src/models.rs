use serde::{Deserialize, Serialize};

/// Shelter record as served by `GET /api/v1/shelters`.
///
/// The backend stores shelters as clients submitted them, so every field but
/// `name` is read leniently: a value of the wrong type becomes its default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shelter {
    pub name: String,
    #[serde(default, deserialize_with = "lenient::location")]
    pub location: Option<ShelterLocation>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub capacity: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub current_occupancy: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub available_capacity: f64,
    #[serde(default, deserialize_with = "lenient::maybe_number")]
    pub distance_km: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShelterLocation {
    #[serde(default, deserialize_with = "lenient::text")]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<Coordinate>,
    #[serde(default)]
    pub longitude: Option<Coordinate>,
}

/// Latitude/longitude as sent by the backend: usually a numeric string,
/// sometimes a bare number, occasionally anything else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Coordinate {
    /// Finite value or nothing.
    pub fn parse(&self) -> Option<f64> {
        let value = match self {
            Coordinate::Number(n) => *n,
            Coordinate::Text(s) => s.trim().parse::<f64>().ok()?,
            Coordinate::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

mod lenient {
    use super::ShelterLocation;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Strings as they are, numbers in their JSON form, anything else dropped.
    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn maybe_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let value = match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(value.filter(|v| v.is_finite()))
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(maybe_number(d)?.unwrap_or(0.0))
    }

    /// A location that is not an object (a bare address string, say) counts as absent.
    pub fn location<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ShelterLocation>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(serde_json::from_value(value).ok())
    }
}

/// Geographic point, latitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl Shelter {
    pub fn is_available(&self) -> bool {
        self.available_capacity > 0.0
    }

    /// Map position, only when both coordinates parse to finite numbers.
    pub fn position(&self) -> Option<LatLng> {
        let location = self.location.as_ref()?;
        let lat = location.latitude.as_ref()?.parse()?;
        let lng = location.longitude.as_ref()?.parse()?;
        Some(LatLng::new(lat, lng))
    }

    /// `round(current_occupancy / capacity * 100)`, or `None` when the
    /// ratio is not a finite number (zero capacity).
    pub fn occupancy_percent(&self) -> Option<i64> {
        let ratio = self.current_occupancy / self.capacity * 100.0;
        // Math.round semantics: halves go up
        ratio.is_finite().then(|| (ratio + 0.5).floor() as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub title: String,
    pub severity: String, // low, medium, high, critical (not validated)
    pub message: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub location: Option<String>,
}

/// One entry of the geocoding collaborator's answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CityMatch {
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl CityMatch {
    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lon)
    }
}

/// Formats a JSON number the way the page shows it: `100` rather than `100.0`.
pub fn display_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
