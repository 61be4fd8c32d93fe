use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Straight-line distance in degree space. Not a great-circle distance.
    pub fn degree_distance(&self, other: &GeoPoint) -> f64 {
        let dlat = self.latitude - other.latitude;
        let dlon = self.longitude - other.longitude;
        (dlat * dlat + dlon * dlon).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub text: &'static str,
    pub code: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    pub temperature_celsius: f64,
    pub humidity_percent: u8,
    pub wind_speed_kph: f64,
    pub condition: WeatherCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pollutants {
    pub pm25: u32,
    pub pm10: u32,
    pub o3: u32,
    pub no2: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AqiReading {
    pub aqi: u32,
    pub pollutants: Pollutants,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RainfallCell {
    pub latitude: f64,
    pub longitude: f64,
    pub value_mm: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RainfallGrid {
    pub cells: Vec<RainfallCell>,
}

impl RainfallGrid {
    /// Cells with measurable rain; what a map actually draws.
    pub fn wet_cells(&self) -> impl Iterator<Item = &RainfallCell> {
        self.cells.iter().filter(|cell| cell.value_mm > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WildfireIncident {
    pub id: &'static str,
    pub location: GeoPoint,
    pub name: &'static str,
    pub area_hectares: f64,
    pub started_at: &'static str,
    pub confidence: Confidence,
}

impl WildfireIncident {
    pub fn started_at_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::parse_from_rfc3339(self.started_at)
            .ok()
            .map(|at| at.with_timezone(&chrono::Utc))
    }
}

/// A city on the map with its coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NamedPoint {
    pub name: &'static str,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationReading<T> {
    pub station: NamedPoint,
    pub reading: T,
}
