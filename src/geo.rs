//! Static geographic reference data shared by the simulators and layers.

use crate::model::{GeoPoint, NamedPoint};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnownCityBias {
    pub name: &'static str,
    pub location: GeoPoint,
    pub pollution_factor: f64,
}

const fn bias(name: &'static str, latitude: f64, longitude: f64, factor: f64) -> KnownCityBias {
    KnownCityBias {
        name,
        location: GeoPoint::new(latitude, longitude),
        pollution_factor: factor,
    }
}

pub const POLLUTION_BIAS: [KnownCityBias; 8] = [
    bias("Beijing", 39.9042, 116.4074, 2.5),
    bias("Delhi", 28.6139, 77.2090, 2.8),
    bias("Los Angeles", 34.0522, -118.2437, 1.6),
    bias("Cairo", 30.0444, 31.2357, 2.2),
    bias("London", 51.5074, -0.1278, 1.2),
    bias("Paris", 48.8566, 2.3522, 1.3),
    bias("New York", 40.7128, -74.0060, 1.4),
    bias("Tokyo", 35.6762, 139.6503, 1.3),
];

/// Returns the bias entry closest to `point` together with its distance.
/// Ties keep the earlier table entry.
pub fn nearest_bias(point: &GeoPoint) -> (&'static KnownCityBias, f64) {
    let mut best = &POLLUTION_BIAS[0];
    let mut best_distance = point.degree_distance(&best.location);
    for city in POLLUTION_BIAS.iter().skip(1) {
        let distance = point.degree_distance(&city.location);
        if distance < best_distance {
            best = city;
            best_distance = distance;
        }
    }
    (best, best_distance)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainyRegion {
    pub name: &'static str,
    pub center: GeoPoint,
    pub radius_deg: f64,
}

const fn region(name: &'static str, latitude: f64, longitude: f64, radius: f64) -> RainyRegion {
    RainyRegion {
        name,
        center: GeoPoint::new(latitude, longitude),
        radius_deg: radius,
    }
}

pub const RAINY_REGIONS: [RainyRegion; 5] = [
    region("Amazon", 0.0, -60.0, 20.0),
    region("Indian monsoon", 10.0, 75.0, 15.0),
    region("Indonesia", 0.0, 100.0, 15.0),
    region("Pacific Northwest", 45.0, -120.0, 10.0),
    region("Northern Europe", 50.0, 0.0, 10.0),
];

const fn city(name: &'static str, latitude: f64, longitude: f64) -> NamedPoint {
    NamedPoint {
        name,
        location: GeoPoint::new(latitude, longitude),
    }
}

pub const WEATHER_STATIONS: [NamedPoint; 15] = [
    city("New York", 40.7128, -74.0060),
    city("London", 51.5074, -0.1278),
    city("Tokyo", 35.6762, 139.6503),
    city("Sydney", -33.8688, 151.2093),
    city("Paris", 48.8566, 2.3522),
    city("Beijing", 39.9042, 116.4074),
    city("Rio de Janeiro", -22.9068, -43.1729),
    city("Cairo", 30.0444, 31.2357),
    city("Los Angeles", 34.0522, -118.2437),
    city("Mumbai", 19.0760, 72.8777),
    city("Singapore", 1.3521, 103.8198),
    city("Toronto", 43.6532, -79.3832),
    city("Berlin", 52.5200, 13.4050),
    city("Moscow", 55.7558, 37.6173),
    city("Mexico City", 19.4326, -99.1332),
];

pub const AIR_QUALITY_STATIONS: [NamedPoint; 15] = [
    city("New York", 40.7128, -74.0060),
    city("London", 51.5074, -0.1278),
    city("Tokyo", 35.6762, 139.6503),
    city("Sydney", -33.8688, 151.2093),
    city("Paris", 48.8566, 2.3522),
    city("Beijing", 39.9042, 116.4074),
    city("Rio de Janeiro", -22.9068, -43.1729),
    city("Cairo", 30.0444, 31.2357),
    city("Los Angeles", 34.0522, -118.2437),
    city("Delhi", 28.6139, 77.2090),
    city("Moscow", 55.7558, 37.6173),
    city("Mexico City", 19.4326, -99.1332),
    city("Berlin", 52.5200, 13.4050),
    city("Madrid", 40.4168, -3.7038),
    city("Rome", 41.9028, 12.4964),
];

const EXTRA_CITIES: [NamedPoint; 3] = [
    city("Cape Town", -33.9249, 18.4241),
    city("Dubai", 25.2048, 55.2708),
    city("Melbourne", -37.8136, 144.9631),
];

/// Looks a city up by name in the local tables. Case and surrounding
/// whitespace are ignored.
pub fn find_city(name: &str) -> Option<NamedPoint> {
    let wanted = name.trim();
    WEATHER_STATIONS
        .iter()
        .chain(AIR_QUALITY_STATIONS.iter())
        .chain(EXTRA_CITIES.iter())
        .find(|station| station.name.eq_ignore_ascii_case(wanted))
        .copied()
}
