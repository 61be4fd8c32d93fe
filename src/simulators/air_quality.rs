use rand::Rng;

use super::round_half_up;
use crate::{
    geo,
    model::{AqiReading, GeoPoint, Pollutants},
};

/// Pollution fades with distance from the nearest known city but never drops
/// below half strength.
pub fn distance_factor(distance: f64) -> f64 {
    (0.5 + 1.0 / (1.0 + distance * 5.0)).min(1.0)
}

/// The index is deliberately left unbounded above.
pub fn simulate_air_quality<R: Rng + ?Sized>(rng: &mut R, point: GeoPoint) -> AqiReading {
    let (city, distance) = geo::nearest_bias(&point);
    let base = 30.0 + rng.gen::<f64>() * 40.0;
    let aqi = round_half_up(base * city.pollution_factor * distance_factor(distance));

    let pm25 = round_half_up(aqi * 0.4 * (0.9 + rng.gen::<f64>() * 0.2));
    let pm10 = round_half_up(aqi * 0.8 * (0.9 + rng.gen::<f64>() * 0.2));
    let o3 = round_half_up(30.0 + rng.gen::<f64>() * 40.0 * (aqi / 100.0));
    let no2 = round_half_up(20.0 + rng.gen::<f64>() * 60.0 * (aqi / 100.0));

    AqiReading {
        aqi: aqi as u32,
        pollutants: Pollutants {
            pm25: pm25 as u32,
            pm10: pm10 as u32,
            o3: o3 as u32,
            no2: no2 as u32,
        },
    }
}
