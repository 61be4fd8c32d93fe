use rand::{seq::SliceRandom, Rng};

use crate::model::{Confidence, GeoPoint, WildfireIncident};

const fn incident(
    id: &'static str,
    latitude: f64,
    longitude: f64,
    name: &'static str,
    area_hectares: f64,
    started_at: &'static str,
    confidence: Confidence,
) -> WildfireIncident {
    WildfireIncident {
        id,
        location: GeoPoint::new(latitude, longitude),
        name,
        area_hectares,
        started_at,
        confidence,
    }
}

pub const NORTHERN_FIRES: [WildfireIncident; 6] = [
    incident(
        "nf1",
        37.7749,
        -122.4194,
        "Sierra Nevada Fire",
        1200.0,
        "2025-06-18T00:00:00Z",
        Confidence::High,
    ),
    incident(
        "nf2",
        34.0522,
        -118.2437,
        "Angeles National Forest Fire",
        800.0,
        "2025-07-05T00:00:00Z",
        Confidence::High,
    ),
    incident(
        "nf3",
        39.7392,
        -104.9903,
        "Rocky Mountain Blaze",
        650.0,
        "2025-06-29T00:00:00Z",
        Confidence::Medium,
    ),
    incident(
        "nf4",
        44.0682,
        -114.7420,
        "Sawtooth Fire",
        1500.0,
        "2025-07-01T00:00:00Z",
        Confidence::High,
    ),
    incident(
        "nf5",
        46.8797,
        -110.3626,
        "Montana Range Fire",
        450.0,
        "2025-07-08T00:00:00Z",
        Confidence::Medium,
    ),
    incident(
        "nf6",
        37.0902,
        -95.7129,
        "Kansas Prairie Fire",
        300.0,
        "2025-07-10T00:00:00Z",
        Confidence::Low,
    ),
];

pub const SOUTHERN_FIRES: [WildfireIncident; 5] = [
    incident(
        "sf1",
        -33.8688,
        151.2093,
        "Blue Mountains Blaze",
        2200.0,
        "2024-12-15T00:00:00Z",
        Confidence::High,
    ),
    incident(
        "sf2",
        -37.8136,
        144.9631,
        "Victorian Alpine Fire",
        1800.0,
        "2025-01-05T00:00:00Z",
        Confidence::High,
    ),
    incident(
        "sf3",
        -35.2809,
        149.1300,
        "Canberra Region Fire",
        950.0,
        "2025-01-22T00:00:00Z",
        Confidence::Medium,
    ),
    incident(
        "sf4",
        -23.5505,
        -46.6333,
        "Brazilian Forest Fire",
        1600.0,
        "2024-02-28T00:00:00Z",
        Confidence::High,
    ),
    incident(
        "sf5",
        -41.2865,
        174.7762,
        "New Zealand Bush Fire",
        350.0,
        "2025-03-05T00:00:00Z",
        Confidence::Low,
    ),
];

/// May through October, zero-based.
pub fn is_northern_fire_season(month0: u32) -> bool {
    (4..=9).contains(&month0)
}

/// The in-season pool first, then at most one stray from the other pool.
pub fn simulate_wildfires<R: Rng + ?Sized>(rng: &mut R, month0: u32) -> Vec<WildfireIncident> {
    let (in_season, off_season): (&[WildfireIncident], &[WildfireIncident]) =
        if is_northern_fire_season(month0) {
            (&NORTHERN_FIRES, &SOUTHERN_FIRES)
        } else {
            (&SOUTHERN_FIRES, &NORTHERN_FIRES)
        };

    let mut active = in_season.to_vec();
    if rng.gen::<f64>() > 0.7 {
        if let Some(stray) = off_season.choose(rng) {
            active.push(stray.clone());
        }
    }
    active
}
