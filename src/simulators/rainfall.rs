use rand::Rng;

use super::round1;
use crate::{
    geo::RAINY_REGIONS,
    model::{GeoPoint, RainfallCell, RainfallGrid},
};

pub const GRID_STEP_DEG: i32 = 5;
pub const LATITUDE_RANGE: (i32, i32) = (-60, 60);
pub const LONGITUDE_RANGE: (i32, i32) = (-180, 180);
pub const GRID_ROWS: usize = 25;
pub const GRID_COLUMNS: usize = 73;
pub const GRID_CELLS: usize = GRID_ROWS * GRID_COLUMNS;

const BASE_PROBABILITY: f64 = 0.3;
const TROPICAL_BONUS: f64 = 0.4;
const WET_SEASON_BONUS: f64 = 0.2;
const REGION_BONUS: f64 = 0.3;

fn is_wet_season(latitude: f64, month0: u32) -> bool {
    if latitude > 0.0 {
        (5..=8).contains(&month0)
    } else {
        month0 >= 11 || month0 <= 2
    }
}

/// Chance of rain for a cell. Not capped: values above 1 mean certain rain.
pub fn rain_probability(point: GeoPoint, month0: u32) -> f64 {
    let mut probability = BASE_PROBABILITY;
    if point.latitude.abs() < 15.0 {
        probability += TROPICAL_BONUS;
    }
    if is_wet_season(point.latitude, month0) {
        probability += WET_SEASON_BONUS;
    }
    for region in &RAINY_REGIONS {
        let distance = point.degree_distance(&region.center);
        if distance < region.radius_deg {
            probability += REGION_BONUS * (1.0 - distance / region.radius_deg);
        }
    }
    probability
}

fn grid_axis((start, end): (i32, i32)) -> impl Iterator<Item = f64> {
    (start..=end)
        .step_by(GRID_STEP_DEG as usize)
        .map(f64::from)
}

/// Row-major over latitude, every cell present including dry ones.
pub fn simulate_rainfall<R: Rng + ?Sized>(rng: &mut R, month0: u32) -> RainfallGrid {
    let mut cells = Vec::with_capacity(GRID_CELLS);
    for latitude in grid_axis(LATITUDE_RANGE) {
        for longitude in grid_axis(LONGITUDE_RANGE) {
            let point = GeoPoint::new(latitude, longitude);
            let value_mm = if rng.gen::<f64>() < rain_probability(point, month0) {
                let base = rng.gen::<f64>() * 10.0;
                let intensity = if rng.gen::<f64>() < 0.2 { 4.0 } else { 1.0 };
                round1(base * intensity)
            } else {
                0.0
            };
            cells.push(RainfallCell {
                latitude,
                longitude,
                value_mm,
            });
        }
    }
    RainfallGrid { cells }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn grid_is_complete() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let grid = simulate_rainfall(&mut rng, 6);
        assert_eq!(grid.cells.len(), GRID_CELLS);
        assert_eq!(GRID_CELLS, 1825);
        let first = grid.cells.first().unwrap();
        let last = grid.cells.last().unwrap();
        assert_eq!((first.latitude, first.longitude), (-60.0, -180.0));
        assert_eq!((last.latitude, last.longitude), (60.0, 180.0));
        for cell in &grid.cells {
            assert!(cell.value_mm >= 0.0);
            assert!(cell.value_mm <= 40.0);
            assert_eq!(cell.latitude as i32 % 5, 0);
            assert_eq!(cell.longitude as i32 % 5, 0);
        }
    }

    #[test]
    fn probability_components() {
        // Plain mid-latitude ocean, off season.
        assert!((rain_probability(GeoPoint::new(-40.0, -150.0), 6) - 0.3).abs() < 1e-9);
        // Same point in the southern summer.
        assert!((rain_probability(GeoPoint::new(-40.0, -150.0), 0) - 0.5).abs() < 1e-9);
        // Tropical band, southern side of the equator at the Amazon center, in January.
        let amazon = rain_probability(GeoPoint::new(0.0, -60.0), 0);
        assert!((amazon - (0.3 + 0.4 + 0.2 + 0.3)).abs() < 1e-9);
        assert!(amazon > 1.0);
        // Northern Europe in July, at the region edge contributes nothing.
        let edge = rain_probability(GeoPoint::new(60.0, 0.0), 6);
        assert!((edge - 0.5).abs() < 1e-9);
        let center = rain_probability(GeoPoint::new(50.0, 0.0), 6);
        assert!((center - 0.8).abs() < 1e-9);
    }

    #[test]
    fn same_seed_same_grid() {
        let a = simulate_rainfall(&mut ChaCha8Rng::seed_from_u64(2), 0);
        let b = simulate_rainfall(&mut ChaCha8Rng::seed_from_u64(2), 0);
        assert_eq!(a, b);
        assert!(a.wet_cells().count() > 0);
    }

    #[test]
    fn tropics_are_wetter_than_midlatitudes() {
        let mut rng = ChaCha8Rng::seed_from_u64(33);
        let mut tropical = 0usize;
        let mut temperate = 0usize;
        for _ in 0..10 {
            let grid = simulate_rainfall(&mut rng, 3);
            for cell in grid.wet_cells() {
                if cell.latitude.abs() < 15.0 {
                    tropical += 1;
                } else if (30.0..=45.0).contains(&cell.latitude.abs()) {
                    temperate += 1;
                }
            }
        }
        // Five tropical rows against eight temperate ones.
        let tropical_rate = tropical as f64 / 5.0;
        let temperate_rate = temperate as f64 / 8.0;
        assert!(tropical_rate > temperate_rate * 1.5, "{tropical} vs {temperate}");
    }
}
