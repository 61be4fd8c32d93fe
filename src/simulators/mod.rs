//! Synthetic data generators, one per map layer.
//!
//! Every simulator is a plain function of a random source and a point in
//! time. Latency, locking and clocks live in [`crate::service`].

pub mod air_quality;
pub mod rainfall;
pub mod weather;
pub mod wildfire;

use serde::{Deserialize, Serialize};

pub use air_quality::simulate_air_quality;
pub use rainfall::simulate_rainfall;
pub use weather::simulate_weather;
pub use wildfire::simulate_wildfires;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Weather,
    AirQuality,
    Rainfall,
    Wildfire,
}

impl LayerKind {
    pub const ALL: [LayerKind; 4] = [
        LayerKind::Weather,
        LayerKind::AirQuality,
        LayerKind::Rainfall,
        LayerKind::Wildfire,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LayerKind::Weather => "weather",
            LayerKind::AirQuality => "air_quality",
            LayerKind::Rainfall => "rainfall",
            LayerKind::Wildfire => "wildfire",
        }
    }
}

/// Half-up rounding, so -2.5 becomes -2 rather than -3.
pub(crate) fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

pub(crate) fn round1(value: f64) -> f64 {
    round_half_up(value * 10.0) / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_goes_up_on_ties() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round1(1.25), 1.3);
        assert_eq!(round1(-0.04), -0.0);
        assert_eq!(round1(17.349), 17.3);
    }
}
