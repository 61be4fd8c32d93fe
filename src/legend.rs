//! Display bands used by map legends and popups.

use std::f64::consts::PI;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    model::{Confidence, WeatherReading, WildfireIncident},
    simulators::round1,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub const ALL: [AqiCategory; 6] = [
        AqiCategory::Good,
        AqiCategory::Moderate,
        AqiCategory::UnhealthyForSensitiveGroups,
        AqiCategory::Unhealthy,
        AqiCategory::VeryUnhealthy,
        AqiCategory::Hazardous,
    ];

    /// The top band is open-ended; readings above 300 are all hazardous.
    pub fn from_aqi(aqi: u32) -> Self {
        match aqi {
            0..=50 => AqiCategory::Good,
            51..=100 => AqiCategory::Moderate,
            101..=150 => AqiCategory::UnhealthyForSensitiveGroups,
            151..=200 => AqiCategory::Unhealthy,
            201..=300 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }

    pub fn range(self) -> &'static str {
        match self {
            AqiCategory::Good => "0-50",
            AqiCategory::Moderate => "51-100",
            AqiCategory::UnhealthyForSensitiveGroups => "101-150",
            AqiCategory::Unhealthy => "151-200",
            AqiCategory::VeryUnhealthy => "201-300",
            AqiCategory::Hazardous => "301+",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            AqiCategory::Good => "#00e400",
            AqiCategory::Moderate => "#ffff00",
            AqiCategory::UnhealthyForSensitiveGroups => "#ff7e00",
            AqiCategory::Unhealthy => "#ff0000",
            AqiCategory::VeryUnhealthy => "#99004c",
            AqiCategory::Hazardous => "#7e0023",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RainfallIntensity {
    None,
    VeryLight,
    Light,
    Moderate,
    Heavy,
    VeryHeavy,
    Extreme,
}

impl RainfallIntensity {
    pub const ALL: [RainfallIntensity; 7] = [
        RainfallIntensity::None,
        RainfallIntensity::VeryLight,
        RainfallIntensity::Light,
        RainfallIntensity::Moderate,
        RainfallIntensity::Heavy,
        RainfallIntensity::VeryHeavy,
        RainfallIntensity::Extreme,
    ];

    pub fn from_mm(value: f64) -> Self {
        if value <= 0.0 {
            RainfallIntensity::None
        } else if value < 1.0 {
            RainfallIntensity::VeryLight
        } else if value < 2.5 {
            RainfallIntensity::Light
        } else if value < 5.0 {
            RainfallIntensity::Moderate
        } else if value < 10.0 {
            RainfallIntensity::Heavy
        } else if value < 20.0 {
            RainfallIntensity::VeryHeavy
        } else {
            RainfallIntensity::Extreme
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RainfallIntensity::None => "No rain",
            RainfallIntensity::VeryLight => "Very light",
            RainfallIntensity::Light => "Light",
            RainfallIntensity::Moderate => "Moderate",
            RainfallIntensity::Heavy => "Heavy",
            RainfallIntensity::VeryHeavy => "Very heavy",
            RainfallIntensity::Extreme => "Extreme",
        }
    }
}

/// Fill color for a rainfall cell. The ramp has one more step than the
/// intensity labels: 20-40 mm and 40+ mm differ in color only.
pub fn rainfall_color(value_mm: f64) -> &'static str {
    if value_mm <= 0.0 {
        "transparent"
    } else if value_mm < 1.0 {
        "rgba(200, 250, 255, 0.5)"
    } else if value_mm < 2.5 {
        "rgba(100, 200, 255, 0.5)"
    } else if value_mm < 5.0 {
        "rgba(50, 150, 255, 0.6)"
    } else if value_mm < 10.0 {
        "rgba(0, 100, 255, 0.7)"
    } else if value_mm < 20.0 {
        "rgba(0, 50, 200, 0.7)"
    } else if value_mm < 40.0 {
        "rgba(100, 0, 200, 0.7)"
    } else {
        "rgba(150, 0, 150, 0.7)"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureBand {
    Freezing,
    Cold,
    Mild,
    Warm,
    Hot,
}

impl TemperatureBand {
    pub const ALL: [TemperatureBand; 5] = [
        TemperatureBand::Freezing,
        TemperatureBand::Cold,
        TemperatureBand::Mild,
        TemperatureBand::Warm,
        TemperatureBand::Hot,
    ];

    pub fn from_celsius(celsius: f64) -> Self {
        if celsius < 0.0 {
            TemperatureBand::Freezing
        } else if celsius < 10.0 {
            TemperatureBand::Cold
        } else if celsius < 20.0 {
            TemperatureBand::Mild
        } else if celsius < 30.0 {
            TemperatureBand::Warm
        } else {
            TemperatureBand::Hot
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            TemperatureBand::Freezing => "#9ca3af",
            TemperatureBand::Cold => "#3b82f6",
            TemperatureBand::Mild => "#10b981",
            TemperatureBand::Warm => "#f59e0b",
            TemperatureBand::Hot => "#ef4444",
        }
    }

    fn range(self) -> &'static str {
        match self {
            TemperatureBand::Freezing => "< 0°C",
            TemperatureBand::Cold => "0-10°C",
            TemperatureBand::Mild => "10-20°C",
            TemperatureBand::Warm => "20-30°C",
            TemperatureBand::Hot => "30°C+",
        }
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn fire_color(confidence: Confidence) -> &'static str {
    match confidence {
        Confidence::High => "#FF3300",
        Confidence::Medium => "#FF6600",
        Confidence::Low => "#FF9900",
    }
}

/// Radius in metres of a circle covering the burned area.
pub fn fire_radius_m(area_hectares: f64) -> f64 {
    (area_hectares * 10_000.0 / PI).sqrt()
}

/// Lower edge of each rainfall color step and its legend text.
const RAINFALL_STEPS: [(f64, &str); 7] = [
    (0.5, "< 1 mm"),
    (1.0, "1-2.5 mm"),
    (2.5, "2.5-5 mm"),
    (5.0, "5-10 mm"),
    (10.0, "10-20 mm"),
    (20.0, "20-40 mm"),
    (40.0, "40+ mm"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    pub air_quality: Vec<LegendEntry>,
    pub rainfall: Vec<LegendEntry>,
    pub wildfire: Vec<LegendEntry>,
    pub temperature: Vec<LegendEntry>,
}

pub fn legend() -> Legend {
    Legend {
        air_quality: AqiCategory::ALL
            .iter()
            .map(|category| LegendEntry {
                label: format!("{} ({})", category.label(), category.range()),
                color: category.color(),
            })
            .collect(),
        rainfall: RAINFALL_STEPS
            .iter()
            .map(|(lower, label)| LegendEntry {
                label: label.to_string(),
                color: rainfall_color(*lower),
            })
            .collect(),
        wildfire: [
            (Confidence::High, "High"),
            (Confidence::Medium, "Medium"),
            (Confidence::Low, "Low"),
        ]
        .iter()
        .map(|(confidence, name)| LegendEntry {
            label: format!("{name} confidence"),
            color: fire_color(*confidence),
        })
        .collect(),
        temperature: TemperatureBand::ALL
            .iter()
            .map(|band| LegendEntry {
                label: band.range().to_string(),
                color: band.color(),
            })
            .collect(),
    }
}

/// A weather reading with what a popup shows next to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherView {
    #[serde(flatten)]
    pub reading: WeatherReading,
    pub temperature_fahrenheit: f64,
    pub band: TemperatureBand,
    pub color: &'static str,
}

impl From<WeatherReading> for WeatherView {
    fn from(reading: WeatherReading) -> Self {
        let band = TemperatureBand::from_celsius(reading.temperature_celsius);
        Self {
            temperature_fahrenheit: round1(celsius_to_fahrenheit(reading.temperature_celsius)),
            band,
            color: band.color(),
            reading,
        }
    }
}

/// A wildfire as drawn on the map: a circle sized to the burned area.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WildfireMarker {
    #[serde(flatten)]
    pub incident: WildfireIncident,
    pub color: &'static str,
    pub radius_m: f64,
    pub started: Option<DateTime<Utc>>,
}

impl From<WildfireIncident> for WildfireMarker {
    fn from(incident: WildfireIncident) -> Self {
        Self {
            color: fire_color(incident.confidence),
            radius_m: round1(fire_radius_m(incident.area_hectares)),
            started: incident.started_at_utc(),
            incident,
        }
    }
}
