//! Summary figures for the statistics panel, derived from live layer data.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    legend::{AqiCategory, RainfallIntensity},
    model::{AqiReading, Confidence, RainfallGrid, StationReading, WeatherReading, WildfireIncident},
    simulators::round1,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSummary {
    pub stations: usize,
    pub mean_temperature_celsius: f64,
    pub min_temperature_celsius: f64,
    pub max_temperature_celsius: f64,
    pub mean_humidity_percent: f64,
    pub mean_wind_speed_kph: f64,
}

pub fn summarize_weather(readings: &[StationReading<WeatherReading>]) -> Option<WeatherSummary> {
    if readings.is_empty() {
        return None;
    }
    let count = readings.len() as f64;
    let temperatures = readings.iter().map(|r| r.reading.temperature_celsius);
    let min = temperatures.clone().fold(f64::INFINITY, f64::min);
    let max = temperatures.clone().fold(f64::NEG_INFINITY, f64::max);
    let mean_temperature = temperatures.sum::<f64>() / count;
    let mean_humidity = readings
        .iter()
        .map(|r| f64::from(r.reading.humidity_percent))
        .sum::<f64>()
        / count;
    let mean_wind = readings.iter().map(|r| r.reading.wind_speed_kph).sum::<f64>() / count;
    Some(WeatherSummary {
        stations: readings.len(),
        mean_temperature_celsius: round1(mean_temperature),
        min_temperature_celsius: min,
        max_temperature_celsius: max,
        mean_humidity_percent: round1(mean_humidity),
        mean_wind_speed_kph: round1(mean_wind),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: AqiCategory,
    pub label: &'static str,
    pub color: &'static str,
    pub stations: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualitySummary {
    pub stations: usize,
    pub mean_aqi: f64,
    pub max_aqi: u32,
    /// Every category, including empty ones, in severity order.
    pub distribution: Vec<CategoryShare>,
}

pub fn summarize_air_quality(readings: &[StationReading<AqiReading>]) -> Option<AirQualitySummary> {
    if readings.is_empty() {
        return None;
    }
    let total = readings.len();
    let mut counts: BTreeMap<AqiCategory, usize> = BTreeMap::new();
    for reading in readings {
        *counts
            .entry(AqiCategory::from_aqi(reading.reading.aqi))
            .or_default() += 1;
    }
    let distribution = AqiCategory::ALL
        .iter()
        .map(|category| {
            let stations = counts.get(category).copied().unwrap_or(0);
            CategoryShare {
                category: *category,
                label: category.label(),
                color: category.color(),
                stations,
                percent: round1(stations as f64 * 100.0 / total as f64),
            }
        })
        .collect();
    let sum: u64 = readings.iter().map(|r| u64::from(r.reading.aqi)).sum();
    Some(AirQualitySummary {
        stations: total,
        mean_aqi: round1(sum as f64 / total as f64),
        max_aqi: readings.iter().map(|r| r.reading.aqi).max().unwrap_or(0),
        distribution,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RainfallSummary {
    pub cells: usize,
    pub wet_cells: usize,
    pub total_mm: f64,
    /// Mean over wet cells only; zero when nothing fell.
    pub mean_wet_mm: f64,
    pub max_mm: f64,
    pub by_intensity: BTreeMap<RainfallIntensity, usize>,
}

pub fn summarize_rainfall(grid: &RainfallGrid) -> RainfallSummary {
    let mut by_intensity = BTreeMap::new();
    let mut wet = 0usize;
    let mut total = 0.0;
    let mut max: f64 = 0.0;
    for cell in &grid.cells {
        *by_intensity
            .entry(RainfallIntensity::from_mm(cell.value_mm))
            .or_insert(0) += 1;
        if cell.value_mm > 0.0 {
            wet += 1;
            total += cell.value_mm;
            max = max.max(cell.value_mm);
        }
    }
    RainfallSummary {
        cells: grid.cells.len(),
        wet_cells: wet,
        total_mm: round1(total),
        mean_wet_mm: if wet == 0 { 0.0 } else { round1(total / wet as f64) },
        max_mm: max,
        by_intensity,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WildfireSummary {
    pub active: usize,
    pub total_area_hectares: f64,
    pub largest: Option<&'static str>,
    pub by_confidence: BTreeMap<&'static str, usize>,
}

fn confidence_key(confidence: Confidence) -> &'static str {
    match confidence {
        Confidence::Low => "low",
        Confidence::Medium => "medium",
        Confidence::High => "high",
    }
}

pub fn summarize_wildfires(fires: &[WildfireIncident]) -> WildfireSummary {
    let mut by_confidence = BTreeMap::new();
    for fire in fires {
        *by_confidence
            .entry(confidence_key(fire.confidence))
            .or_insert(0) += 1;
    }
    let largest = fires
        .iter()
        .max_by(|a, b| a.area_hectares.total_cmp(&b.area_hectares))
        .map(|fire| fire.name);
    WildfireSummary {
        active: fires.len(),
        total_area_hectares: fires.iter().map(|fire| fire.area_hectares).sum(),
        largest,
        by_confidence,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatistics {
    pub weather: Option<WeatherSummary>,
    pub air_quality: Option<AirQualitySummary>,
    pub rainfall: Option<RainfallSummary>,
    pub wildfires: Option<WildfireSummary>,
}
