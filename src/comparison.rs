//! Week-long series comparing one metric across several cities.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{Duration, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::simulators::round1;

pub const SERIES_DAYS: i64 = 7;

pub const DEFAULT_LOCATIONS: [&str; 3] = ["New York", "London", "Tokyo"];

pub const MAX_LOCATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Temperature,
    Aqi,
    Rainfall,
    Humidity,
}

#[derive(Debug, Error)]
#[error("unknown metric '{0}' (expected temperature, aqi, rainfall or humidity)")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "temperature" | "temp" => Ok(Metric::Temperature),
            "aqi" | "air_quality" => Ok(Metric::Aqi),
            "rainfall" | "rain" => Ok(Metric::Rainfall),
            "humidity" => Ok(Metric::Humidity),
            _ => Err(UnknownMetric(value.to_string())),
        }
    }
}

impl Metric {
    pub fn unit(self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Aqi => "",
            Metric::Rainfall => "mm",
            Metric::Humidity => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("at least one location is required")]
    Empty,
    #[error("at most {MAX_LOCATIONS} locations can be compared, got {0}")]
    TooMany(usize),
}

/// Trims names, drops blanks and repeats (first occurrence wins), then
/// enforces the 1..=5 range.
pub fn select_locations<S: AsRef<str>>(requested: &[S]) -> Result<Vec<String>, LocationError> {
    let mut selected: Vec<String> = Vec::new();
    for name in requested {
        let name = name.as_ref().trim();
        if !name.is_empty() && !selected.iter().any(|seen| seen == name) {
            selected.push(name.to_string());
        }
    }
    match selected.len() {
        0 => Err(LocationError::Empty),
        n if n > MAX_LOCATIONS => Err(LocationError::TooMany(n)),
        _ => Ok(selected),
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Temperature => "temperature",
            Metric::Aqi => "aqi",
            Metric::Rainfall => "rainfall",
            Metric::Humidity => "humidity",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub name: &'static str,
    pub temperature: f64,
    pub aqi: f64,
    pub rainfall: f64,
    pub humidity: f64,
}

const fn baseline(
    name: &'static str,
    temperature: f64,
    aqi: f64,
    rainfall: f64,
    humidity: f64,
) -> Baseline {
    Baseline {
        name,
        temperature,
        aqi,
        rainfall,
        humidity,
    }
}

pub const AVAILABLE_LOCATIONS: [Baseline; 12] = [
    baseline("New York", 18.0, 60.0, 5.0, 65.0),
    baseline("London", 15.0, 45.0, 8.0, 70.0),
    baseline("Tokyo", 22.0, 70.0, 6.0, 70.0),
    baseline("Paris", 17.0, 55.0, 6.0, 60.0),
    baseline("Beijing", 25.0, 120.0, 3.0, 55.0),
    baseline("Sydney", 23.0, 30.0, 4.0, 65.0),
    baseline("Berlin", 16.0, 50.0, 5.0, 60.0),
    baseline("Moscow", 12.0, 80.0, 4.0, 50.0),
    baseline("Rio de Janeiro", 27.0, 65.0, 10.0, 75.0),
    baseline("Cape Town", 21.0, 40.0, 3.0, 60.0),
    baseline("Dubai", 32.0, 90.0, 0.5, 45.0),
    baseline("Singapore", 24.0, 60.0, 12.0, 80.0),
];

/// Used for any name outside [`AVAILABLE_LOCATIONS`].
const FALLBACK: Baseline = baseline("", 24.0, 60.0, 2.0, 65.0);

pub fn baseline_for(location: &str) -> &'static Baseline {
    AVAILABLE_LOCATIONS
        .iter()
        .find(|candidate| candidate.name == location)
        .unwrap_or(&FALLBACK)
}

/// One day of the series. Location names become keys next to `date` when
/// serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPoint {
    pub date: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

fn sample<R: Rng + ?Sized>(rng: &mut R, metric: Metric, base: &Baseline) -> f64 {
    match metric {
        Metric::Temperature => base.temperature + (rng.gen::<f64>() - 0.5) * 5.0,
        Metric::Aqi => base.aqi + (rng.gen::<f64>() - 0.5) * 15.0,
        Metric::Humidity => base.humidity + (rng.gen::<f64>() - 0.5) * 10.0,
        Metric::Rainfall => {
            // Mostly dry days with the occasional downpour.
            if rng.gen::<f64>() > 0.6 {
                base.rainfall + rng.gen::<f64>() * 15.0
            } else {
                rng.gen::<f64>() * 2.0
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub metric: Metric,
    pub unit: &'static str,
    pub locations: Vec<String>,
    pub series: Vec<ComparisonPoint>,
    pub averages: BTreeMap<String, f64>,
}

impl ComparisonReport {
    pub fn new(metric: Metric, locations: Vec<String>, series: Vec<ComparisonPoint>) -> Self {
        let averages = weekly_averages(&series, &locations);
        Self {
            metric,
            unit: metric.unit(),
            locations,
            series,
            averages,
        }
    }
}

/// Mean per location over the series, to one decimal.
pub fn weekly_averages<S: AsRef<str>>(
    series: &[ComparisonPoint],
    locations: &[S],
) -> BTreeMap<String, f64> {
    locations
        .iter()
        .filter_map(|location| {
            let location = location.as_ref();
            let values: Vec<f64> = series
                .iter()
                .filter_map(|point| point.values.get(location).copied())
                .collect();
            if values.is_empty() {
                return None;
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            Some((location.to_string(), round1(mean)))
        })
        .collect()
}

/// Seven days ending on `today`, oldest first.
pub fn comparison_series<R: Rng + ?Sized, S: AsRef<str>>(
    rng: &mut R,
    today: NaiveDate,
    metric: Metric,
    locations: &[S],
) -> Vec<ComparisonPoint> {
    (0..SERIES_DAYS)
        .rev()
        .map(|days_back| {
            let date = today - Duration::days(days_back);
            let values = locations
                .iter()
                .map(|location| {
                    let location = location.as_ref();
                    let value = round1(sample(rng, metric, baseline_for(location)));
                    (location.to_string(), value)
                })
                .collect();
            ComparisonPoint {
                date: date.format("%b %-d").to_string(),
                values,
            }
        })
        .collect()
}
