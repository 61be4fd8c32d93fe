use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    model::{AqiReading, RainfallGrid, StationReading, WeatherReading, WildfireIncident},
    simulators::LayerKind,
    statistics::{
        summarize_air_quality, summarize_rainfall, summarize_weather, summarize_wildfires,
        DashboardStatistics,
    },
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum LayerPayload {
    Weather(Vec<StationReading<WeatherReading>>),
    AirQuality(Vec<StationReading<AqiReading>>),
    Rainfall(RainfallGrid),
    Wildfire(Vec<WildfireIncident>),
}

impl LayerPayload {
    pub fn kind(&self) -> LayerKind {
        match self {
            LayerPayload::Weather(_) => LayerKind::Weather,
            LayerPayload::AirQuality(_) => LayerKind::AirQuality,
            LayerPayload::Rainfall(_) => LayerKind::Rainfall,
            LayerPayload::Wildfire(_) => LayerKind::Wildfire,
        }
    }
}

/// One refresh of one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerFrame {
    pub layer: LayerKind,
    pub generation: u64,
    pub produced_at: DateTime<Utc>,
    /// The selected time the fetch ran against; `None` means live.
    pub reference_time: Option<DateTime<Utc>>,
    pub payload: LayerPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub name: String,
    pub selected_time: Option<DateTime<Utc>>,
    pub layers: BTreeMap<LayerKind, LayerFrame>,
    pub statistics: DashboardStatistics,
}

impl DashboardSnapshot {
    pub fn from_frames(
        name: impl Into<String>,
        selected_time: Option<DateTime<Utc>>,
        layers: BTreeMap<LayerKind, LayerFrame>,
    ) -> Self {
        let statistics = statistics_for(&layers);
        Self {
            name: name.into(),
            selected_time,
            layers,
            statistics,
        }
    }
}

/// Layers that have not produced a frame yet leave their summary empty.
pub fn statistics_for(layers: &BTreeMap<LayerKind, LayerFrame>) -> DashboardStatistics {
    let mut statistics = DashboardStatistics {
        weather: None,
        air_quality: None,
        rainfall: None,
        wildfires: None,
    };
    for frame in layers.values() {
        match &frame.payload {
            LayerPayload::Weather(readings) => statistics.weather = summarize_weather(readings),
            LayerPayload::AirQuality(readings) => {
                statistics.air_quality = summarize_air_quality(readings)
            }
            LayerPayload::Rainfall(grid) => statistics.rainfall = Some(summarize_rainfall(grid)),
            LayerPayload::Wildfire(fires) => {
                statistics.wildfires = Some(summarize_wildfires(fires))
            }
        }
    }
    statistics
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::simulators::wildfire::SOUTHERN_FIRES;

    fn frame(payload: LayerPayload) -> LayerFrame {
        LayerFrame {
            layer: payload.kind(),
            generation: 1,
            produced_at: Utc.with_ymd_and_hms(2025, 1, 5, 8, 0, 0).unwrap(),
            reference_time: None,
            payload,
        }
    }

    #[test]
    fn missing_layers_have_no_statistics() {
        let mut layers = BTreeMap::new();
        layers.insert(
            LayerKind::Wildfire,
            frame(LayerPayload::Wildfire(SOUTHERN_FIRES.to_vec())),
        );
        let snapshot = DashboardSnapshot::from_frames("test", None, layers);
        assert!(snapshot.statistics.weather.is_none());
        assert!(snapshot.statistics.rainfall.is_none());
        assert_eq!(snapshot.statistics.wildfires.as_ref().map(|s| s.active), Some(5));
    }

    #[test]
    fn serializes_with_layer_keys() {
        let mut layers = BTreeMap::new();
        layers.insert(
            LayerKind::Rainfall,
            frame(LayerPayload::Rainfall(RainfallGrid::default())),
        );
        let snapshot = DashboardSnapshot::from_frames("demo", None, layers);
        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["layers"]["rainfall"]["payload"]["kind"], "rainfall");
        assert_eq!(json["layers"]["rainfall"]["generation"], 1);
        assert_eq!(json["statistics"]["rainfall"]["cells"], 0);
        assert!(json["selectedTime"].is_null());
    }
}
