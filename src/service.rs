//! Async facade over the simulators: artificial latency, a shared random
//! source and an injected clock.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use chrono::{DateTime, FixedOffset, Utc};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::{
    clock::{resolve, CalendarPoint, Clock, ReferenceTime, SystemClock},
    comparison::{comparison_series, select_locations, ComparisonReport, LocationError, Metric},
    config::DashboardConfig,
    geo::{AIR_QUALITY_STATIONS, WEATHER_STATIONS},
    model::{
        AqiReading, GeoPoint, NamedPoint, RainfallGrid, StationReading, WeatherReading,
        WildfireIncident,
    },
    rng::{LayerRng, RngManager},
    simulators::{
        simulate_air_quality, simulate_rainfall, simulate_weather, simulate_wildfires, LayerKind,
    },
};

const COMPARISON_STREAM: &str = "comparison";

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub seed: Option<u64>,
    pub utc_offset: FixedOffset,
    pub weather_latency: Duration,
    pub air_quality_latency: Duration,
    pub rainfall_latency: Duration,
    pub wildfire_latency: Duration,
    pub rainfall_follows_reference_time: bool,
}

impl ServiceSettings {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            seed: config.seed,
            utc_offset: config.utc_offset(),
            weather_latency: config.latency(LayerKind::Weather),
            air_quality_latency: config.latency(LayerKind::AirQuality),
            rainfall_latency: config.latency(LayerKind::Rainfall),
            wildfire_latency: config.latency(LayerKind::Wildfire),
            rainfall_follows_reference_time: config.rainfall.follow_reference_time,
        }
    }

    fn latency(&self, kind: LayerKind) -> Duration {
        match kind {
            LayerKind::Weather => self.weather_latency,
            LayerKind::AirQuality => self.air_quality_latency,
            LayerKind::Rainfall => self.rainfall_latency,
            LayerKind::Wildfire => self.wildfire_latency,
        }
    }
}

pub struct ServiceBuilder {
    settings: ServiceSettings,
    clock: Option<Arc<dyn Clock>>,
}

impl ServiceBuilder {
    pub fn new(settings: ServiceSettings) -> Self {
        Self {
            settings,
            clock: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> EnvironmentService {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        EnvironmentService {
            inner: Arc::new(Inner {
                rng: Mutex::new(RngManager::seeded(self.settings.seed)),
                settings: self.settings,
                clock,
            }),
        }
    }
}

struct Inner {
    settings: ServiceSettings,
    clock: Arc<dyn Clock>,
    rng: Mutex<RngManager>,
}

/// Cheap to clone; clones share the clock and random source.
#[derive(Clone)]
pub struct EnvironmentService {
    inner: Arc<Inner>,
}

impl EnvironmentService {
    pub fn from_config(config: &DashboardConfig) -> Self {
        ServiceBuilder::new(ServiceSettings::from_config(config)).build()
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.inner.settings
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    fn calendar_now(&self) -> CalendarPoint {
        CalendarPoint::of(self.now(), self.inner.settings.utc_offset)
    }

    async fn delay(&self, kind: LayerKind) {
        let latency = self.inner.settings.latency(kind);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    /// The lock is held only for the synchronous draw, never across an await.
    fn with_rng<T>(&self, stream: &str, draw: impl FnOnce(&mut LayerRng<'_>) -> T) -> T {
        let mut manager = self
            .inner
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut rng = manager.stream(stream);
        draw(&mut rng)
    }

    pub async fn weather(
        &self,
        point: GeoPoint,
        reference: Option<ReferenceTime>,
    ) -> WeatherReading {
        self.delay(LayerKind::Weather).await;
        let time = resolve(reference.as_ref(), self.now());
        let offset = self.inner.settings.utc_offset;
        let reading = self.with_rng(LayerKind::Weather.name(), |rng| {
            simulate_weather(rng, point, &time, offset)
        });
        debug!(
            lat = point.latitude,
            lon = point.longitude,
            historical = time.is_historical(),
            temperature = reading.temperature_celsius,
            "simulated weather"
        );
        reading
    }

    pub async fn air_quality(&self, point: GeoPoint) -> AqiReading {
        self.delay(LayerKind::AirQuality).await;
        let reading = self.with_rng(LayerKind::AirQuality.name(), |rng| {
            simulate_air_quality(rng, point)
        });
        debug!(
            lat = point.latitude,
            lon = point.longitude,
            aqi = reading.aqi,
            "simulated air quality"
        );
        reading
    }

    /// The reference time only matters when the settings opt in; otherwise
    /// the grid follows the current month.
    pub async fn rainfall(&self, reference: Option<ReferenceTime>) -> RainfallGrid {
        self.delay(LayerKind::Rainfall).await;
        let settings = &self.inner.settings;
        let month0 = if settings.rainfall_follows_reference_time {
            let time = resolve(reference.as_ref(), self.now());
            CalendarPoint::of(time.at, settings.utc_offset).month0
        } else {
            if reference.is_some() {
                debug!("rainfall ignores the selected time");
            }
            self.calendar_now().month0
        };
        let grid = self.with_rng(LayerKind::Rainfall.name(), |rng| {
            simulate_rainfall(rng, month0)
        });
        debug!(month0, wet = grid.wet_cells().count(), "simulated rainfall grid");
        grid
    }

    pub async fn wildfires(&self) -> Vec<WildfireIncident> {
        self.delay(LayerKind::Wildfire).await;
        let month0 = self.calendar_now().month0;
        let fires = self.with_rng(LayerKind::Wildfire.name(), |rng| {
            simulate_wildfires(rng, month0)
        });
        debug!(month0, active = fires.len(), "simulated wildfires");
        fires
    }

    /// Samples every weather station concurrently. Stations whose task dies
    /// are left out.
    pub async fn weather_layer(
        &self,
        reference: Option<ReferenceTime>,
    ) -> Vec<StationReading<WeatherReading>> {
        let service = self.clone();
        fan_out(&WEATHER_STATIONS, move |station| {
            let service = service.clone();
            let reference = reference.clone();
            async move { service.weather(station.location, reference).await }
        })
        .await
    }

    pub async fn air_quality_layer(&self) -> Vec<StationReading<AqiReading>> {
        let service = self.clone();
        fan_out(&AIR_QUALITY_STATIONS, move |station| {
            let service = service.clone();
            async move { service.air_quality(station.location).await }
        })
        .await
    }

    /// Week of daily values up to today, in the configured offset, for one
    /// to five distinct locations.
    pub fn comparison<S: AsRef<str>>(
        &self,
        metric: Metric,
        locations: &[S],
    ) -> Result<ComparisonReport, LocationError> {
        let locations = select_locations(locations)?;
        let today = self
            .now()
            .with_timezone(&self.inner.settings.utc_offset)
            .date_naive();
        let series = self.with_rng(COMPARISON_STREAM, |rng| {
            comparison_series(rng, today, metric, &locations)
        });
        Ok(ComparisonReport::new(metric, locations, series))
    }
}

async fn fan_out<T, F, Fut>(stations: &[NamedPoint], sample: F) -> Vec<StationReading<T>>
where
    T: Send + 'static,
    F: Fn(NamedPoint) -> Fut,
    Fut: std::future::Future<Output = T> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for (index, station) in stations.iter().copied().enumerate() {
        let fut = sample(station);
        tasks.spawn(async move { (index, station, fut.await) });
    }

    let mut results = Vec::with_capacity(stations.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(err) => warn!(error = %err, "station sample failed; dropping it"),
        }
    }
    results.sort_by_key(|(index, _, _)| *index);
    results
        .into_iter()
        .map(|(_, station, reading)| StationReading { station, reading })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Duration as ChronoDuration, TimeZone};

    use super::*;
    use crate::{
        clock::FixedClock,
        config::LatencyConfig,
        simulators::wildfire::{NORTHERN_FIRES, SOUTHERN_FIRES},
    };

    fn service_at(at: DateTime<Utc>, seed: u64) -> EnvironmentService {
        let config = DashboardConfig {
            seed: Some(seed),
            latency: LatencyConfig::none(),
            ..DashboardConfig::default()
        };
        ServiceBuilder::new(ServiceSettings::from_config(&config))
            .with_clock(Arc::new(FixedClock::new(at)))
            .build()
    }

    fn july() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn seeded_services_agree() {
        let a = service_at(july(), 77);
        let b = service_at(july(), 77);
        let point = GeoPoint::new(40.0, -74.0);
        assert_eq!(a.weather(point, None).await, b.weather(point, None).await);
        assert_eq!(a.air_quality(point).await, b.air_quality(point).await);
        assert_eq!(a.rainfall(None).await, b.rainfall(None).await);
    }

    #[tokio::test]
    async fn wildfires_follow_the_clock_month() {
        let summer = service_at(july(), 1).wildfires().await;
        assert_eq!(&summer[..6], &NORTHERN_FIRES[..]);

        let winter = service_at(Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap(), 1)
            .wildfires()
            .await;
        assert_eq!(&winter[..5], &SOUTHERN_FIRES[..]);
    }

    #[tokio::test]
    async fn station_layers_keep_station_order() {
        let service = service_at(july(), 3);
        let weather = service.weather_layer(None).await;
        assert_eq!(weather.len(), WEATHER_STATIONS.len());
        for (reading, station) in weather.iter().zip(WEATHER_STATIONS.iter()) {
            assert_eq!(reading.station.name, station.name);
        }
        let aqi = service.air_quality_layer().await;
        assert_eq!(aqi.len(), AIR_QUALITY_STATIONS.len());
        assert_eq!(aqi[9].station.name, "Delhi");
    }

    #[tokio::test]
    async fn rainfall_ignores_reference_by_default() {
        // January reference against a July clock: the grids only match if
        // both use the same month.
        let reference = ReferenceTime::from(july() - ChronoDuration::days(180));
        let ignoring = service_at(july(), 5).rainfall(Some(reference.clone())).await;
        let plain = service_at(july(), 5).rainfall(None).await;
        assert_eq!(ignoring, plain);

        let config = DashboardConfig {
            seed: Some(5),
            latency: LatencyConfig::none(),
            rainfall: crate::config::RainfallConfig {
                follow_reference_time: true,
            },
            ..DashboardConfig::default()
        };
        let following = ServiceBuilder::new(ServiceSettings::from_config(&config))
            .with_clock(Arc::new(FixedClock::new(july())))
            .build()
            .rainfall(Some(reference))
            .await;
        assert_eq!(following.cells.len(), plain.cells.len());
        assert_ne!(following, plain);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_is_applied() {
        let config = DashboardConfig {
            seed: Some(1),
            ..DashboardConfig::default()
        };
        let service = ServiceBuilder::new(ServiceSettings::from_config(&config))
            .with_clock(Arc::new(FixedClock::new(july())))
            .build();
        let started = tokio::time::Instant::now();
        service.wildfires().await;
        assert!(started.elapsed() >= std::time::Duration::from_millis(500));
    }

    #[test]
    fn comparison_ends_today() {
        let service = service_at(july(), 8);
        let report = service
            .comparison(Metric::Aqi, &["Beijing", "London", "Beijing"])
            .unwrap();
        assert_eq!(report.locations, vec!["Beijing", "London"]);
        assert_eq!(report.series.len(), 7);
        assert_eq!(report.series[6].date, format!("Jul {}", july().day()));
        assert!(report.averages["Beijing"] > report.averages["London"]);
    }

    #[test]
    fn comparison_rejects_more_than_five_cities() {
        let service = service_at(july(), 8);
        let names = ["Paris", "Tokyo", "Dubai", "Berlin", "Moscow", "Sydney"];
        assert_eq!(
            service.comparison(Metric::Humidity, &names),
            Err(LocationError::TooMany(6))
        );
    }
}
