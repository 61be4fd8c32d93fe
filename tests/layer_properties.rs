use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use ecomap::{
    clock::{resolve, FixedClock, ReferenceTime},
    config::{DashboardConfig, LatencyConfig},
    model::GeoPoint,
    simulators::{
        rainfall::GRID_CELLS,
        weather::{historical_variation, latitude_effect, seasonal_offset, time_of_day_effect},
        wildfire::{NORTHERN_FIRES, SOUTHERN_FIRES},
    },
    EnvironmentService, ServiceBuilder, ServiceSettings,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 15, 14, 0, 0).unwrap()
}

fn service(seed: u64) -> EnvironmentService {
    let config = DashboardConfig {
        seed: Some(seed),
        latency: LatencyConfig::none(),
        ..DashboardConfig::default()
    };
    ServiceBuilder::new(ServiceSettings::from_config(&config))
        .with_clock(Arc::new(FixedClock::new(now())))
        .build()
}

#[tokio::test]
async fn beijing_air_is_worse_than_london() {
    let service = service(42);
    let beijing = GeoPoint::new(39.9042, 116.4074);
    let london = GeoPoint::new(51.5074, -0.1278);

    let samples = 200;
    let mut beijing_total = 0u64;
    let mut london_total = 0u64;
    for _ in 0..samples {
        beijing_total += u64::from(service.air_quality(beijing).await.aqi);
        london_total += u64::from(service.air_quality(london).await.aqi);
    }
    let beijing_mean = beijing_total as f64 / samples as f64;
    let london_mean = london_total as f64 / samples as f64;
    assert!(
        beijing_mean > london_mean * 1.5,
        "Beijing {beijing_mean} vs London {london_mean}"
    );
}

#[tokio::test]
async fn reference_time_of_now_is_live_data() {
    let point = GeoPoint::new(-33.8688, 151.2093);
    let live = service(9).weather(point, None).await;
    let same_moment = service(9)
        .weather(point, Some(ReferenceTime::from(now())))
        .await;
    assert_eq!(live, same_moment);

    let garbage = service(9)
        .weather(point, Some(ReferenceTime::from("yesterday-ish")))
        .await;
    assert_eq!(live, garbage);
}

#[tokio::test]
async fn two_days_back_takes_the_historical_branch() {
    let point = GeoPoint::new(48.8566, 2.3522);
    let reference = ReferenceTime::from(now() - Duration::hours(48));
    let resolved = resolve(Some(&reference), now());
    assert!(resolved.is_historical());
    assert_eq!(resolved.hours_ago, Some(48.0));

    let reading = service(4).weather(point, Some(reference)).await;
    // Same hour of day and month as now, so only the perturbation differs.
    let expected = latitude_effect(point)
        + seasonal_offset(point.latitude, 9)
        + time_of_day_effect(14)
        + historical_variation(48.0);
    assert!((reading.temperature_celsius - expected).abs() <= 0.1 + 1e-9);
}

#[tokio::test]
async fn layers_have_stable_shapes() {
    let service = service(17);

    let grid = service.rainfall(None).await;
    assert_eq!(grid.cells.len(), GRID_CELLS);
    assert!(grid.cells.iter().all(|cell| cell.value_mm >= 0.0));

    // October still belongs to the northern fire season.
    let fires = service.wildfires().await;
    assert!(fires.len() == 6 || fires.len() == 7);
    assert_eq!(&fires[..6], &NORTHERN_FIRES[..]);
    if let Some(extra) = fires.get(6) {
        assert!(SOUTHERN_FIRES.contains(extra));
    }

    for station in service.weather_layer(None).await {
        assert!(station.reading.humidity_percent <= 95);
        assert!(station.reading.temperature_celsius.is_finite());
    }
    for station in service.air_quality_layer().await {
        let pollutants = station.reading.pollutants;
        assert!(pollutants.o3 >= 30 && pollutants.no2 >= 20);
    }
}

#[tokio::test]
async fn same_seed_same_answers() {
    let point = GeoPoint::new(28.6139, 77.2090);
    let a = service(123);
    let b = service(123);
    for _ in 0..5 {
        assert_eq!(a.air_quality(point).await, b.air_quality(point).await);
        assert_eq!(a.wildfires().await, b.wildfires().await);
    }
    let metric = ecomap::comparison::Metric::Rainfall;
    assert_eq!(
        a.comparison(metric, &["Singapore"]).unwrap(),
        b.comparison(metric, &["Singapore"]).unwrap()
    );
}
