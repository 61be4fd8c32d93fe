use std::{collections::BTreeMap, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use ecomap::{
    clock::ReferenceTime,
    comparison::{LocationError, Metric, DEFAULT_LOCATIONS},
    config::{ConfigLoader, DashboardConfig},
    geo::find_city,
    legend::{legend, WeatherView, WildfireMarker},
    model::GeoPoint,
    service::EnvironmentService,
    snapshot::{statistics_for, LayerFrame, LayerPayload},
    timeline::{SliderState, TimeWindow},
    web::{self, WebServerConfig},
    LayerKind,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Simulated environmental map layers")]
struct Cli {
    /// Path to a dashboard YAML file (built-in defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Current or historical weather at a point
    Weather {
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
        /// Look a known city up instead of giving coordinates
        #[arg(long)]
        city: Option<String>,
        /// Reference time, e.g. 2025-07-01T12:00:00Z
        #[arg(long)]
        time: Option<String>,
    },
    /// Air quality index at a point
    Aqi {
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
        #[arg(long)]
        city: Option<String>,
    },
    /// Global rainfall grid
    Rainfall {
        #[arg(long)]
        time: Option<String>,
        /// Only print cells with rain
        #[arg(long)]
        wet_only: bool,
    },
    /// Active wildfires
    Wildfires,
    /// Week-long comparison of one metric across one to five cities
    Compare {
        #[arg(long, default_value = "temperature")]
        metric: Metric,
        /// Comma separated city names
        #[arg(long, value_delimiter = ',')]
        locations: Vec<String>,
    },
    /// Colors and labels for every map layer
    Legend,
    /// Moment in time for a slider position
    Timeline {
        #[arg(long, value_enum, default_value = "week")]
        window: WindowArg,
        #[arg(long, default_value_t = 100.0)]
        percent: f64,
    },
    /// Summary statistics over every layer
    Stats,
    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum WindowArg {
    Day,
    Week,
}

impl From<WindowArg> for TimeWindow {
    fn from(value: WindowArg) -> Self {
        match value {
            WindowArg::Day => TimeWindow::Day,
            WindowArg::Week => TimeWindow::Week,
        }
    }
}

fn load_config(cli: &Cli) -> Result<DashboardConfig> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::new(".")
            .load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    Ok(config)
}

fn init_tracing(level: &str) {
    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_point(lat: Option<f64>, lon: Option<f64>, city: Option<&str>) -> Result<GeoPoint> {
    if let Some(name) = city {
        return find_city(name)
            .map(|city| city.location)
            .ok_or_else(|| anyhow!("unknown city '{name}'"));
    }
    match (lat, lon) {
        (Some(lat), Some(lon)) => Ok(GeoPoint::new(lat, lon)),
        _ => Err(anyhow!("either --city or both --lat and --lon are required")),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("encoding output")?;
    println!("{text}");
    Ok(())
}

fn location_error(err: LocationError) -> clap::Error {
    let kind = match err {
        LocationError::TooMany(_) => ErrorKind::TooManyValues,
        LocationError::Empty => ErrorKind::InvalidValue,
    };
    Cli::command().error(kind, format!("--locations: {err}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.logging.level);

    let service = EnvironmentService::from_config(&config);
    match cli.command {
        Command::Weather {
            lat,
            lon,
            city,
            time,
        } => {
            let point = resolve_point(lat, lon, city.as_deref())?;
            let reading = service.weather(point, time.map(ReferenceTime::from)).await;
            print_json(&WeatherView::from(reading))
        }
        Command::Aqi { lat, lon, city } => {
            let point = resolve_point(lat, lon, city.as_deref())?;
            print_json(&service.air_quality(point).await)
        }
        Command::Rainfall { time, wet_only } => {
            let mut grid = service.rainfall(time.map(ReferenceTime::from)).await;
            if wet_only {
                grid.cells.retain(|cell| cell.value_mm > 0.0);
            }
            print_json(&grid)
        }
        Command::Wildfires => {
            let markers: Vec<WildfireMarker> = service
                .wildfires()
                .await
                .into_iter()
                .map(WildfireMarker::from)
                .collect();
            print_json(&markers)
        }
        Command::Compare { metric, locations } => {
            let locations = if locations.is_empty() {
                DEFAULT_LOCATIONS.iter().map(|name| name.to_string()).collect()
            } else {
                locations
            };
            match service.comparison(metric, &locations) {
                Ok(report) => print_json(&report),
                Err(err) => location_error(err).exit(),
            }
        }
        Command::Legend => print_json(&legend()),
        Command::Timeline { window, percent } => print_json(&SliderState::new(
            service.now(),
            TimeWindow::from(window),
            percent,
        )),
        Command::Stats => {
            let (weather, air_quality, rainfall, wildfires) = tokio::join!(
                service.weather_layer(None),
                service.air_quality_layer(),
                service.rainfall(None),
                service.wildfires(),
            );
            let produced_at = service.now();
            let layers: BTreeMap<_, _> = [
                LayerPayload::Weather(weather),
                LayerPayload::AirQuality(air_quality),
                LayerPayload::Rainfall(rainfall),
                LayerPayload::Wildfire(wildfires),
            ]
            .into_iter()
            .map(|payload| {
                let layer: LayerKind = payload.kind();
                let frame = LayerFrame {
                    layer,
                    generation: 1,
                    produced_at,
                    reference_time: None,
                    payload,
                };
                (layer, frame)
            })
            .collect();
            print_json(&statistics_for(&layers))
        }
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            web::run(WebServerConfig { config, host, port }).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn compare_splits_location_lists() {
        let cli = Cli::try_parse_from([
            "ecomap",
            "compare",
            "--metric",
            "aqi",
            "--locations",
            "Paris,Tokyo",
        ])
        .unwrap();
        match cli.command {
            Command::Compare { metric, locations } => {
                assert_eq!(metric, Metric::Aqi);
                assert_eq!(locations, vec!["Paris", "Tokyo"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(matches!(
            Cli::try_parse_from(["ecomap", "legend"]).unwrap().command,
            Command::Legend
        ));
    }

    #[test]
    fn location_errors_become_usage_errors() {
        let err = location_error(LocationError::TooMany(6));
        assert_eq!(err.kind(), ErrorKind::TooManyValues);
        assert!(err.to_string().contains("at most 5"));
        assert_eq!(
            location_error(LocationError::Empty).kind(),
            ErrorKind::InvalidValue
        );
    }
}
