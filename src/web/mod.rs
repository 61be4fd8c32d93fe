use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{info, warn};

use crate::{
    clock::ReferenceTime,
    comparison::{Metric, DEFAULT_LOCATIONS},
    config::DashboardConfig,
    legend::{legend, Legend, WeatherView, WildfireMarker},
    model::GeoPoint,
    poller::LayerPoller,
    service::EnvironmentService,
    snapshot::DashboardSnapshot,
    timeline::{SliderState, TimeWindow},
};

#[derive(Clone)]
pub struct AppState {
    poller: LayerPoller,
}

impl AppState {
    pub fn new(poller: LayerPoller) -> Self {
        Self { poller }
    }

    fn service(&self) -> &EnvironmentService {
        self.poller.service()
    }
}

pub struct WebServerConfig {
    pub config: DashboardConfig,
    pub host: String,
    pub port: u16,
}

pub async fn run(server: WebServerConfig) -> Result<()> {
    let WebServerConfig { config, host, port } = server;

    let service = EnvironmentService::from_config(&config);
    let poller = LayerPoller::new(service, &config);
    let polling = poller.start();

    let router = router(Arc::new(AppState::new(poller)));

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, dashboard = %config.name, "serving environmental layers (Ctrl+C to stop)");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    polling.shutdown().await;
    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/weather", get(api_weather))
        .route("/api/weather/stations", get(api_weather_stations))
        .route("/api/aqi", get(api_air_quality))
        .route("/api/aqi/stations", get(api_air_quality_stations))
        .route("/api/rainfall", get(api_rainfall))
        .route("/api/wildfires", get(api_wildfires))
        .route("/api/comparison", get(api_comparison))
        .route("/api/timeline", get(api_timeline))
        .route("/api/legend", get(api_legend))
        .route("/api/state", get(api_state))
        .route("/api/time/select", get(api_select_time))
        .route("/api/events", get(stream_events))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "could not listen for Ctrl+C");
        return;
    }
    info!("shutting down");
}

#[derive(Debug, Deserialize)]
pub struct PointQuery {
    lat: f64,
    lon: f64,
    time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimeQuery {
    time: Option<String>,
    #[serde(default)]
    wet_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct ComparisonQuery {
    metric: Option<String>,
    /// Comma separated city names.
    locations: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    #[serde(default)]
    window: TimeWindow,
    percent: Option<f64>,
}

fn reference(text: Option<String>) -> Option<ReferenceTime> {
    text.filter(|text| !text.trim().is_empty())
        .map(ReferenceTime::from)
}

fn bad_request(message: impl Into<String>) -> Response {
    #[derive(Serialize)]
    struct ErrorBody {
        error: String,
    }
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

pub async fn api_weather(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PointQuery>,
) -> impl IntoResponse {
    let point = GeoPoint::new(params.lat, params.lon);
    let reading = state.service().weather(point, reference(params.time)).await;
    Json(WeatherView::from(reading))
}

pub async fn api_weather_stations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimeQuery>,
) -> impl IntoResponse {
    Json(state.service().weather_layer(reference(params.time)).await)
}

pub async fn api_air_quality(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PointQuery>,
) -> impl IntoResponse {
    let point = GeoPoint::new(params.lat, params.lon);
    Json(state.service().air_quality(point).await)
}

pub async fn api_air_quality_stations(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service().air_quality_layer().await)
}

pub async fn api_rainfall(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimeQuery>,
) -> impl IntoResponse {
    let mut grid = state.service().rainfall(reference(params.time)).await;
    if params.wet_only {
        grid.cells.retain(|cell| cell.value_mm > 0.0);
    }
    Json(grid)
}

pub async fn api_wildfires(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let markers: Vec<WildfireMarker> = state
        .service()
        .wildfires()
        .await
        .into_iter()
        .map(WildfireMarker::from)
        .collect();
    Json(markers)
}

pub async fn api_comparison(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ComparisonQuery>,
) -> Response {
    let metric = match params.metric.as_deref().map(str::parse::<Metric>) {
        None => Metric::Temperature,
        Some(Ok(metric)) => metric,
        Some(Err(err)) => return bad_request(err.to_string()),
    };
    let locations: Vec<&str> = match params.locations.as_deref() {
        Some(list) => list.split(',').collect(),
        None => DEFAULT_LOCATIONS.to_vec(),
    };
    match state.service().comparison(metric, &locations) {
        Ok(report) => Json(report).into_response(),
        Err(err) => bad_request(err.to_string()),
    }
}

pub async fn api_timeline(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimelineQuery>,
) -> Json<SliderState> {
    let now = state.service().now();
    Json(SliderState::new(
        now,
        params.window,
        params.percent.unwrap_or(100.0),
    ))
}

pub async fn api_legend() -> Json<Legend> {
    Json(legend())
}

pub async fn api_state(State(state): State<Arc<AppState>>) -> Json<DashboardSnapshot> {
    Json(state.poller.snapshot())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedTime {
    pub selected_time: Option<DateTime<Utc>>,
}

/// Unparseable or missing text selects live data, like the simulators do.
pub async fn api_select_time(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimeQuery>,
) -> Json<SelectedTime> {
    let at = reference(params.time).and_then(|time| time.instant());
    state.poller.select_time(at);
    Json(SelectedTime { selected_time: at })
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.poller.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(frame) => match serde_json::to_string(&frame) {
            Ok(payload) => Some(Ok(Event::default().event(frame.layer.name()).data(payload))),
            Err(err) => {
                warn!(error = %err, "could not encode layer frame");
                None
            }
        },
        // Lagged receivers skip ahead; the next frame is complete anyway.
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
