//! Keeps every map layer fresh: periodic refreshes per layer, an immediate
//! refresh when the selected time moves, and last-write-wins publication.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{
    sync::{broadcast, watch},
    task::JoinSet,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use crate::{
    clock::ReferenceTime,
    config::DashboardConfig,
    service::EnvironmentService,
    simulators::LayerKind,
    snapshot::{DashboardSnapshot, LayerFrame, LayerPayload},
};

const FRAME_CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
struct Board {
    issued: BTreeMap<LayerKind, u64>,
    latest: BTreeMap<LayerKind, LayerFrame>,
}

struct Shared {
    name: String,
    service: EnvironmentService,
    intervals: BTreeMap<LayerKind, Duration>,
    selected: watch::Sender<Option<DateTime<Utc>>>,
    frames: broadcast::Sender<LayerFrame>,
    board: Mutex<Board>,
}

#[derive(Clone)]
pub struct LayerPoller {
    shared: Arc<Shared>,
}

/// Running layer loops. Dropping the handle aborts them.
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    tasks: JoinSet<()>,
}

impl PollerHandle {
    pub async fn shutdown(mut self) {
        self.shutdown.send_replace(true);
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "layer loop ended abnormally");
            }
        }
    }
}

impl LayerPoller {
    pub fn new(service: EnvironmentService, config: &DashboardConfig) -> Self {
        let intervals = LayerKind::ALL
            .iter()
            .map(|kind| (*kind, config.poll_interval(*kind)))
            .collect();
        let (selected, _) = watch::channel(None);
        let (frames, _) = broadcast::channel(FRAME_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                name: config.name.clone(),
                service,
                intervals,
                selected,
                frames,
                board: Mutex::new(Board::default()),
            }),
        }
    }

    pub fn service(&self) -> &EnvironmentService {
        &self.shared.service
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LayerFrame> {
        self.shared.frames.subscribe()
    }

    /// `None` returns every layer to live data.
    pub fn select_time(&self, at: Option<DateTime<Utc>>) {
        info!(selected = ?at, "selected time changed");
        self.shared.selected.send_replace(at);
    }

    pub fn selected_time(&self) -> Option<DateTime<Utc>> {
        *self.shared.selected.borrow()
    }

    pub fn latest(&self, kind: LayerKind) -> Option<LayerFrame> {
        self.board().latest.get(&kind).cloned()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let layers = self.board().latest.clone();
        DashboardSnapshot::from_frames(self.shared.name.clone(), self.selected_time(), layers)
    }

    fn board(&self) -> std::sync::MutexGuard<'_, Board> {
        self.shared
            .board
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn start(&self) -> PollerHandle {
        let (shutdown, _) = watch::channel(false);
        let mut tasks = JoinSet::new();
        for (kind, interval) in &self.shared.intervals {
            let poller = self.clone();
            let shutdown = shutdown.subscribe();
            let (kind, interval) = (*kind, *interval);
            tasks.spawn(async move { poller.run_layer(kind, interval, shutdown).await });
        }
        PollerHandle { shutdown, tasks }
    }

    async fn run_layer(
        self,
        kind: LayerKind,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut selected = self.shared.selected.subscribe();
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Fetches run detached from the loop so a time change never waits on
        // a slow refresh; stale results are filtered at publication.
        let mut inflight = JoinSet::new();

        loop {
            let reference = tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => *selected.borrow(),
                changed = selected.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    *selected.borrow_and_update()
                }
                Some(joined) = inflight.join_next() => {
                    if let Err(err) = joined {
                        warn!(layer = kind.name(), error = %err, "layer refresh failed");
                    }
                    continue;
                }
            };
            let poller = self.clone();
            inflight.spawn(async move {
                poller.refresh(kind, reference).await;
            });
        }
        debug!(layer = kind.name(), "layer loop stopped");
    }

    /// Runs one fetch for `kind` and publishes it unless a newer one already
    /// landed.
    pub async fn refresh(&self, kind: LayerKind, reference: Option<DateTime<Utc>>) -> bool {
        let generation = self.issue(kind);
        let service = &self.shared.service;
        let reference_time = reference.map(ReferenceTime::from);
        let payload = match kind {
            LayerKind::Weather => {
                LayerPayload::Weather(service.weather_layer(reference_time).await)
            }
            LayerKind::AirQuality => LayerPayload::AirQuality(service.air_quality_layer().await),
            LayerKind::Rainfall => LayerPayload::Rainfall(service.rainfall(reference_time).await),
            LayerKind::Wildfire => LayerPayload::Wildfire(service.wildfires().await),
        };
        self.publish(LayerFrame {
            layer: kind,
            generation,
            produced_at: service.now(),
            reference_time: reference,
            payload,
        })
    }

    fn issue(&self, kind: LayerKind) -> u64 {
        let mut board = self.board();
        let counter = board.issued.entry(kind).or_insert(0);
        *counter += 1;
        *counter
    }

    fn publish(&self, frame: LayerFrame) -> bool {
        {
            let mut board = self.board();
            if let Some(current) = board.latest.get(&frame.layer) {
                if current.generation >= frame.generation {
                    debug!(
                        layer = frame.layer.name(),
                        stale = frame.generation,
                        current = current.generation,
                        "discarding stale layer result"
                    );
                    return false;
                }
            }
            board.latest.insert(frame.layer, frame.clone());
        }
        info!(
            layer = frame.layer.name(),
            generation = frame.generation,
            "layer refreshed"
        );
        // No subscribers is fine; the board still holds the frame.
        let _ = self.shared.frames.send(frame);
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{
        clock::FixedClock,
        config::LatencyConfig,
        service::{ServiceBuilder, ServiceSettings},
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 20, 9, 0, 0).unwrap()
    }

    fn poller(latency: LatencyConfig) -> LayerPoller {
        poller_with(DashboardConfig {
            seed: Some(11),
            latency,
            ..DashboardConfig::default()
        })
    }

    fn poller_with(config: DashboardConfig) -> LayerPoller {
        let service = ServiceBuilder::new(ServiceSettings::from_config(&config))
            .with_clock(Arc::new(FixedClock::new(now())))
            .build();
        LayerPoller::new(service, &config)
    }

    fn wildfire_frame(generation: u64) -> LayerFrame {
        LayerFrame {
            layer: LayerKind::Wildfire,
            generation,
            produced_at: now(),
            reference_time: None,
            payload: LayerPayload::Wildfire(Vec::new()),
        }
    }

    #[test]
    fn older_generation_never_overwrites_newer() {
        let poller = poller(LatencyConfig::none());
        assert!(poller.publish(wildfire_frame(2)));
        assert!(!poller.publish(wildfire_frame(1)));
        assert!(!poller.publish(wildfire_frame(2)));
        assert_eq!(poller.latest(LayerKind::Wildfire).unwrap().generation, 2);
        assert!(poller.publish(wildfire_frame(3)));
    }

    #[tokio::test]
    async fn result_issued_earlier_but_landing_later_is_dropped() {
        let poller = poller(LatencyConfig::none());
        let early = poller.issue(LayerKind::Rainfall);
        assert!(poller.refresh(LayerKind::Rainfall, None).await);

        let mut late = poller.latest(LayerKind::Rainfall).unwrap();
        late.generation = early;
        assert!(!poller.publish(late));
        assert_eq!(poller.latest(LayerKind::Rainfall).unwrap().generation, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn loops_fill_every_layer_and_follow_selection() {
        let poller = poller(LatencyConfig::none());
        let mut frames = poller.subscribe();
        let handle = poller.start();

        let mut seen = BTreeMap::new();
        while seen.len() < LayerKind::ALL.len() {
            let frame = frames.recv().await.unwrap();
            seen.insert(frame.layer, frame.generation);
        }
        assert!(seen.values().all(|generation| *generation == 1));

        let past = now() - chrono::Duration::hours(6);
        poller.select_time(Some(past));
        loop {
            let frame = frames.recv().await.unwrap();
            if frame.layer == LayerKind::Weather && frame.generation == 2 {
                assert_eq!(frame.reference_time, Some(past));
                break;
            }
        }

        let snapshot = poller.snapshot();
        assert_eq!(snapshot.layers.len(), 4);
        assert_eq!(snapshot.selected_time, Some(past));
        assert!(snapshot.statistics.weather.is_some());
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn zero_minute_interval_still_polls() {
        let mut config = DashboardConfig {
            seed: Some(11),
            latency: LatencyConfig::none(),
            ..DashboardConfig::default()
        };
        config.polling.weather_minutes = 0;
        let poller = poller_with(config);
        let handle = poller.start();

        tokio::time::sleep(Duration::from_secs(5)).await;
        let frame = poller.latest(LayerKind::Weather).expect("weather frame");
        assert_eq!(frame.generation, 1);
        assert_eq!(poller.shared.intervals[&LayerKind::Weather], Duration::from_secs(60));
        handle.shutdown().await;
    }
}
