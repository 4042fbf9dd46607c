// Polling controller: fetch /nodeData on a fixed interval, apply to the dashboard, publish.
// The fixed interval is the only retry mechanism. A tick that fires while the previous
// request is still in flight is skipped, never overlapped.

use crate::dashboard::Dashboard;
use crate::merge::MergeEngine;
use crate::models::{DashboardSnapshot, NodeReading};
use crate::notify::Notifier;
use crate::telemetry_repo::{TelemetryError, TelemetrySource};
use chrono::Utc;
use futures_util::future::OptionFuture;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, interval, interval_at};
use tracing::Instrument;

pub type SnapshotReceiver = watch::Receiver<Arc<DashboardSnapshot>>;

/// Collaborators injected into the poller.
pub struct PollerDeps<S, N> {
    pub source: Arc<S>,
    pub notifier: Arc<N>,
    pub engine: MergeEngine,
    pub ws_dashboard_connections: Arc<AtomicUsize>,
}

/// Poller timing and feed config.
pub struct PollerConfig {
    pub interval_ms: u64,
    /// How often to log poll counters (real seconds).
    pub stats_log_interval_secs: u64,
    pub feed_capacity: usize,
    /// Synthetic SOS period; `None` disables it.
    pub synthetic_sos_interval_secs: Option<u64>,
}

/// Lifecycle handle for a running poller. Readers subscribe to published snapshots here.
pub struct PollerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    snapshots: SnapshotReceiver,
}

impl PollerHandle {
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.snapshots.clone()
    }

    /// Last published snapshot.
    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Stop polling and wait for the task to exit. Safe to call more than once.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "poller task ended abnormally");
        }
    }
}

type InFlight = JoinHandle<Result<Vec<NodeReading>, TelemetryError>>;

/// Spawns the poller. The first poll is issued immediately.
pub fn spawn<S, N>(deps: PollerDeps<S, N>, config: PollerConfig) -> PollerHandle
where
    S: TelemetrySource,
    N: Notifier,
{
    let PollerDeps {
        source,
        notifier,
        engine,
        ws_dashboard_connections,
    } = deps;
    let PollerConfig {
        interval_ms,
        stats_log_interval_secs,
        feed_capacity,
        synthetic_sos_interval_secs,
    } = config;

    let mut dashboard = Dashboard::new(engine, feed_capacity);
    let (state_tx, snapshots) = watch::channel(Arc::new(dashboard.snapshot(Utc::now())));
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut tick = interval(Duration::from_millis(interval_ms));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let stats_log_interval = Duration::from_secs(stats_log_interval_secs);
        let mut stats_log_tick =
            interval_at(Instant::now() + stats_log_interval, stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut sos_tick = synthetic_sos_interval_secs.map(|secs| {
            let period = Duration::from_secs(secs);
            let mut t = interval_at(Instant::now() + period, period);
            t.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            t
        });

        let mut in_flight: Option<InFlight> = None;
        let mut polls_ok: u64 = 0;
        let mut polls_failed: u64 = 0;
        let mut polls_skipped: u64 = 0;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if in_flight.is_some() {
                        polls_skipped += 1;
                        tracing::debug!(
                            operation = "poll_node_data",
                            "previous request still in flight; skipping tick"
                        );
                        continue;
                    }
                    let source = source.clone();
                    in_flight = Some(tokio::spawn(async move { source.node_data().await }));
                }
                Some(joined) = OptionFuture::from(in_flight.as_mut()) => {
                    in_flight = None;
                    let now = Utc::now();
                    match joined {
                        Ok(Ok(readings)) => {
                            polls_ok += 1;
                            tracing::debug!(
                                operation = "poll_node_data",
                                readings_count = readings.len(),
                                "poll succeeded"
                            );
                            for n in dashboard.apply_success(&readings, now) {
                                notifier.emit(n);
                            }
                        }
                        Ok(Err(e)) => {
                            polls_failed += 1;
                            tracing::warn!(error = %e, operation = "poll_node_data", "poll failed");
                            if let Some(n) = dashboard.apply_failure(&e) {
                                notifier.emit(n);
                            }
                        }
                        Err(e) => {
                            polls_failed += 1;
                            tracing::warn!(error = %e, operation = "poll_node_data", "poll task failed");
                            if let Some(n) = dashboard.apply_failure(&e) {
                                notifier.emit(n);
                            }
                        }
                    }
                    state_tx.send_replace(Arc::new(dashboard.snapshot(now)));
                }
                Some(_) = OptionFuture::from(sos_tick.as_mut().map(|t| t.tick())) => {
                    let now = Utc::now();
                    notifier.emit(dashboard.raise_sos(now));
                    state_tx.send_replace(Arc::new(dashboard.snapshot(now)));
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Poller shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        state = ?dashboard.state(),
                        polls_ok,
                        polls_failed,
                        polls_skipped,
                        ws_dashboard_clients =
                            ws_dashboard_connections.load(std::sync::atomic::Ordering::Relaxed),
                        "app stats"
                    );
                }
            }
        }
        // A request still in flight is left to finish; its result is never published.
        drop(in_flight);
    }
    .instrument(tracing::span!(tracing::Level::DEBUG, "poller", interval_ms)));

    PollerHandle {
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
        snapshots,
    }
}
