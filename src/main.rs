use anyhow::Result;
use minewatch::*;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let (topology, resolver) = app_config.build_topology()?;
    let topology = Arc::new(topology);
    let classifier = classifier::Classifier::new(app_config.thresholds);
    let engine = merge::MergeEngine::new(
        topology.clone(),
        Arc::new(resolver),
        classifier,
        app_config.dashboard.nominal_temperature,
    );
    tracing::info!(
        zones = topology.len(),
        base_url = %app_config.telemetry.base_url,
        "{} {} starting",
        version::NAME,
        version::VERSION
    );

    let source = Arc::new(telemetry_repo::HttpTelemetrySource::new(
        &app_config.telemetry.base_url,
        Duration::from_millis(app_config.telemetry.request_timeout_ms),
    )?);
    let (notifications_tx, _) =
        broadcast::channel::<models::Notification>(app_config.publishing.broadcast_capacity);
    let notifier = Arc::new(notify::BroadcastNotifier::new(notifications_tx.clone()));
    let ws_dashboard_connections = Arc::new(AtomicUsize::new(0));

    let mut poller_handle = poller::spawn(
        poller::PollerDeps {
            source: source.clone(),
            notifier,
            engine,
            ws_dashboard_connections: ws_dashboard_connections.clone(),
        },
        poller::PollerConfig {
            interval_ms: app_config.polling.interval_ms,
            stats_log_interval_secs: app_config.polling.stats_log_interval_secs,
            feed_capacity: app_config.alerts.feed_capacity,
            synthetic_sos_interval_secs: app_config.alerts.synthetic_sos_interval_secs,
        },
    );

    let app = routes::app(routes::RouteDeps {
        snapshots: poller_handle.subscribe(),
        notifications: notifications_tx,
        source,
        topology,
        classifier,
        ws_dashboard_connections,
    });
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
        }
    }
    poller_handle.stop().await;

    Ok(())
}
