// HTTP + WebSocket routes: the render layer's read-only view of the engine

mod http;
mod ws;

use axum::{Router, routing::get};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::classifier::Classifier;
use crate::models::Notification;
use crate::poller::SnapshotReceiver;
use crate::telemetry_repo::TelemetrySource;
use crate::topology::Topology;

pub(crate) struct AppState<S> {
    pub(crate) snapshots: SnapshotReceiver,
    pub(crate) notifications: broadcast::Sender<Notification>,
    pub(crate) source: Arc<S>,
    pub(crate) topology: Arc<Topology>,
    pub(crate) classifier: Classifier,
    pub(crate) ws_dashboard_connections: Arc<AtomicUsize>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            snapshots: self.snapshots.clone(),
            notifications: self.notifications.clone(),
            source: self.source.clone(),
            topology: self.topology.clone(),
            classifier: self.classifier,
            ws_dashboard_connections: self.ws_dashboard_connections.clone(),
        }
    }
}

/// Everything the routes read from; the poller is the only writer behind `snapshots`.
pub struct RouteDeps<S> {
    pub snapshots: SnapshotReceiver,
    pub notifications: broadcast::Sender<Notification>,
    pub source: Arc<S>,
    pub topology: Arc<Topology>,
    pub classifier: Classifier,
    pub ws_dashboard_connections: Arc<AtomicUsize>,
}

pub fn app<S: TelemetrySource>(deps: RouteDeps<S>) -> Router {
    let state = AppState {
        snapshots: deps.snapshots,
        notifications: deps.notifications,
        source: deps.source,
        topology: deps.topology,
        classifier: deps.classifier,
        ws_dashboard_connections: deps.ws_dashboard_connections,
    };
    Router::new()
        .route("/", get(|| async { "minewatch telemetry engine" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/dashboard", get(http::dashboard_handler::<S>)) // GET /api/dashboard
        .route("/api/topology", get(http::topology_handler::<S>)) // GET /api/topology
        .route("/api/history", get(http::history_handler::<S>)) // GET /api/history
        .route("/api/history/export", get(http::export_handler::<S>)) // GET /api/history/export
        .route("/ws/dashboard", get(ws::ws_dashboard::<S>)) // WS /ws/dashboard
        .route("/ws/notifications", get(ws::ws_notifications::<S>)) // WS /ws/notifications
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
