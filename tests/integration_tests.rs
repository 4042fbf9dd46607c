// Integration tests: HTTP and WebSocket endpoints

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use common::{FakeSource, builtin_engine, reading, record, ts};
use minewatch::classifier::Classifier;
use minewatch::dashboard::Dashboard;
use minewatch::history::HistoryReport;
use minewatch::models::{
    DashboardSnapshot, Notification, PollerState, SafetyStatus, Severity, ZoneTopologyEntry,
};
use minewatch::routes::{self, RouteDeps};
use minewatch::topology::Topology;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{broadcast, watch};

struct Harness {
    app: axum::Router,
    snapshots: watch::Sender<Arc<DashboardSnapshot>>,
    notifications: broadcast::Sender<Notification>,
    connections: Arc<AtomicUsize>,
}

fn live_snapshot() -> DashboardSnapshot {
    let mut dashboard = Dashboard::new(builtin_engine(), 5);
    dashboard.apply_success(
        &[reading("N01", 20.0, 150.0, 0), reading("N03", 20.0, 5.0, 1)],
        ts(0),
    );
    dashboard.snapshot(ts(1))
}

fn history() -> Vec<minewatch::models::HistoryRecord> {
    vec![
        record(6, "N1", 60, 120.0, 0),
        record(5, "N2", 50, 10.0, 1),
        record(4, "N3", 40, 60.0, 0),
        record(3, "N2", 30, 20.0, 0),
        record(2, "N1", 20, 30.0, 0),
        record(1, "N2", 10, 40.0, 0),
    ]
}

fn harness(source: FakeSource) -> Harness {
    let (snapshots, rx) = watch::channel(Arc::new(live_snapshot()));
    let (notifications, _) = broadcast::channel(8);
    let connections = Arc::new(AtomicUsize::new(0));
    let app = routes::app(RouteDeps {
        snapshots: rx,
        notifications: notifications.clone(),
        source: Arc::new(source),
        topology: Arc::new(Topology::builtin()),
        classifier: Classifier::default(),
        ws_dashboard_connections: connections.clone(),
    });
    Harness {
        app,
        snapshots,
        notifications,
        connections,
    }
}

fn test_app() -> Harness {
    harness(FakeSource::steady(vec![]).with_history(history()))
}

#[tokio::test]
async fn test_root_endpoint() {
    let server = TestServer::new(test_app().app).unwrap();
    let response = server.get("/").await;
    response.assert_status_ok();
    response.assert_text("minewatch telemetry engine");
}

#[tokio::test]
async fn test_version_endpoint() {
    let server = TestServer::new(test_app().app).unwrap();
    let response = server.get("/version").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json.get("name").and_then(|v| v.as_str()), Some("minewatch"));
    assert!(json.get("version").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn test_dashboard_endpoint_returns_published_snapshot() {
    let server = TestServer::new(test_app().app).unwrap();
    let response = server.get("/api/dashboard").await;
    response.assert_status_ok();
    let snap: DashboardSnapshot = response.json();
    assert_eq!(snap, live_snapshot_without_ids(&snap));
    assert_eq!(snap.state, PollerState::Live);
    assert_eq!(snap.zones.len(), 7);
    assert_eq!(snap.zones[0].status, SafetyStatus::Danger);
    assert_eq!(snap.stats.danger_zone_count, 2);
    assert_eq!(snap.alerts.len(), 1);
}

/// The snapshot carries random alert ids; compare everything else.
fn live_snapshot_without_ids(served: &DashboardSnapshot) -> DashboardSnapshot {
    let mut expected = live_snapshot();
    for (e, s) in expected.alerts.iter_mut().zip(&served.alerts) {
        e.id = s.id.clone();
    }
    expected
}

#[tokio::test]
async fn test_dashboard_json_shape() {
    let server = TestServer::new(test_app().app).unwrap();
    let json: serde_json::Value = server.get("/api/dashboard").await.json();
    assert_eq!(json["state"], "live");
    assert_eq!(json["zones"][0]["zoneId"], "1");
    assert_eq!(json["zones"][0]["status"], "danger");
    assert_eq!(json["zones"][0]["latestReading"]["node_id"], "N01");
    assert_eq!(json["alerts"][0]["kind"], "worker-alert");
    assert!(json["stats"]["avgTemperature"].is_number());
}

#[tokio::test]
async fn test_topology_endpoint() {
    let server = TestServer::new(test_app().app).unwrap();
    let response = server.get("/api/topology").await;
    response.assert_status_ok();
    let zones: Vec<ZoneTopologyEntry> = response.json();
    assert_eq!(zones.len(), 7);
    assert_eq!(zones[6].display_name, "Ventilation Shaft");
}

#[tokio::test]
async fn test_history_endpoint_filters_by_node() {
    let server = TestServer::new(test_app().app).unwrap();
    let response = server
        .get("/api/history")
        .add_query_param("node_id", "N2")
        .await;
    response.assert_status_ok();
    let report: HistoryReport = response.json();
    assert_eq!(report.rows.len(), 3);
    assert!(report.rows.iter().all(|r| r.record.node_id() == "N2"));
    assert_eq!(report.summary.alert_count, 1);
    assert_eq!(report.node_ids, ["N1", "N2", "N3"]);
}

#[tokio::test]
async fn test_history_endpoint_limit_applies_before_filter() {
    let server = TestServer::new(test_app().app).unwrap();
    let report: HistoryReport = server
        .get("/api/history")
        .add_query_param("limit", 3)
        .add_query_param("node_id", "N2")
        .await
        .json();
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].record.id, 5);
    assert_eq!(report.node_ids, ["N1", "N2", "N3"]);
}

#[tokio::test]
async fn test_history_endpoint_search_and_range() {
    let server = TestServer::new(test_app().app).unwrap();
    let report: HistoryReport = server
        .get("/api/history")
        .add_query_param("search", "n1")
        .add_query_param("from", ts(30).to_rfc3339())
        .await
        .json();
    let ids: Vec<u64> = report.rows.iter().map(|r| r.record.id).collect();
    assert_eq!(ids, [6]);
    assert_eq!(report.rows[0].status, SafetyStatus::Danger);
}

#[tokio::test]
async fn test_history_endpoint_accepts_zulu_and_escaped_offsets() {
    let server = TestServer::new(test_app().app).unwrap();
    // ts(30) == 2023-11-14T22:13:50Z
    let zulu: HistoryReport = server
        .get("/api/history?node_id=N2&from=2023-11-14T22:13:50Z")
        .await
        .json();
    let ids: Vec<u64> = zulu.rows.iter().map(|r| r.record.id).collect();
    assert_eq!(ids, [5, 3]);

    let escaped: HistoryReport = server
        .get("/api/history?node_id=N2&to=2023-11-14T22:13:50%2B00:00")
        .await
        .json();
    let ids: Vec<u64> = escaped.rows.iter().map(|r| r.record.id).collect();
    assert_eq!(ids, [3, 1]);
}

#[tokio::test]
async fn test_history_upstream_failure_is_bad_gateway() {
    let server = TestServer::new(harness(FakeSource::steady(vec![]).with_failing_history()).app)
        .unwrap();
    let response = server.get("/api/history").await;
    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let json: serde_json::Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_export_endpoint_headers_and_rows() {
    let server = TestServer::new(test_app().app).unwrap();
    let response = server
        .get("/api/history/export")
        .add_query_param("node_id", "N2")
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "text/csv");
    let disposition = response.header("content-disposition");
    let disposition = disposition.to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"node_history_report_"));
    assert!(disposition.ends_with(".csv\""));
    let body = response.text();
    assert_eq!(body.lines().count(), 3 + 1);
    assert!(body.starts_with("Timestamp,Node ID,"));
}

#[tokio::test]
async fn test_export_endpoint_quoted() {
    let server = TestServer::new(test_app().app).unwrap();
    let body = server
        .get("/api/history/export")
        .add_query_param("quoted", true)
        .await
        .text();
    assert_eq!(body.lines().count(), 6 + 1);
    assert!(body.lines().nth(1).unwrap().starts_with('"'));
}

// --- WebSocket tests (require http_transport + ws feature) ---

fn test_server_with_http(h: &Harness) -> TestServer {
    TestServer::builder()
        .http_transport()
        .build(h.app.clone())
        .unwrap()
}

#[tokio::test]
async fn test_ws_dashboard_sends_current_then_updates() {
    let h = test_app();
    let server = test_server_with_http(&h);
    let mut ws = server
        .get_websocket("/ws/dashboard")
        .await
        .into_websocket()
        .await;

    let first: DashboardSnapshot = ws.receive_json().await;
    assert_eq!(first.state, PollerState::Live);
    assert_eq!(h.connections.load(Ordering::Relaxed), 1);

    let mut dashboard = Dashboard::new(builtin_engine(), 5);
    dashboard.apply_failure("connection refused");
    h.snapshots.send_replace(Arc::new(dashboard.snapshot(ts(2))));

    let next: DashboardSnapshot = ws.receive_json().await;
    assert_eq!(next.state, PollerState::Degraded);
    assert!(next.zones.iter().all(|z| z.latest_reading.is_none()));
}

#[tokio::test]
async fn test_ws_notifications_forwards_broadcast() {
    let h = test_app();
    let server = test_server_with_http(&h);
    let mut ws = server
        .get_websocket("/ws/notifications")
        .await
        .into_websocket()
        .await;

    let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_secs(3);
    while h.notifications.receiver_count() == 0 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for subscriber"
        );
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }
    let sent = Notification::new("SOS ALERT", "Worker W-001 needs help", Severity::Destructive);
    h.notifications.send(sent.clone()).unwrap();

    let received: Notification = ws.receive_json().await;
    assert_eq!(received, sent);
}
