// WebSocket handlers: dashboard snapshots and operator notifications

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::models::Notification;
use crate::poller::SnapshotReceiver;
use crate::telemetry_repo::TelemetrySource;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements ws_dashboard connection count on drop (connect = +1, drop = -1).
struct WsDashboardGuard(Arc<AtomicUsize>);

impl Drop for WsDashboardGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
    }
}

/// Send a text frame; `false` when the client is gone or too slow.
async fn send_text(socket: &mut WebSocket, text: String) -> bool {
    matches!(
        timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(text.into()))).await,
        Ok(Ok(()))
    )
}

async fn send_ping(socket: &mut WebSocket) -> bool {
    matches!(
        timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await,
        Ok(Ok(()))
    )
}

/// First ping one period after connect, so the first frame a client sees is data.
fn ping_interval() -> tokio::time::Interval {
    let mut interval =
        tokio::time::interval_at(tokio::time::Instant::now() + WS_PING_INTERVAL, WS_PING_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    interval
}

pub(super) async fn ws_dashboard<S: TelemetrySource>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let rx = state.snapshots.clone();
    let conn_count = state.ws_dashboard_connections.clone();
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = stream_dashboard(socket, rx, conn_count).await {
            tracing::info!("Dashboard stream error: {}", e);
        }
    })
}

/// Current snapshot on connect, then every published replacement.
async fn stream_dashboard(
    mut socket: WebSocket,
    mut rx: SnapshotReceiver,
    conn_count: Arc<AtomicUsize>,
) -> anyhow::Result<()> {
    conn_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let _guard = WsDashboardGuard(conn_count);
    tracing::info!("Client connected to dashboard stream");

    let current = rx.borrow_and_update().clone();
    if !send_text(&mut socket, serde_json::to_string(current.as_ref())?).await {
        return Ok(());
    }

    let mut pings = ping_interval();
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    // Poller stopped; nothing more will be published.
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                if !send_text(&mut socket, serde_json::to_string(snapshot.as_ref())?).await {
                    break;
                }
            }
            _ = pings.tick() => {
                if !send_ping(&mut socket).await {
                    break;
                }
            }
        }
    }
    Ok(())
}

pub(super) async fn ws_notifications<S: TelemetrySource>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let tx = state.notifications.clone();
    ws.on_upgrade(move |socket| async move {
        let mut rx = tx.subscribe();
        if let Err(e) = stream_notifications(socket, &mut rx).await {
            tracing::info!("Notification stream error: {}", e);
        }
    })
}

async fn stream_notifications(
    mut socket: WebSocket,
    rx: &mut broadcast::Receiver<Notification>,
) -> anyhow::Result<()> {
    tracing::info!("Client connected to notification stream");
    let mut pings = ping_interval();
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(notification) => {
                        if !send_text(&mut socket, serde_json::to_string(&notification)?).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/notifications client lagged, skipped {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = pings.tick() => {
                if !send_ping(&mut socket).await {
                    break;
                }
            }
        }
    }
    Ok(())
}
