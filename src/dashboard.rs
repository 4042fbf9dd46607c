// Live dashboard model owned by the poller: zone views, controller state and the alert feed.
// Each poll outcome is applied here synchronously; the poller only does I/O and timing.

use std::fmt::Display;

use chrono::{DateTime, Utc};

use crate::alert_feed::AlertFeed;
use crate::merge::{MergeEngine, zone_stats};
use crate::models::{
    AlertEvent, AlertKind, AlertStatus, DashboardSnapshot, NodeReading, Notification,
    PollerState, Severity, WorkerState, ZoneView,
};

pub struct Dashboard {
    engine: MergeEngine,
    state: PollerState,
    zones: Vec<ZoneView>,
    feed: AlertFeed,
    last_success: Option<DateTime<Utc>>,
    sos_sequence: u64,
}

impl Dashboard {
    pub fn new(engine: MergeEngine, feed_capacity: usize) -> Self {
        let zones = engine.degraded();
        Self {
            engine,
            state: PollerState::Idle,
            zones,
            feed: AlertFeed::new(feed_capacity),
            last_success: None,
            sos_sequence: 0,
        }
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn zones(&self) -> &[ZoneView] {
        &self.zones
    }

    pub fn feed(&self) -> &AlertFeed {
        &self.feed
    }

    /// Replace the zone views, go live, and sync worker alerts into the feed.
    /// Returns one notification per newly raised worker alert, in reading order.
    pub fn apply_success(
        &mut self,
        readings: &[NodeReading],
        now: DateTime<Utc>,
    ) -> Vec<Notification> {
        self.zones = self.engine.merge(readings);
        self.state = PollerState::Live;
        self.last_success = Some(now);

        let mut notifications = Vec::new();
        for r in readings {
            if r.worker_state != WorkerState::Alert {
                continue;
            }
            let location_label = self.engine.location_label(&r.node_id);
            let event = AlertEvent {
                id: uuid::Uuid::new_v4().to_string(),
                kind: AlertKind::WorkerAlert,
                subject: r.node_id.clone(),
                location_label: location_label.clone(),
                timestamp: r.timestamp,
                status: AlertStatus::Active,
            };
            if self.feed.raise(event) {
                notifications.push(Notification::new(
                    "WORKER ALERT",
                    format!(
                        "Node {} in {} reports a worker in distress",
                        r.node_id, location_label
                    ),
                    Severity::Destructive,
                ));
            }
        }

        for key in self.feed.active_keys(AlertKind::WorkerAlert) {
            let cleared = readings
                .iter()
                .any(|r| r.node_id == key.subject && r.worker_state == WorkerState::Fine);
            if cleared {
                self.feed.resolve(&key);
            }
        }

        notifications
    }

    /// Publish the all-default view. Only the transition into degraded yields a notification.
    pub fn apply_failure(&mut self, reason: impl Display) -> Option<Notification> {
        self.zones = self.engine.degraded();
        let previous = std::mem::replace(&mut self.state, PollerState::Degraded);
        if previous == PollerState::Degraded {
            return None;
        }
        Some(Notification::new(
            "Connection Error",
            format!(
                "Failed to fetch node data ({}). Showing default zone values.",
                reason
            ),
            Severity::Destructive,
        ))
    }

    /// Insert a synthetic distress event; zones are visited round-robin for its location.
    pub fn raise_sos(&mut self, now: DateTime<Utc>) -> Notification {
        self.sos_sequence += 1;
        let entries = self.engine.topology().entries();
        let location_label = if entries.is_empty() {
            "Unknown location".to_string()
        } else {
            let i = (self.sos_sequence as usize - 1) % entries.len();
            entries[i].display_name.clone()
        };
        let worker = format!("W-{:03}", self.sos_sequence);
        self.feed.raise(AlertEvent {
            id: uuid::Uuid::new_v4().to_string(),
            kind: AlertKind::Sos,
            subject: worker.clone(),
            location_label: location_label.clone(),
            timestamp: now,
            status: AlertStatus::Active,
        });
        Notification::new(
            "SOS ALERT",
            format!(
                "Worker {} in {} needs immediate assistance!",
                worker, location_label
            ),
            Severity::Destructive,
        )
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> DashboardSnapshot {
        DashboardSnapshot {
            state: self.state,
            zones: self.zones.clone(),
            stats: zone_stats(&self.zones),
            alerts: self.feed.recent(),
            active_sos: self.feed.recent_active(AlertKind::Sos),
            last_success: self.last_success,
            published_at: now,
        }
    }
}
