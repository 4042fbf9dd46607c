// Notification sink: fire-and-forget transient messages for the operator UI.

use tokio::sync::broadcast;

use crate::models::{Notification, Severity};

pub trait Notifier: Send + Sync + 'static {
    fn emit(&self, notification: Notification);
}

fn log(n: &Notification) {
    match n.severity {
        Severity::Info => tracing::info!(title = %n.title, "{}", n.description),
        Severity::Destructive => tracing::warn!(title = %n.title, "{}", n.description),
    }
}

/// Log-only sink (headless runs).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn emit(&self, notification: Notification) {
        log(&notification);
    }
}

/// Logs and fans out to connected /ws/notifications clients.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(tx: broadcast::Sender<Notification>) -> Self {
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn emit(&self, notification: Notification) {
        log(&notification);
        if self.tx.send(notification).is_err() {
            tracing::debug!(
                operation = "broadcast_notification",
                "No notification subscribers"
            );
        }
    }
}
