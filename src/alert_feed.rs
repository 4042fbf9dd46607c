// Alert feed: latest event per alert key, plus a newest-first index of the most recent N.
//
// A key that is still active is never raised again, so scanning the same alerting
// node every poll does not flood the feed. Events pushed out of the recent window
// are forgotten once resolved. Active ones are kept (hidden) until they resolve, but
// only for kinds a later reading can clear; anything else is dropped on eviction.

use std::collections::{HashMap, VecDeque};

use crate::models::{AlertEvent, AlertKind, AlertStatus};

pub const DEFAULT_FEED_CAPACITY: usize = 5;

/// Stable identity of an alert condition: who it is about and what kind it is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertKey {
    pub subject: String,
    pub kind: AlertKind,
}

impl AlertKey {
    pub fn new(subject: impl Into<String>, kind: AlertKind) -> Self {
        Self {
            subject: subject.into(),
            kind,
        }
    }

    pub fn of(event: &AlertEvent) -> Self {
        Self::new(event.subject.clone(), event.kind)
    }
}

#[derive(Debug, Clone)]
pub struct AlertFeed {
    capacity: usize,
    latest: HashMap<AlertKey, AlertEvent>,
    /// Newest first; never longer than `capacity`.
    recent: VecDeque<AlertKey>,
}

impl Default for AlertFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl AlertFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            latest: HashMap::new(),
            recent: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Prepend `event` unless its key is already active. Returns whether it was inserted.
    pub fn raise(&mut self, event: AlertEvent) -> bool {
        let key = AlertKey::of(&event);
        if self.is_active(&key) {
            return false;
        }
        self.recent.retain(|k| k != &key);
        self.recent.push_front(key.clone());
        self.latest.insert(key, event);
        self.trim();
        true
    }

    /// Mark the key's event resolved. It stays visible while inside the recent window.
    pub fn resolve(&mut self, key: &AlertKey) -> bool {
        let Some(event) = self.latest.get_mut(key) else {
            return false;
        };
        if event.status == AlertStatus::Resolved {
            return false;
        }
        event.status = AlertStatus::Resolved;
        if !self.recent.contains(key) {
            self.latest.remove(key);
        }
        true
    }

    pub fn is_active(&self, key: &AlertKey) -> bool {
        self.latest.get(key).is_some_and(AlertEvent::is_active)
    }

    /// Keys of every active event of `kind`, including ones outside the recent window.
    pub fn active_keys(&self, kind: AlertKind) -> Vec<AlertKey> {
        self.latest
            .iter()
            .filter(|(k, e)| k.kind == kind && e.is_active())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Most recent events, newest first.
    pub fn recent(&self) -> Vec<AlertEvent> {
        self.recent
            .iter()
            .filter_map(|k| self.latest.get(k))
            .cloned()
            .collect()
    }

    /// Active events of `kind` within the recent window.
    pub fn recent_active(&self, kind: AlertKind) -> usize {
        self.recent
            .iter()
            .filter_map(|k| self.latest.get(k))
            .filter(|e| e.kind == kind && e.is_active())
            .count()
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    fn trim(&mut self) {
        while self.recent.len() > self.capacity {
            let Some(evicted) = self.recent.pop_back() else {
                break;
            };
            if !evicted.kind.cleared_by_reading() || !self.is_active(&evicted) {
                self.latest.remove(&evicted);
            }
        }
    }
}
