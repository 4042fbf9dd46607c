// Shared test helpers
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use minewatch::classifier::Classifier;
use minewatch::merge::{DEFAULT_NOMINAL_TEMPERATURE, MergeEngine};
use minewatch::models::*;
use minewatch::notify::Notifier;
use minewatch::telemetry_repo::{TelemetryError, TelemetrySource};
use minewatch::topology::{NodeResolver, Topology};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn reading(node_id: &str, temperature: f64, pm25: f64, worker_state: u8) -> NodeReading {
    NodeReading {
        node_id: node_id.into(),
        timestamp: ts(0),
        temperature,
        humidity: 60.0,
        pm25,
        worker_state: WorkerState::try_from(worker_state).unwrap(),
        worker_presence: WorkerPresence::Present,
    }
}

pub fn record(id: u64, node_id: &str, secs: i64, pm25: f64, worker_state: u8) -> HistoryRecord {
    let mut r = reading(node_id, 24.0, pm25, worker_state);
    r.timestamp = ts(secs);
    HistoryRecord { id, reading: r }
}

pub fn builtin_engine() -> MergeEngine {
    MergeEngine::new(
        Arc::new(Topology::builtin()),
        Arc::new(NodeResolver::builtin()),
        Classifier::default(),
        DEFAULT_NOMINAL_TEMPERATURE,
    )
}

pub fn timeout_error() -> TelemetryError {
    TelemetryError::Timeout {
        url: "http://fake/nodeData/".into(),
    }
}

/// Scripted telemetry source. Once the script runs out, every call returns
/// `exhausted` readings, or a timeout error when that is `None`.
pub struct FakeSource {
    script: Mutex<VecDeque<Result<Vec<NodeReading>, TelemetryError>>>,
    exhausted: Option<Vec<NodeReading>>,
    delay: Duration,
    history: Vec<HistoryRecord>,
    history_fails: bool,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(script: Vec<Result<Vec<NodeReading>, TelemetryError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            exhausted: None,
            delay: Duration::ZERO,
            history: Vec::new(),
            history_fails: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn steady(readings: Vec<NodeReading>) -> Self {
        Self::new(vec![]).with_exhausted(readings)
    }

    pub fn with_exhausted(mut self, readings: Vec<NodeReading>) -> Self {
        self.exhausted = Some(readings);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_history(mut self, history: Vec<HistoryRecord>) -> Self {
        self.history = history;
        self
    }

    pub fn with_failing_history(mut self) -> Self {
        self.history_fails = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TelemetrySource for FakeSource {
    async fn node_data(&self) -> Result<Vec<NodeReading>, TelemetryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => match &self.exhausted {
                Some(readings) => Ok(readings.clone()),
                None => Err(timeout_error()),
            },
        }
    }

    async fn node_history(&self) -> Result<Vec<HistoryRecord>, TelemetryError> {
        if self.history_fails {
            return Err(timeout_error());
        }
        Ok(self.history.clone())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn titled(&self, title: &str) -> usize {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.title == title)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn emit(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}
