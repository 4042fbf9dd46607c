// Threshold classification of node readings into safety status + alert kinds.
//
// Comparisons are strict `>`; NaN fails every comparison, so a reading with
// missing measurements classifies as safe unless the worker flag is raised.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{AlertKind, HistoryRecord, NodeReading, SafetyStatus, WorkerState};

/// Numeric limits used by [`Classifier`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// PM2.5 strictly above this is danger (and a high-pm25 alert).
    #[serde(default = "default_danger_pm25")]
    pub danger_pm25: f64,
    /// PM2.5 strictly above this is at least warning.
    #[serde(default = "default_warning_pm25")]
    pub warning_pm25: f64,
    /// Temperature (°C) strictly above this is at least warning.
    #[serde(default = "default_warning_temperature")]
    pub warning_temperature: f64,
}

fn default_danger_pm25() -> f64 {
    100.0
}

fn default_warning_pm25() -> f64 {
    50.0
}

fn default_warning_temperature() -> f64 {
    35.0
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            danger_pm25: default_danger_pm25(),
            warning_pm25: default_warning_pm25(),
            warning_temperature: default_warning_temperature(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: SafetyStatus,
    pub alert_kinds: BTreeSet<AlertKind>,
}

impl Classification {
    pub fn has(&self, kind: AlertKind) -> bool {
        self.alert_kinds.contains(&kind)
    }
}

/// Stateless classifier; constructed once and shared by the merge engine and history reports.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Classifier {
    thresholds: Thresholds,
}

impl Classifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn classify(&self, reading: &NodeReading) -> Classification {
        Classification {
            status: self.status(reading),
            alert_kinds: self.alert_kinds(reading),
        }
    }

    /// Danger takes precedence over warning; first match wins.
    pub fn status(&self, reading: &NodeReading) -> SafetyStatus {
        let t = &self.thresholds;
        if reading.worker_state == WorkerState::Alert || reading.pm25 > t.danger_pm25 {
            SafetyStatus::Danger
        } else if reading.temperature > t.warning_temperature || reading.pm25 > t.warning_pm25 {
            SafetyStatus::Warning
        } else {
            SafetyStatus::Safe
        }
    }

    /// Alert kinds are independent of each other, except that high-temperature is
    /// suppressed while the node already reports a worker alert.
    pub fn alert_kinds(&self, reading: &NodeReading) -> BTreeSet<AlertKind> {
        let t = &self.thresholds;
        let worker_alert = reading.worker_state == WorkerState::Alert;
        let mut kinds = BTreeSet::new();
        if worker_alert {
            kinds.insert(AlertKind::WorkerAlert);
        }
        if reading.pm25 > t.danger_pm25 {
            kinds.insert(AlertKind::HighPm25);
        }
        if reading.temperature > t.warning_temperature && !worker_alert {
            kinds.insert(AlertKind::HighTemperature);
        }
        kinds
    }

    /// Status badge for a report row; same rules as live readings.
    pub fn record_status(&self, record: &HistoryRecord) -> SafetyStatus {
        self.status(&record.reading)
    }
}
