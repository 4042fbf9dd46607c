// Alert kinds, alert feed events and user-facing notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of abnormal condition; serializes to kebab-case (e.g. "high-pm25").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    WorkerAlert,
    HighPm25,
    HighTemperature,
    /// Operator-facing distress signal not derived from telemetry.
    Sos,
}

impl AlertKind {
    /// Telemetry-derived kinds resolve when a later reading no longer reports them.
    /// SOS events are never resolved by a poll.
    pub fn cleared_by_reading(&self) -> bool {
        !matches!(self, AlertKind::Sos)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::WorkerAlert => "worker-alert",
            AlertKind::HighPm25 => "high-pm25",
            AlertKind::HighTemperature => "high-temperature",
            AlertKind::Sos => "sos",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub id: String,
    pub kind: AlertKind,
    /// Node id or worker ref the alert is about.
    pub subject: String,
    pub location_label: String,
    pub timestamp: DateTime<Utc>,
    pub status: AlertStatus,
}

impl AlertEvent {
    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Destructive,
}

/// Transient user-facing message (toast).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(title: impl Into<String>, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
        }
    }
}
