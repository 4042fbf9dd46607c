// Zone topology entries, merged zone views and the published dashboard snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AlertEvent, NodeReading};

/// Tri-state safety status; serializes to lowercase JSON (e.g. "warning").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyStatus {
    #[default]
    Safe,
    Warning,
    Danger,
}

impl SafetyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyStatus::Safe => "safe",
            SafetyStatus::Warning => "warning",
            SafetyStatus::Danger => "danger",
        }
    }
}

/// Marker position on the 2-D layout, in percent of width/height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneTopologyEntry {
    #[serde(alias = "zone_id")]
    pub zone_id: String,
    #[serde(alias = "display_name")]
    pub display_name: String,
    pub position: Position,
    #[serde(default, alias = "parent_id", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

/// Render-ready zone: topology entry plus the latest mapped reading and its status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneView {
    #[serde(flatten)]
    pub entry: ZoneTopologyEntry,
    pub latest_reading: Option<NodeReading>,
    pub status: SafetyStatus,
    /// 1 when the attached reading reports a worker present, else 0.
    pub workers: u32,
    /// Reading temperature, or the nominal temperature when no usable reading is attached.
    pub temperature: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStats {
    pub total_workers: u32,
    pub danger_zone_count: usize,
    /// Plain mean over all zones, not rounded; rounding is left to the render layer.
    pub avg_temperature: f64,
}

/// Polling controller state as seen by readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollerState {
    #[default]
    Idle,
    Live,
    Degraded,
}

/// Everything the render layer needs for one frame; replaced as a whole every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub state: PollerState,
    pub zones: Vec<ZoneView>,
    pub stats: ZoneStats,
    pub alerts: Vec<AlertEvent>,
    pub active_sos: usize,
    pub last_success: Option<DateTime<Utc>>,
    pub published_at: DateTime<Utc>,
}
