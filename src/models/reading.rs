// Node telemetry samples as returned by /nodeData and /nodeHistory

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Worker distress flag reported by a node; integer on the wire (0 = fine, 1 = alert).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WorkerState {
    #[default]
    Fine,
    Alert,
}

impl TryFrom<u8> for WorkerState {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(WorkerState::Fine),
            1 => Ok(WorkerState::Alert),
            other => Err(format!("worker_state must be 0 or 1, got {}", other)),
        }
    }
}

impl From<WorkerState> for u8 {
    fn from(s: WorkerState) -> u8 {
        match s {
            WorkerState::Fine => 0,
            WorkerState::Alert => 1,
        }
    }
}

/// Worker presence flag reported by a node; integer on the wire (0 = absent, 1 = present).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WorkerPresence {
    #[default]
    Absent,
    Present,
}

impl TryFrom<u8> for WorkerPresence {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(WorkerPresence::Absent),
            1 => Ok(WorkerPresence::Present),
            other => Err(format!("worker_presence must be 0 or 1, got {}", other)),
        }
    }
}

impl From<WorkerPresence> for u8 {
    fn from(p: WorkerPresence) -> u8 {
        match p {
            WorkerPresence::Absent => 0,
            WorkerPresence::Present => 1,
        }
    }
}

/// `null` or missing measurements decode to NaN, which fails every threshold.
fn nan_if_missing<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

fn nan() -> f64 {
    f64::NAN
}

/// One telemetry sample from a sensor node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeReading {
    pub node_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default = "nan", deserialize_with = "nan_if_missing")]
    pub temperature: f64,
    #[serde(default = "nan", deserialize_with = "nan_if_missing")]
    pub humidity: f64,
    #[serde(default = "nan", deserialize_with = "nan_if_missing")]
    pub pm25: f64,
    pub worker_state: WorkerState,
    pub worker_presence: WorkerPresence,
}

/// A stored history sample: same shape as [`NodeReading`] plus the source's surrogate id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: u64,
    #[serde(flatten)]
    pub reading: NodeReading,
}

impl HistoryRecord {
    pub fn node_id(&self) -> &str {
        &self.reading.node_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.reading.timestamp
    }
}
