// Domain models

mod alert;
mod reading;
mod zone;

pub use alert::{AlertEvent, AlertKind, AlertStatus, Notification, Severity};
pub use reading::{HistoryRecord, NodeReading, WorkerPresence, WorkerState};
pub use zone::{
    DashboardSnapshot, PollerState, Position, SafetyStatus, ZoneStats, ZoneTopologyEntry,
    ZoneView,
};
