// History query engine: client-side filtering and aggregates over the full /nodeHistory set.
// The fetched set is never modified; every query returns a new filtered view.

pub mod export;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::Classifier;
use crate::models::{HistoryRecord, SafetyStatus, WorkerState};

/// Node selector value meaning "every node".
pub const ALL_NODES: &str = "all";

/// Predicates combined with AND. Empty / `None` fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFilter {
    /// Exact node id, or [`ALL_NODES`].
    #[serde(default)]
    pub node_id: Option<String>,
    /// Case-insensitive substring of the node id.
    #[serde(default)]
    pub search: Option<String>,
    /// Inclusive lower bound on the sample timestamp.
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the sample timestamp.
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

impl HistoryFilter {
    pub fn node(node_id: impl Into<String>) -> Self {
        Self {
            node_id: Some(node_id.into()),
            ..Self::default()
        }
    }

    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &HistoryRecord) -> bool {
        let node_id = record.node_id();
        if let Some(wanted) = self.node_id.as_deref()
            && wanted != ALL_NODES
            && wanted != node_id
        {
            return false;
        }
        if let Some(term) = self.search.as_deref()
            && !node_id.to_lowercase().contains(&term.to_lowercase())
        {
            return false;
        }
        if let Some(from) = self.from
            && record.timestamp() < from
        {
            return false;
        }
        if let Some(to) = self.to
            && record.timestamp() > to
        {
            return false;
        }
        true
    }
}

pub fn filter(records: &[HistoryRecord], filter: &HistoryFilter) -> Vec<HistoryRecord> {
    records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect()
}

/// First `limit` records of a newest-first set.
pub fn latest(records: &[HistoryRecord], limit: usize) -> &[HistoryRecord] {
    &records[..limit.min(records.len())]
}

/// Distinct node ids, sorted ascending.
pub fn unique_node_ids(records: &[HistoryRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.node_id())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

pub fn alert_count(records: &[HistoryRecord]) -> usize {
    records
        .iter()
        .filter(|r| r.reading.worker_state == WorkerState::Alert)
        .count()
}

/// Mean PM2.5 over finite samples; 0 when there are none.
pub fn mean_pm25(records: &[HistoryRecord]) -> f64 {
    let (sum, n) = records
        .iter()
        .map(|r| r.reading.pm25)
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub record_count: usize,
    pub alert_count: usize,
    pub distinct_nodes: usize,
    pub mean_pm25: f64,
}

impl HistorySummary {
    pub fn of(records: &[HistoryRecord]) -> Self {
        Self {
            record_count: records.len(),
            alert_count: alert_count(records),
            distinct_nodes: unique_node_ids(records).len(),
            mean_pm25: mean_pm25(records),
        }
    }
}

/// Report table row: the record plus its status badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(flatten)]
    pub record: HistoryRecord,
    pub status: SafetyStatus,
}

/// Filtered rows, their aggregates, and the node ids of the unfiltered set (for the selector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReport {
    pub rows: Vec<ReportRow>,
    pub summary: HistorySummary,
    pub node_ids: Vec<String>,
}

impl HistoryReport {
    pub fn build(records: &[HistoryRecord], f: &HistoryFilter, classifier: &Classifier) -> Self {
        let filtered = filter(records, f);
        let summary = HistorySummary::of(&filtered);
        let rows = filtered
            .into_iter()
            .map(|record| ReportRow {
                status: classifier.record_status(&record),
                record,
            })
            .collect();
        Self {
            rows,
            summary,
            node_ids: unique_node_ids(records),
        }
    }
}
