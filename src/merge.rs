// Merge engine: topology + latest readings -> zone views + dashboard stats.
// Output always has one view per topology entry, in topology order.

use std::collections::HashMap;
use std::sync::Arc;

use crate::classifier::Classifier;
use crate::models::{
    NodeReading, SafetyStatus, WorkerPresence, ZoneStats, ZoneTopologyEntry, ZoneView,
};
use crate::topology::{NodeResolver, Topology};

pub const DEFAULT_NOMINAL_TEMPERATURE: f64 = 22.0;

#[derive(Debug, Clone)]
pub struct MergeEngine {
    topology: Arc<Topology>,
    resolver: Arc<NodeResolver>,
    classifier: Classifier,
    nominal_temperature: f64,
}

impl MergeEngine {
    pub fn new(
        topology: Arc<Topology>,
        resolver: Arc<NodeResolver>,
        classifier: Classifier,
        nominal_temperature: f64,
    ) -> Self {
        Self {
            topology,
            resolver,
            classifier,
            nominal_temperature,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn resolver(&self) -> &NodeResolver {
        &self.resolver
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Display label for a node: its zone's name, or the raw id when unmapped.
    pub fn location_label(&self, node_id: &str) -> String {
        self.resolver
            .resolve(node_id)
            .and_then(|zone| self.topology.get(zone))
            .map(|e| e.display_name.clone())
            .unwrap_or_else(|| format!("Node {}", node_id))
    }

    /// Attach the newest reading resolved to each zone. Unresolved node ids are dropped.
    pub fn merge(&self, readings: &[NodeReading]) -> Vec<ZoneView> {
        let mut by_zone: HashMap<&str, &NodeReading> = HashMap::with_capacity(readings.len());
        for r in readings {
            let Some(zone) = self.resolver.resolve(&r.node_id) else {
                continue;
            };
            by_zone
                .entry(zone)
                .and_modify(|cur| {
                    if r.timestamp > cur.timestamp {
                        *cur = r;
                    }
                })
                .or_insert(r);
        }

        self.topology
            .entries()
            .iter()
            .map(|entry| match by_zone.get(entry.zone_id.as_str()) {
                Some(reading) => ZoneView {
                    entry: entry.clone(),
                    latest_reading: Some((*reading).clone()),
                    status: self.classifier.status(reading),
                    workers: u32::from(reading.worker_presence == WorkerPresence::Present),
                    temperature: if reading.temperature.is_finite() {
                        reading.temperature
                    } else {
                        self.nominal_temperature
                    },
                },
                None => self.default_view(entry),
            })
            .collect()
    }

    /// Topology-shaped fallback published while the source is unreachable.
    pub fn degraded(&self) -> Vec<ZoneView> {
        self.topology
            .entries()
            .iter()
            .map(|entry| self.default_view(entry))
            .collect()
    }

    fn default_view(&self, entry: &ZoneTopologyEntry) -> ZoneView {
        ZoneView {
            entry: entry.clone(),
            latest_reading: None,
            status: SafetyStatus::Safe,
            workers: 0,
            temperature: self.nominal_temperature,
        }
    }
}

/// Single pass over the zone list. Average temperature of no zones is 0.
pub fn zone_stats(zones: &[ZoneView]) -> ZoneStats {
    let mut stats = ZoneStats::default();
    let mut temperature_sum = 0.0;
    for z in zones {
        stats.total_workers += z.workers;
        if z.status == SafetyStatus::Danger {
            stats.danger_zone_count += 1;
        }
        temperature_sum += z.temperature;
    }
    if !zones.is_empty() {
        stats.avg_temperature = temperature_sum / zones.len() as f64;
    }
    stats
}
