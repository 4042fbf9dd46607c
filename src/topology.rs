// Static zone topology table and node-to-zone resolver.
// Both are built once at startup and never mutated; the tree shape is checked here.

use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;

use crate::models::{Position, ZoneTopologyEntry};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("duplicate zone id {0:?}")]
    DuplicateZone(String),
    #[error("zone {zone:?} references unknown {relation} {target:?}")]
    UnknownReference {
        zone: String,
        relation: &'static str,
        target: String,
    },
    #[error("zone {child:?} is listed as a child of {parent:?} but its parent_id is {actual:?}")]
    ParentMismatch {
        child: String,
        parent: String,
        actual: Option<String>,
    },
    #[error("zone {0:?} is part of a parent cycle")]
    Cycle(String),
    #[error("node {node:?} maps to unknown zone {zone:?}")]
    UnknownZoneForNode { node: String, zone: String },
}

/// Immutable zone table in display order.
#[derive(Debug, Clone)]
pub struct Topology {
    entries: Vec<ZoneTopologyEntry>,
    index: HashMap<String, usize>,
}

impl Topology {
    pub fn new(entries: Vec<ZoneTopologyEntry>) -> Result<Self, TopologyError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, e) in entries.iter().enumerate() {
            if index.insert(e.zone_id.clone(), i).is_some() {
                return Err(TopologyError::DuplicateZone(e.zone_id.clone()));
            }
        }

        for e in &entries {
            if let Some(parent) = &e.parent_id
                && !index.contains_key(parent)
            {
                return Err(TopologyError::UnknownReference {
                    zone: e.zone_id.clone(),
                    relation: "parent",
                    target: parent.clone(),
                });
            }
            for child in &e.children {
                let Some(&ci) = index.get(child) else {
                    return Err(TopologyError::UnknownReference {
                        zone: e.zone_id.clone(),
                        relation: "child",
                        target: child.clone(),
                    });
                };
                let actual = &entries[ci].parent_id;
                if actual.as_deref() != Some(e.zone_id.as_str()) {
                    return Err(TopologyError::ParentMismatch {
                        child: child.clone(),
                        parent: e.zone_id.clone(),
                        actual: actual.clone(),
                    });
                }
            }
        }

        // Every parent chain must end at a root.
        for e in &entries {
            let mut seen = HashSet::new();
            let mut cur = e;
            while let Some(parent) = &cur.parent_id {
                if !seen.insert(cur.zone_id.as_str()) {
                    return Err(TopologyError::Cycle(e.zone_id.clone()));
                }
                cur = &entries[index[parent]];
            }
        }

        Ok(Self { entries, index })
    }

    /// Seven-zone mine layout used when the config does not define one.
    pub fn builtin() -> Self {
        fn zone(
            id: &str,
            name: &str,
            x: f64,
            y: f64,
            parent: Option<&str>,
            children: &[&str],
        ) -> ZoneTopologyEntry {
            ZoneTopologyEntry {
                zone_id: id.into(),
                display_name: name.into(),
                position: Position { x, y },
                parent_id: parent.map(Into::into),
                children: children.iter().map(|c| (*c).into()).collect(),
            }
        }
        let entries = vec![
            zone("1", "Main Entry Point", 50.0, 10.0, None, &["2"]),
            zone("2", "Primary Junction", 50.0, 30.0, Some("1"), &["3", "4"]),
            zone("3", "North Tunnel", 30.0, 50.0, Some("2"), &["7"]),
            zone("4", "South Tunnel", 70.0, 50.0, Some("2"), &["5", "6"]),
            zone("5", "Deep Mine A", 80.0, 70.0, Some("4"), &[]),
            zone("6", "Deep Mine B", 60.0, 70.0, Some("4"), &[]),
            zone("7", "Ventilation Shaft", 20.0, 70.0, Some("3"), &[]),
        ];
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.zone_id.clone(), i))
            .collect();
        Self { entries, index }
    }

    pub fn entries(&self) -> &[ZoneTopologyEntry] {
        &self.entries
    }

    pub fn get(&self, zone_id: &str) -> Option<&ZoneTopologyEntry> {
        self.index.get(zone_id).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fixed node id -> zone id lookup. Unknown node ids resolve to `None`.
#[derive(Debug, Clone, Default)]
pub struct NodeResolver {
    map: HashMap<String, String>,
}

impl NodeResolver {
    pub fn new(map: BTreeMap<String, String>, topology: &Topology) -> Result<Self, TopologyError> {
        for (node, zone) in &map {
            if topology.get(zone).is_none() {
                return Err(TopologyError::UnknownZoneForNode {
                    node: node.clone(),
                    zone: zone.clone(),
                });
            }
        }
        Ok(Self {
            map: map.into_iter().collect(),
        })
    }

    /// Nodes N01..N07 mapped onto the built-in zones 1..7.
    pub fn builtin() -> Self {
        let map = (1..=7)
            .map(|i| (format!("N{:02}", i), i.to_string()))
            .collect();
        Self { map }
    }

    pub fn resolve(&self, node_id: &str) -> Option<&str> {
        self.map.get(node_id).map(String::as_str)
    }
}
