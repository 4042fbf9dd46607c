// Topology table and node resolver validation tests

use minewatch::models::{Position, ZoneTopologyEntry};
use minewatch::topology::{NodeResolver, Topology, TopologyError};
use std::collections::BTreeMap;

fn zone(id: &str, parent: Option<&str>, children: &[&str]) -> ZoneTopologyEntry {
    ZoneTopologyEntry {
        zone_id: id.into(),
        display_name: format!("Zone {}", id),
        position: Position { x: 0.0, y: 0.0 },
        parent_id: parent.map(Into::into),
        children: children.iter().map(|c| (*c).into()).collect(),
    }
}

#[test]
fn test_builtin_layout() {
    let t = Topology::builtin();
    assert_eq!(t.len(), 7);
    let root = t.get("1").unwrap();
    assert_eq!(root.display_name, "Main Entry Point");
    assert_eq!(root.parent_id, None);
    assert_eq!(root.position, Position { x: 50.0, y: 10.0 });
    assert_eq!(t.get("4").unwrap().children, ["5", "6"]);
    assert!(t.get("8").is_none());
}

#[test]
fn test_builtin_resolver() {
    let r = NodeResolver::builtin();
    assert_eq!(r.resolve("N01"), Some("1"));
    assert_eq!(r.resolve("N07"), Some("7"));
    assert_eq!(r.resolve("N08"), None);
    assert_eq!(r.resolve("n01"), None);
}

#[test]
fn test_rejects_duplicate_zone() {
    let err = Topology::new(vec![zone("a", None, &[]), zone("a", None, &[])]).unwrap_err();
    assert_eq!(err, TopologyError::DuplicateZone("a".into()));
}

#[test]
fn test_rejects_unknown_parent() {
    let err = Topology::new(vec![zone("a", Some("missing"), &[])]).unwrap_err();
    assert!(matches!(err, TopologyError::UnknownReference { relation: "parent", .. }));
}

#[test]
fn test_rejects_unknown_child() {
    let err = Topology::new(vec![zone("a", None, &["b"])]).unwrap_err();
    assert!(matches!(err, TopologyError::UnknownReference { relation: "child", .. }));
}

#[test]
fn test_rejects_child_with_other_parent() {
    let err = Topology::new(vec![
        zone("a", None, &["c"]),
        zone("b", None, &[]),
        zone("c", Some("b"), &[]),
    ])
    .unwrap_err();
    assert_eq!(
        err,
        TopologyError::ParentMismatch {
            child: "c".into(),
            parent: "a".into(),
            actual: Some("b".into()),
        }
    );
}

#[test]
fn test_rejects_parent_cycle() {
    let err = Topology::new(vec![zone("a", Some("b"), &[]), zone("b", Some("a"), &[])]).unwrap_err();
    assert!(matches!(err, TopologyError::Cycle(_)));
}

#[test]
fn test_resolver_rejects_unknown_zone() {
    let t = Topology::builtin();
    let map = BTreeMap::from([("N01".to_string(), "42".to_string())]);
    let err = NodeResolver::new(map, &t).unwrap_err();
    assert_eq!(
        err,
        TopologyError::UnknownZoneForNode {
            node: "N01".into(),
            zone: "42".into(),
        }
    );
}

#[test]
fn test_entry_accepts_camel_and_snake_case() {
    let camel: ZoneTopologyEntry = serde_json::from_str(
        r#"{"zoneId":"1","displayName":"Entry","position":{"x":1,"y":2},"children":["2"]}"#,
    )
    .unwrap();
    let snake: ZoneTopologyEntry = serde_json::from_str(
        r#"{"zone_id":"1","display_name":"Entry","position":{"x":1,"y":2},"children":["2"]}"#,
    )
    .unwrap();
    assert_eq!(camel, snake);
    let json = serde_json::to_value(&camel).unwrap();
    assert_eq!(json["zoneId"], "1");
    assert!(json.get("parentId").is_none());
}
