use std::collections::HashSet;
use std::str::FromStr;
use structura_types::{AclId, AssignmentId, GroupId, PropertyId, TypeId};

// ── AssignmentId ──────────────────────────────────────────────────

#[test]
fn assignment_id_raw_roundtrip() {
    let id = AssignmentId::new(42);
    assert_eq!(id.get(), 42);
    assert_eq!(AssignmentId::from(42), id);
}

#[test]
fn assignment_id_display_and_parse() {
    let id = AssignmentId::new(1337);
    let s = id.to_string();
    assert_eq!(s, "1337");
    assert_eq!(AssignmentId::from_str(&s).unwrap(), id);
}

#[test]
fn assignment_id_parse_trims_whitespace() {
    assert_eq!(AssignmentId::from_str(" 7 ").unwrap(), AssignmentId::new(7));
}

#[test]
fn assignment_id_parse_invalid() {
    assert!(AssignmentId::from_str("not-a-number").is_err());
    assert!(AssignmentId::from_str("-1").is_err());
}

#[test]
fn assignment_id_hash_and_eq() {
    let id = AssignmentId::new(9);
    let mut set = HashSet::new();
    set.insert(id);
    set.insert(id); // duplicate
    assert_eq!(set.len(), 1);
}

#[test]
fn assignment_id_ordering() {
    assert!(AssignmentId::new(1) < AssignmentId::new(2));
}

#[test]
fn assignment_id_serializes_transparently() {
    let id = AssignmentId::new(5);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "5");
    let parsed: AssignmentId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn assignment_id_debug_names_type() {
    let debug = format!("{:?}", AssignmentId::new(3));
    assert!(debug.contains("AssignmentId"));
}

// ── Other ids ─────────────────────────────────────────────────────

#[test]
fn ids_of_different_kinds_are_distinct_types() {
    let p = PropertyId::new(1);
    let g = GroupId::new(1);
    let a = AclId::new(1);
    assert_eq!(p.get(), g.get());
    assert_eq!(g.get(), a.get());
    assert_eq!(format!("{p}{g}{a}"), "111");
}

#[test]
fn root_type_id_is_zero() {
    assert_eq!(TypeId::ROOT.get(), 0);
    assert_eq!(TypeId::from_str("0").unwrap(), TypeId::ROOT);
}
