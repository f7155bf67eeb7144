use proptest::prelude::*;
use structura_model::option::{self, keys};
use structura_model::{OptionList, StructureOption};

fn list(options: &[(&str, bool, &str)]) -> OptionList {
    let mut list = OptionList::new();
    for (key, overridable, value) in options {
        list.set(key, *overridable, *value).unwrap();
    }
    list
}

// ── Resolution ───────────────────────────────────────────────────

#[test]
fn unset_element_option_defers_to_assignment() {
    let element = OptionList::new();
    let assignment = list(&[(keys::SEARCHABLE, true, "1")]);
    let resolved = option::resolve(&element, &assignment, keys::SEARCHABLE);
    assert_eq!(resolved.value(), "1");
    assert!(resolved.is_set());
}

#[test]
fn unset_everywhere_is_unknown() {
    let resolved = option::resolve(&OptionList::new(), &OptionList::new(), "missing");
    assert!(!resolved.is_set());
    assert!(resolved.is_overridable());
    assert_eq!(resolved.key(), "MISSING");
    assert_eq!(resolved.value(), "");
}

#[test]
fn non_overridable_element_option_wins() {
    let element = list(&[(keys::SEARCHABLE, false, "1")]);
    let assignment = list(&[(keys::SEARCHABLE, true, "0")]);
    assert!(option::resolve(&element, &assignment, keys::SEARCHABLE).is_value_true());
}

#[test]
fn overridable_element_option_yields() {
    let element = list(&[(keys::SEARCHABLE, true, "1")]);
    let assignment = list(&[(keys::SEARCHABLE, true, "0")]);
    assert_eq!(option::resolve(&element, &assignment, keys::SEARCHABLE).value(), "0");
    assert_eq!(option::resolve(&element, &OptionList::new(), keys::SEARCHABLE).value(), "1");
}

// ── Values ───────────────────────────────────────────────────────

#[test]
fn typed_reads() {
    let opt = StructureOption::new("MAXLENGTH", true, true, " 42 ");
    assert_eq!(opt.int_value(), 42);
    assert!(opt.is_valid());
    assert!(!opt.is_value_true());
    assert_eq!(StructureOption::new("X", true, true, "abc").int_value(), 0);
    assert!(!StructureOption::new("X", true, true, "").is_valid());
}

#[test]
fn set_bool_stores_digits() {
    let mut l = OptionList::new();
    l.set_bool("A", true, true).unwrap();
    l.set_bool("B", true, false).unwrap();
    assert_eq!(l.get("A").value(), option::VALUE_TRUE);
    assert_eq!(l.get("B").value(), option::VALUE_FALSE);
}

#[test]
fn clear_removes() {
    let mut l = list(&[("A", true, "1")]);
    assert!(l.clear("a"));
    assert!(!l.clear("a"));
    assert!(l.is_empty());
}

#[test]
fn inherited_only_filters() {
    let mut l = list(&[("OWN", true, "1")]);
    l.set_with("PARENT", true, true, "2".to_owned()).unwrap();
    let inherited = l.inherited_only();
    assert_eq!(inherited.len(), 1);
    assert!(inherited.has("PARENT"));
    assert!(inherited.get("PARENT").is_inherited());
}

#[test]
fn cloned_list_is_independent() {
    let original = list(&[("A", true, "1"), ("B", false, "2")]);
    let mut copy = original.clone();
    assert_eq!(copy, original);
    copy.set("A", true, "changed").unwrap();
    copy.clear("B");
    assert_eq!(original.get("A").value(), "1");
    assert!(original.has("B"));
}

// ── Properties ───────────────────────────────────────────────────

fn key_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{1,8}"
}

proptest! {
    #[test]
    fn non_overridable_option_is_never_overridden(
        key in key_strategy(),
        element_value in "[a-z0-9]{0,6}",
        assignment_value in "[a-z0-9]{0,6}",
        assignment_overridable in any::<bool>(),
    ) {
        let mut element = OptionList::new();
        element.set(&key, false, element_value.clone()).unwrap();
        let mut assignment = OptionList::new();
        assignment.set(&key, assignment_overridable, assignment_value).unwrap();
        let resolved = option::resolve(&element, &assignment, &key);
        prop_assert_eq!(resolved.value(), element_value.as_str());
    }

    #[test]
    fn overridable_option_takes_assignment_value(
        key in key_strategy(),
        element_value in "[a-z0-9]{0,6}",
        assignment_value in "[a-z0-9]{0,6}",
    ) {
        let mut element = OptionList::new();
        element.set(&key, true, element_value).unwrap();
        let mut assignment = OptionList::new();
        assignment.set(&key, true, assignment_value.clone()).unwrap();
        let resolved = option::resolve(&element, &assignment, &key);
        prop_assert_eq!(resolved.value(), assignment_value.as_str());
    }

    #[test]
    fn clone_then_mutate_leaves_original(
        entries in proptest::collection::vec((key_strategy(), "[a-z]{0,4}"), 1..8),
        new_value in "[A-Z]{5}",
    ) {
        let mut original = OptionList::new();
        for (k, v) in &entries {
            original.set(k, true, v.clone()).unwrap();
        }
        let snapshot = original.clone();
        let mut copy = original.clone();
        for (k, _) in &entries {
            copy.set(k, false, new_value.clone()).unwrap();
        }
        prop_assert_eq!(&original, &snapshot);
    }
}
