use pretty_assertions::assert_eq;
use serde_json::json;
use structura_model::edit::{Change, GroupEdit, PropertyEdit};
use structura_model::option::keys;
use structura_model::{DataType, GroupMode, OptionSource, UniqueMode};
use structura_types::{AclId, Error, GroupId, Multiplicity, PropertyId, TypeId};

// ── PropertyEdit ─────────────────────────────────────────────────

#[test]
fn new_property_commits_with_defaults() {
    let p = PropertyEdit::new("title", DataType::String1024, AclId::new(1))
        .commit(PropertyId::new(7))
        .unwrap();
    assert_eq!(p.id(), PropertyId::new(7));
    assert_eq!(p.name(), "TITLE");
    assert_eq!(p.element().label(), "TITLE");
    assert_eq!(p.multiplicity(), Multiplicity::ZERO_ONE);
    assert!(p.may_override_acl());
    assert!(p.may_override_multiplicity());
    assert_eq!(p.unique_mode(), UniqueMode::None);
    assert_eq!(p.default_value(), None);
}

#[test]
fn empty_name_is_rejected() {
    let err = PropertyEdit::new("  ", DataType::Text, AclId::new(1))
        .commit(PropertyId::new(1))
        .unwrap_err();
    assert_eq!(err, Error::EmptyParameter("name"));
}

#[test]
fn invalid_name_is_rejected() {
    let err = PropertyEdit::new("my title", DataType::Text, AclId::new(1))
        .commit(PropertyId::new(1))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidName(_)));
}

#[test]
fn referenced_type_requires_reference_data_type() {
    let mut edit = PropertyEdit::new("LINK", DataType::Text, AclId::new(1));
    edit.set_referenced_type(Some(TypeId::new(3)));
    assert!(edit.clone().commit(PropertyId::new(1)).is_err());

    edit.set_data_type(DataType::Reference);
    let p = edit.commit(PropertyId::new(1)).unwrap();
    assert_eq!(p.referenced_type(), Some(TypeId::new(3)));
}

#[test]
fn edit_of_existing_property_tracks_changes() {
    let p = PropertyEdit::new("TITLE", DataType::String1024, AclId::new(1))
        .commit(PropertyId::new(4))
        .unwrap();
    let mut edit = PropertyEdit::from(&p);
    assert!(!edit.is_new());
    assert_eq!(edit.id(), Some(PropertyId::new(4)));
    assert!(edit.changes().is_empty());

    edit.set_label("Title")
        .set_multiplicity(Multiplicity::ONE_ONE)
        .set_default_value(Some(json!("untitled")));
    edit.set_option_bool(keys::SEARCHABLE, false, true).unwrap();

    assert!(edit.changes().contains(Change::Label));
    assert!(edit.changes().contains(Change::Multiplicity));
    assert!(edit.changes().contains(Change::Options));
    assert!(!edit.changes().contains(Change::Acl));

    let updated = edit.commit(PropertyId::new(4)).unwrap();
    assert_eq!(updated.element().label(), "Title");
    assert!(updated.is_searchable());
    assert!(!updated.may_override_option("searchable"));
    assert_eq!(updated.default_value(), Some(&json!("untitled")));
    // the committed original is untouched
    assert_eq!(p.multiplicity(), Multiplicity::ZERO_ONE);
}

#[test]
fn clearing_missing_option_is_not_a_change() {
    let p = PropertyEdit::new("TITLE", DataType::Text, AclId::new(1))
        .commit(PropertyId::new(1))
        .unwrap();
    let mut edit = PropertyEdit::from(&p);
    edit.clear_option("NOPE");
    assert!(edit.changes().is_empty());
}

#[test]
fn property_option_accessors() {
    let mut edit = PropertyEdit::new("BODY", DataType::Html, AclId::new(1));
    edit.set_option(keys::MULTILINE, true, "5").unwrap();
    edit.set_option(keys::MAXLENGTH, true, "200").unwrap();
    edit.set_option_bool(keys::HTML_EDITOR, true, true).unwrap();
    let p = edit.commit(PropertyId::new(1)).unwrap();

    assert!(p.is_multi_line());
    assert_eq!(p.multi_lines(), 5);
    assert!(p.has_max_length());
    assert_eq!(p.max_length(), 200);
    assert!(p.is_use_html_editor());
    assert!(!p.is_multi_lang());
    assert!(!p.is_in_overview());
}

#[test]
fn empty_option_key_is_rejected() {
    let mut edit = PropertyEdit::new("BODY", DataType::Text, AclId::new(1));
    assert_eq!(edit.set_option(" ", true, "1").unwrap_err(), Error::EmptyParameter("key"));
}

// ── GroupEdit ────────────────────────────────────────────────────

#[test]
fn group_commit_and_mode() {
    let mut edit = GroupEdit::new("teaser");
    edit.set_mode(GroupMode::OneOf).set_multiplicity(Multiplicity::ZERO_N);
    let g = edit.commit(GroupId::new(2)).unwrap();
    assert_eq!(g.name(), "TEASER");
    assert_eq!(g.default_mode(), GroupMode::OneOf);
    assert!(g.multiplicity().is_unlimited());
}

#[test]
fn group_rename_through_edit() {
    let g = GroupEdit::new("A").commit(GroupId::new(1)).unwrap();
    let mut edit = GroupEdit::from(&g);
    edit.set_name("b").set_label("");
    let renamed = edit.commit(GroupId::new(1)).unwrap();
    assert_eq!(renamed.name(), "B");
    assert_eq!(renamed.element().label(), "B");
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn property_serializes_multiplicity_as_text() {
    let mut edit = PropertyEdit::new("TITLE", DataType::String1024, AclId::new(1));
    edit.set_multiplicity(Multiplicity::ONE_N);
    let p = edit.commit(PropertyId::new(1)).unwrap();
    let json = serde_json::to_value(&p).unwrap();
    assert_eq!(json["multiplicity"], json!("1..N"));
    assert_eq!(json["data_type"], json!("string1024"));
}
