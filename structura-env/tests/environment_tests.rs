mod common;

use pretty_assertions::assert_eq;
use structura_model::{DataType, OptionSource};
use structura_types::{Error, ErrorKind, TypeId};

// ── Lookups ──────────────────────────────────────────────────────

#[test]
fn lookups_by_id_and_name() {
    let (env, ids) = common::document();
    assert_eq!(env.version(), 1);
    assert_eq!(env.property(ids.title).unwrap().name(), "TITLE");
    assert_eq!(env.property_by_name(" title ").unwrap().id(), ids.title);
    assert_eq!(env.group_by_name("teaser").unwrap().id(), ids.teaser);
    assert_eq!(env.type_by_name("Document").unwrap().id(), ids.document);
    assert_eq!(env.acl_by_name("DEFAULT").unwrap().id, ids.acl);

    assert!(env.property_exists("body"));
    assert!(!env.property_exists("missing"));
    assert!(env.group_exists("TEASER"));
    assert!(env.type_exists("DOCUMENT"));
    assert!(!env.type_exists("ARTICLE"));
}

#[test]
fn missing_entries_are_not_found() {
    let (env, ids) = common::document();
    let err = env.property_by_name("nothing").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(env.type_(TypeId::new(999)), Err(Error::NotFound { kind: "type", .. })));
    assert!(matches!(
        env.group_assignment(ids.title_assignment),
        Err(Error::NotAGroup(_))
    ));
    assert!(matches!(
        env.property_assignment(ids.teaser_assignment),
        Err(Error::NotAProperty(_))
    ));
}

// ── XPath resolution ─────────────────────────────────────────────

#[test]
fn nested_xpath_resolves() {
    let (env, ids) = common::document();
    let a = env.assignment_by_xpath("DOCUMENT/TEASER/TEASER_TITLE").unwrap();
    assert_eq!(a.id(), ids.teaser_title);
    assert_eq!(a.parent(), Some(ids.teaser_assignment));

    let same = env.assignment_by_xpath("document/teaser[2]/teaser_title[1]").unwrap();
    assert_eq!(same.id(), ids.teaser_title);
    assert!(env.assignment_exists("DOCUMENT/IMAGE"));
}

#[test]
fn unknown_xpaths_fail() {
    let (env, _) = common::document();
    assert!(matches!(
        env.assignment_by_xpath("DOCUMENT/TEASER/NOPE"),
        Err(Error::NotFound { .. })
    ));
    assert!(matches!(
        env.assignment_by_xpath("OTHER/TITLE"),
        Err(Error::NotFound { kind: "type", .. })
    ));
    assert!(matches!(
        env.assignment_by_xpath("/TITLE"),
        Err(Error::InvalidXPath { .. })
    ));
    assert!(!env.assignment_exists("DOCUMENT/1BAD"));
}

#[test]
fn xpath_validity_checks_aliases_indices_and_kind() {
    let (env, ids) = common::document();
    let doc = ids.document;
    assert!(env.is_xpath_valid(doc, "/TEASER[4]/TEASER_TITLE[1]", true));
    assert!(env.is_xpath_valid(doc, "DOCUMENT/TITLE", true));
    assert!(!env.is_xpath_valid(doc, "/TITLE[2]", true));
    assert!(!env.is_xpath_valid(doc, "/TEASER", true));
    assert!(env.is_xpath_valid(doc, "/TEASER", false));
    assert!(!env.is_xpath_valid(doc, "/TEASER/MISSING", true));
    assert!(!env.is_xpath_valid(doc, "/TEASER[0]/TEASER_TITLE", true));
}

#[test]
fn xpath_of_another_type_is_invalid() {
    let (env, ids) = common::document();
    assert!(env.is_xpath_valid(ids.document, "document/title", true));
    assert!(!env.is_xpath_valid(ids.document, "OTHER/TITLE", true));
    assert!(!env.is_xpath_valid(ids.document, "OTHER/TEASER[1]/TEASER_TITLE", true));
}

#[test]
fn disabled_steps_make_an_xpath_invalid() {
    let (mut b, ids) = common::document_builder();
    let mut edit = structura_model::edit::GroupAssignmentEdit::from(
        b.staging().group_assignment(ids.teaser_assignment).unwrap(),
    );
    edit.set_enabled(false);
    b.update_group_assignment(edit).unwrap();
    let env = b.build().unwrap();
    assert!(!env.is_xpath_valid(ids.document, "/TEASER/TEASER_TITLE", true));
}

// ── Tree queries ─────────────────────────────────────────────────

#[test]
fn children_are_ordered_by_position() {
    let (env, ids) = common::document();
    let root: Vec<&str> = env
        .type_assignments(ids.document)
        .unwrap()
        .iter()
        .map(|a| a.alias())
        .collect();
    assert_eq!(root, vec!["TITLE", "TEASER", "IMAGE"]);

    let teaser: Vec<&str> = env
        .child_assignments(ids.teaser_assignment)
        .unwrap()
        .iter()
        .map(|a| a.alias())
        .collect();
    assert_eq!(teaser, vec!["TEASER_TITLE", "TEASER_TEXT"]);

    let all: Vec<&str> = env
        .all_type_assignments(ids.document)
        .unwrap()
        .iter()
        .map(|a| a.alias())
        .collect();
    assert_eq!(all, vec!["TITLE", "TEASER", "TEASER_TITLE", "TEASER_TEXT", "IMAGE"]);
}

#[test]
fn connected_assignments_by_parent_path() {
    let (env, ids) = common::document();
    assert_eq!(env.connected_assignments(ids.document, "/").unwrap().len(), 3);
    let teaser = env.connected_assignments(ids.document, "DOCUMENT/TEASER").unwrap();
    assert_eq!(teaser.len(), 2);
    assert!(env.connected_assignments(ids.document, "/NOPE").is_err());
}

#[test]
fn property_queries() {
    let (env, ids) = common::document();
    let uses: Vec<_> = env
        .assignments_for_property(ids.title)
        .iter()
        .map(|pa| pa.core().id())
        .collect();
    assert_eq!(uses, vec![ids.title_assignment, ids.teaser_title]);
    assert_eq!(env.types_for_property(ids.title).len(), 1);
    assert_eq!(env.property_assignments(false).len(), 4);
    assert_eq!(env.group_assignments(true).len(), 1);
}

#[test]
fn mandatory_assignments_require_the_whole_chain() {
    let (env, ids) = common::document();
    // TEASER is optional, so TEASER_TITLE is not mandatory for the type
    let mandatory: Vec<_> = env
        .mandatory_assignments(ids.document, DataType::String1024)
        .unwrap()
        .iter()
        .map(|pa| pa.core().id())
        .collect();
    assert_eq!(mandatory, vec![ids.title_assignment]);
    assert!(env.mandatory_assignments(ids.document, DataType::Text).unwrap().is_empty());
}

#[test]
fn effective_options_through_the_environment() {
    let (env, ids) = common::document();
    let pa = env.property_assignment(ids.teaser_title).unwrap();
    assert!(!pa.is_searchable());
    assert_eq!(pa.max_input_length(), Some(1024));
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn environment_serializes_to_json() {
    let (env, ids) = common::document();
    let json = serde_json::to_value(&env).unwrap();
    assert_eq!(json["version"], serde_json::json!(1));
    let key = ids.teaser_title.to_string();
    assert_eq!(json["assignments"][&key]["kind"], serde_json::json!("property"));
}
