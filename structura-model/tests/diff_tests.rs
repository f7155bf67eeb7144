use std::sync::Arc;
use structura_model::edit::{GroupAssignmentEdit, GroupEdit, PropertyAssignmentEdit, PropertyEdit, TypeEdit};
use structura_model::option::keys;
use structura_model::{Assignment, AssignmentDiff, ContentType, DataType, DiffAttribute, GroupMode};
use structura_types::{AclId, AssignmentId, Error, GroupId, Multiplicity, PropertyId, TypeId};

fn types() -> (ContentType, ContentType) {
    let parent = TypeEdit::new("DOCUMENT", AclId::new(1)).commit(TypeId::new(1)).unwrap();
    let child = TypeEdit::derive(&parent, "ARTICLE").commit(TypeId::new(2)).unwrap();
    (parent, child)
}

fn base_and_derived() -> (Assignment, PropertyAssignmentEdit) {
    let (parent, child) = types();
    let mut p = PropertyEdit::new("TITLE", DataType::Text, AclId::new(1));
    p.set_option_bool(keys::SEARCHABLE, true, true).unwrap();
    let p = Arc::new(p.commit(PropertyId::new(1)).unwrap());
    let base = PropertyAssignmentEdit::new(p, &parent, "/", None)
        .unwrap()
        .commit(AssignmentId::new(1), None)
        .unwrap();
    let derived = PropertyAssignmentEdit::derive(&base, &child, None, "/").unwrap();
    (Assignment::Property(base), derived)
}

#[test]
fn fresh_derivation_has_no_differences() {
    let (base, derived) = base_and_derived();
    let derived = Assignment::Property(derived.commit(AssignmentId::new(2), None).unwrap());
    let diff = AssignmentDiff::between(&base, &derived).unwrap();
    assert!(diff.is_empty(), "unexpected: {:?}", diff.attributes().collect::<Vec<_>>());
}

#[test]
fn overrides_are_reported() {
    let (base, mut derived) = base_and_derived();
    derived
        .set_label(Some("Article title"))
        .set_enabled(false)
        .set_default_multiplicity(0);
    derived.set_option_bool(keys::SEARCHABLE, true, false).unwrap();
    derived.set_multiplicity(Multiplicity::ZERO_N).unwrap();
    derived.set_acl(AclId::new(5)).unwrap();
    let derived = Assignment::Property(derived.commit(AssignmentId::new(2), None).unwrap());

    let diff = AssignmentDiff::between(&base, &derived).unwrap();
    for attribute in [
        DiffAttribute::Label,
        DiffAttribute::Enabled,
        DiffAttribute::DefaultMultiplicity,
        DiffAttribute::Multiplicity,
        DiffAttribute::Acl,
        DiffAttribute::Option(keys::SEARCHABLE.to_owned()),
    ] {
        assert!(diff.contains(&attribute), "missing {attribute}");
    }
    assert!(!diff.contains(&DiffAttribute::Alias));
    assert!(!diff.contains(&DiffAttribute::Position));
}

#[test]
fn mixed_kinds_are_rejected() {
    let (base, _) = base_and_derived();
    let (parent, _) = types();
    let g = Arc::new(GroupEdit::new("TEASER").commit(GroupId::new(1)).unwrap());
    let ga = GroupAssignmentEdit::new(g, &parent, "/", None)
        .unwrap()
        .commit(AssignmentId::new(3), None)
        .unwrap();
    let err = AssignmentDiff::between(&base, &Assignment::Group(ga)).unwrap_err();
    assert!(matches!(err, Error::InvalidDerivation(_)));
}

#[test]
fn against_element() {
    let (parent, _) = types();
    let g = Arc::new(GroupEdit::new("TEASER").commit(GroupId::new(1)).unwrap());
    let mut edit = GroupAssignmentEdit::new(g, &parent, "/", Some("box")).unwrap();
    edit.set_mode(GroupMode::OneOf);
    let ga = Assignment::Group(edit.commit(AssignmentId::new(3), None).unwrap());

    let diff = AssignmentDiff::against_element(&ga);
    assert!(diff.contains(&DiffAttribute::Mode));
    assert!(diff.contains(&DiffAttribute::Alias));
    assert!(!diff.contains(&DiffAttribute::Multiplicity));
}

#[test]
fn attribute_display_names() {
    assert_eq!(DiffAttribute::DefaultMultiplicity.to_string(), "defaultMultiplicity");
    assert_eq!(DiffAttribute::Option("MAXLENGTH".into()).to_string(), "option:MAXLENGTH");
}
