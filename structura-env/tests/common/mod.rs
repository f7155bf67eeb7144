//! Shared structure fixture for environment tests.

#![allow(dead_code)]

use serde_json::json;
use structura_env::{Environment, EnvironmentBuilder};
use structura_model::DataType;
use structura_model::edit::{GroupEdit, PropertyEdit, TypeEdit};
use structura_types::{AclId, AssignmentId, GroupId, Multiplicity, PropertyId, TypeId};

/// Ids of everything in the `DOCUMENT` fixture.
///
/// ```text
/// DOCUMENT
/// ├── TITLE            (TITLE, 1..1)
/// ├── TEASER           (TEASER, 0..N, AnyOf)
/// │   ├── TEASER_TITLE (TITLE, 1..1)
/// │   └── TEASER_TEXT  (BODY, 0..1, default "lorem")
/// └── IMAGE            (IMAGE, binary, 0..N)
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Ids {
    pub acl: AclId,
    pub title: PropertyId,
    pub body: PropertyId,
    pub image: PropertyId,
    pub teaser: GroupId,
    pub document: TypeId,
    pub title_assignment: AssignmentId,
    pub teaser_assignment: AssignmentId,
    pub teaser_title: AssignmentId,
    pub teaser_text: AssignmentId,
    pub image_assignment: AssignmentId,
}

/// A builder holding the `DOCUMENT` fixture, not yet built.
pub fn document_builder() -> (EnvironmentBuilder, Ids) {
    let mut b = EnvironmentBuilder::new();
    let acl = b.add_acl("default").unwrap();

    let mut title = PropertyEdit::new("TITLE", DataType::String1024, acl);
    title.set_multiplicity(Multiplicity::ONE_ONE);
    let title = b.add_property(title).unwrap();

    let mut body = PropertyEdit::new("BODY", DataType::Text, acl);
    body.set_default_value(Some(json!("lorem")));
    let body = b.add_property(body).unwrap();

    let mut image = PropertyEdit::new("IMAGE", DataType::Binary, acl);
    image.set_multiplicity(Multiplicity::ZERO_N);
    let image = b.add_property(image).unwrap();

    let mut teaser = GroupEdit::new("TEASER");
    teaser.set_multiplicity(Multiplicity::ZERO_N);
    let teaser = b.add_group(teaser).unwrap();

    let document = b.add_type(TypeEdit::new("DOCUMENT", acl)).unwrap();

    let mut edit = b.new_property_assignment(title, document, "/", None).unwrap();
    edit.set_position(0);
    let title_assignment = b.assign_property(edit).unwrap();

    let mut edit = b.new_group_assignment(teaser, document, "/", None).unwrap();
    edit.set_position(1);
    let teaser_assignment = b.assign_group(edit).unwrap();

    let mut edit = b
        .new_property_assignment(title, document, "/TEASER", Some("TEASER_TITLE"))
        .unwrap();
    edit.set_position(0);
    let teaser_title = b.assign_property(edit).unwrap();

    let mut edit = b
        .new_property_assignment(body, document, "/TEASER", Some("TEASER_TEXT"))
        .unwrap();
    edit.set_position(1);
    let teaser_text = b.assign_property(edit).unwrap();

    let mut edit = b.new_property_assignment(image, document, "/", None).unwrap();
    edit.set_position(2);
    let image_assignment = b.assign_property(edit).unwrap();

    let ids = Ids {
        acl,
        title,
        body,
        image,
        teaser,
        document,
        title_assignment,
        teaser_assignment,
        teaser_title,
        teaser_text,
        image_assignment,
    };
    (b, ids)
}

/// The built `DOCUMENT` fixture.
pub fn document() -> (Environment, Ids) {
    let (b, ids) = document_builder();
    (b.build().unwrap(), ids)
}

/// The fixture plus `ARTICLE`, derived from `DOCUMENT`.
pub fn with_article() -> (Environment, Ids, TypeId) {
    let (mut b, ids) = document_builder();
    let parent = b.staging().type_(ids.document).unwrap().clone();
    let article = b.add_type(TypeEdit::derive(&parent, "ARTICLE")).unwrap();
    (b.build().unwrap(), ids, article)
}
