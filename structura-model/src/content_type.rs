use crate::assignment::ChildList;
use crate::option::TypeOption;
use serde::{Deserialize, Serialize};
use structura_types::{AclId, TypeId};

/// Whether instances are plain content or relations between content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeMode {
    #[default]
    Content,
    Relation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeState {
    #[default]
    Available,
    Locked,
    Unavailable,
}

/// Which permission layers apply to instances of a type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypePermissions {
    pub instance: bool,
    pub property: bool,
    pub step: bool,
    #[serde(rename = "type")]
    pub type_: bool,
}

/// A relation constraint: instances of `source` may be related to
/// instances of `destination`. A maximum of 0 means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRelation {
    pub source: TypeId,
    pub destination: TypeId,
    #[serde(default)]
    pub max_source: u32,
    #[serde(default)]
    pub max_destination: u32,
}

impl TypeRelation {
    #[must_use]
    pub const fn is_source_unlimited(&self) -> bool {
        self.max_source == 0
    }

    #[must_use]
    pub const fn is_destination_unlimited(&self) -> bool {
        self.max_destination == 0
    }
}

/// A content type: the root of an assignment tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentType {
    pub(crate) id: TypeId,
    pub(crate) name: String,
    pub(crate) label: String,
    pub(crate) parent: Option<TypeId>,
    pub(crate) mode: TypeMode,
    pub(crate) state: TypeState,
    pub(crate) acl: AclId,
    pub(crate) permissions: TypePermissions,
    pub(crate) max_rel_source: u32,
    pub(crate) max_rel_destination: u32,
    pub(crate) relations: Vec<TypeRelation>,
    pub(crate) options: Vec<TypeOption>,
    /// Root-level assignments, ordered by position.
    pub(crate) children: ChildList,
    /// Directly derived types.
    pub(crate) derived: Vec<TypeId>,
}

impl ContentType {
    pub(crate) fn draft(name: &str, acl: AclId) -> Self {
        let name = name.trim().to_uppercase();
        Self {
            id: TypeId::new(0),
            label: name.clone(),
            name,
            parent: None,
            mode: TypeMode::Content,
            state: TypeState::Available,
            acl,
            permissions: TypePermissions::default(),
            max_rel_source: 0,
            max_rel_destination: 0,
            relations: Vec::new(),
            options: Vec::new(),
            children: ChildList::new(),
            derived: Vec::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub const fn parent(&self) -> Option<TypeId> {
        self.parent
    }

    #[must_use]
    pub const fn is_derived(&self) -> bool {
        self.parent.is_some()
    }

    #[must_use]
    pub const fn mode(&self) -> TypeMode {
        self.mode
    }

    #[must_use]
    pub const fn is_relation(&self) -> bool {
        matches!(self.mode, TypeMode::Relation)
    }

    #[must_use]
    pub const fn state(&self) -> TypeState {
        self.state
    }

    #[must_use]
    pub const fn acl(&self) -> AclId {
        self.acl
    }

    #[must_use]
    pub const fn permissions(&self) -> TypePermissions {
        self.permissions
    }

    /// Whether property ACLs are checked when instances are created.
    #[must_use]
    pub const fn use_property_permissions(&self) -> bool {
        self.permissions.property
    }

    /// Maximum number of sources per destination, 0 for unlimited.
    #[must_use]
    pub const fn max_rel_source(&self) -> u32 {
        self.max_rel_source
    }

    /// Maximum number of destinations per source, 0 for unlimited.
    #[must_use]
    pub const fn max_rel_destination(&self) -> u32 {
        self.max_rel_destination
    }

    #[must_use]
    pub fn relations(&self) -> &[TypeRelation] {
        &self.relations
    }

    #[must_use]
    pub fn relation(&self, source: TypeId, destination: TypeId) -> Option<&TypeRelation> {
        self.relations
            .iter()
            .find(|r| r.source == source && r.destination == destination)
    }

    #[must_use]
    pub fn options(&self) -> &[TypeOption] {
        &self.options
    }

    /// The option stored under `key`, or the unknown placeholder.
    #[must_use]
    pub fn option(&self, key: &str) -> TypeOption {
        let key = key.trim().to_uppercase();
        self.options
            .iter()
            .find(|o| o.key() == key)
            .cloned()
            .unwrap_or_else(|| TypeOption::unknown(&key))
    }

    #[must_use]
    pub fn has_option(&self, key: &str) -> bool {
        let key = key.trim().to_uppercase();
        self.options.iter().any(|o| o.key() == key)
    }

    #[must_use]
    pub const fn children(&self) -> &ChildList {
        &self.children
    }

    #[must_use]
    pub fn with_children(mut self, children: ChildList) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn derived_types(&self) -> &[TypeId] {
        &self.derived
    }

    #[must_use]
    pub fn with_derived(mut self, derived: Vec<TypeId>) -> Self {
        self.derived = derived;
        self
    }

    /// The same type with `passed_on` options of `parent` applied.
    ///
    /// Keys the type does not define are copied and flagged as inherited.
    /// A parent option that is not overridable replaces the type's own.
    #[must_use]
    pub fn inheriting_options(mut self, parent: &[TypeOption]) -> Self {
        self.options.retain(|o| !o.option().is_inherited());
        for inherited in parent.iter().filter(|o| o.is_passed_on()) {
            match self.options.iter().position(|o| o.key() == inherited.key()) {
                None => self.options.push(inherited.inherited_copy()),
                Some(at) if !inherited.option().is_overridable() => {
                    self.options[at] = inherited.inherited_copy();
                }
                Some(_) => {}
            }
        }
        self
    }
}
