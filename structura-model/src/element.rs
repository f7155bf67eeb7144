use crate::data_type::DataType;
use crate::option::{OptionList, OptionSource, StructureOption};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use structura_types::{AclId, GroupId, Multiplicity, PropertyId, TypeId};

/// Attributes shared by properties and groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureElement {
    pub(crate) name: String,
    pub(crate) label: String,
    pub(crate) hint: String,
    pub(crate) multiplicity: Multiplicity,
    pub(crate) override_multiplicity: bool,
    pub(crate) options: OptionList,
}

impl StructureElement {
    pub(crate) fn new(name: &str) -> Self {
        let name = name.trim().to_uppercase();
        Self {
            label: name.clone(),
            name,
            hint: String::new(),
            multiplicity: Multiplicity::ZERO_ONE,
            override_multiplicity: true,
            options: OptionList::new(),
        }
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
    pub fn hint(&self) -> &str {
        &self.hint
    }

    #[must_use]
    pub const fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    /// Whether assignments may replace the multiplicity.
    #[must_use]
    pub const fn may_override_multiplicity(&self) -> bool {
        self.override_multiplicity
    }

    #[must_use]
    pub const fn options(&self) -> &OptionList {
        &self.options
    }

    /// Whether assignments may override the option stored under `key`.
    /// Keys the element does not set are always overridable.
    #[must_use]
    pub fn may_override_option(&self, key: &str) -> bool {
        self.options.find(key).is_none_or(|o| !o.is_set() || o.is_overridable())
    }
}

/// Uniqueness constraint on property values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueMode {
    #[default]
    None,
    /// Unique across all instances of all types.
    Global,
    /// Unique within instances of the assigned type.
    Type,
    /// Unique within the assigned type and its derived types.
    DerivedTypes,
    /// Unique within a single instance.
    Instance,
}

/// How children of a group assignment are instantiated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMode {
    /// Any combination of children may exist.
    #[default]
    AnyOf,
    /// Exactly one child may exist.
    OneOf,
}

/// A property definition: a named, typed value slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub(crate) id: PropertyId,
    #[serde(flatten)]
    pub(crate) element: StructureElement,
    pub(crate) acl: AclId,
    pub(crate) override_acl: bool,
    pub(crate) data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) default_value: Option<Value>,
    pub(crate) system_internal: bool,
    pub(crate) fulltext_indexed: bool,
    pub(crate) unique_mode: UniqueMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) referenced_type: Option<TypeId>,
}

impl Property {
    pub(crate) fn draft(name: &str, data_type: DataType, acl: AclId) -> Self {
        Self {
            id: PropertyId::new(0),
            element: StructureElement::new(name),
            acl,
            override_acl: true,
            data_type,
            default_value: None,
            system_internal: false,
            fulltext_indexed: false,
            unique_mode: UniqueMode::None,
            referenced_type: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> PropertyId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.element.name()
    }

    #[must_use]
    pub const fn element(&self) -> &StructureElement {
        &self.element
    }

    #[must_use]
    pub const fn multiplicity(&self) -> Multiplicity {
        self.element.multiplicity
    }

    #[must_use]
    pub const fn acl(&self) -> AclId {
        self.acl
    }

    #[must_use]
    pub const fn may_override_acl(&self) -> bool {
        self.override_acl
    }

    #[must_use]
    pub const fn may_override_multiplicity(&self) -> bool {
        self.element.override_multiplicity
    }

    #[must_use]
    pub fn may_override_option(&self, key: &str) -> bool {
        self.element.may_override_option(key)
    }

    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    #[must_use]
    pub const fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    #[must_use]
    pub const fn is_system_internal(&self) -> bool {
        self.system_internal
    }

    #[must_use]
    pub const fn is_fulltext_indexed(&self) -> bool {
        self.fulltext_indexed
    }

    #[must_use]
    pub const fn unique_mode(&self) -> UniqueMode {
        self.unique_mode
    }

    /// The type references must point to, if restricted.
    #[must_use]
    pub const fn referenced_type(&self) -> Option<TypeId> {
        self.referenced_type
    }
}

impl OptionSource for Property {
    fn option(&self, key: &str) -> StructureOption {
        self.element.options.get(key)
    }

    fn has_option(&self, key: &str) -> bool {
        self.element.options.has(key)
    }
}

/// A group definition: a named container of assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub(crate) id: GroupId,
    #[serde(flatten)]
    pub(crate) element: StructureElement,
    /// Mode used for new assignments of this group.
    pub(crate) mode: GroupMode,
}

impl Group {
    pub(crate) fn draft(name: &str) -> Self {
        Self {
            id: GroupId::new(0),
            element: StructureElement::new(name),
            mode: GroupMode::AnyOf,
        }
    }

    #[must_use]
    pub const fn id(&self) -> GroupId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.element.name()
    }

    #[must_use]
    pub const fn element(&self) -> &StructureElement {
        &self.element
    }

    #[must_use]
    pub const fn multiplicity(&self) -> Multiplicity {
        self.element.multiplicity
    }

    #[must_use]
    pub const fn may_override_multiplicity(&self) -> bool {
        self.element.override_multiplicity
    }

    #[must_use]
    pub const fn default_mode(&self) -> GroupMode {
        self.mode
    }
}

impl OptionSource for Group {
    fn option(&self, key: &str) -> StructureOption {
        self.element.options.get(key)
    }

    fn has_option(&self, key: &str) -> bool {
        self.element.options.has(key)
    }
}
