//! Assignments bind properties and groups into a type's tree.
//!
//! An assignment may override attributes of its element. Effective values
//! resolve against the element: an override counts only when the element
//! permits it.

use crate::element::{Group, GroupMode, Property};
use crate::option::{self, OptionList, OptionSource, StructureOption};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use structura_types::{AclId, AssignmentId, Multiplicity, TypeId, xpath};

/// Whether a child entry is a property or a group assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildKind {
    Property,
    Group,
}

/// Reference to a child assignment, ordered by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChildRef {
    pub id: AssignmentId,
    pub position: i32,
    pub kind: ChildKind,
}

/// Children of a group assignment (or of a type's root), ordered by position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChildList(Vec<ChildRef>);

impl ChildList {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Inserts before the first entry whose position is `>=` the new one.
    /// Returns `false` (and changes nothing) if the id is already listed.
    pub fn insert_sorted(&mut self, child: ChildRef) -> bool {
        if self.contains(child.id) {
            return false;
        }
        let at = self
            .0
            .iter()
            .position(|c| c.position >= child.position)
            .unwrap_or(self.0.len());
        self.0.insert(at, child);
        true
    }

    pub fn remove(&mut self, id: AssignmentId) -> bool {
        let before = self.0.len();
        self.0.retain(|c| c.id != id);
        before != self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn contains(&self, id: AssignmentId) -> bool {
        self.0.iter().any(|c| c.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChildRef> {
        self.0.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = AssignmentId> + '_ {
        self.0.iter().map(|c| c.id)
    }

    /// Property children, in position order.
    pub fn properties(&self) -> impl Iterator<Item = AssignmentId> + '_ {
        self.of_kind(ChildKind::Property)
    }

    /// Group children, in position order.
    pub fn groups(&self) -> impl Iterator<Item = AssignmentId> + '_ {
        self.of_kind(ChildKind::Group)
    }

    fn of_kind(&self, kind: ChildKind) -> impl Iterator<Item = AssignmentId> + '_ {
        self.0.iter().filter(move |c| c.kind == kind).map(|c| c.id)
    }
}

/// Attributes common to property and group assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentCore {
    pub(crate) id: AssignmentId,
    pub(crate) enabled: bool,
    pub(crate) type_id: TypeId,
    pub(crate) alias: String,
    /// `TYPE/A/B`, without indices.
    pub(crate) xpath: String,
    pub(crate) position: i32,
    /// `None` uses the element's multiplicity.
    pub(crate) multiplicity: Option<Multiplicity>,
    pub(crate) default_multiplicity: u32,
    /// `None` for assignments at the type root.
    pub(crate) parent: Option<AssignmentId>,
    /// Equal to `id` unless derived.
    pub(crate) base: AssignmentId,
    pub(crate) label: Option<String>,
    pub(crate) hint: Option<String>,
    pub(crate) options: OptionList,
    pub(crate) system_internal: bool,
}

impl AssignmentCore {
    pub(crate) fn draft(type_id: TypeId, xpath: String, alias: String) -> Self {
        Self {
            id: AssignmentId::new(0),
            enabled: true,
            type_id,
            alias,
            xpath,
            position: 0,
            multiplicity: None,
            default_multiplicity: 1,
            parent: None,
            base: AssignmentId::new(0),
            label: None,
            hint: None,
            options: OptionList::new(),
            system_internal: false,
        }
    }

    #[must_use]
    pub const fn id(&self) -> AssignmentId {
        self.id
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The XPath including the type name, e.g. `DOCUMENT/TEASER/TITLE`.
    #[must_use]
    pub fn xpath(&self) -> &str {
        &self.xpath
    }

    /// The XPath without the type name, e.g. `/TEASER/TITLE`.
    #[must_use]
    pub fn relative_xpath(&self) -> String {
        xpath::strip_type(&self.xpath)
    }

    #[must_use]
    pub const fn position(&self) -> i32 {
        self.position
    }

    /// The multiplicity set on the assignment itself, ignoring the element.
    #[must_use]
    pub const fn own_multiplicity(&self) -> Option<Multiplicity> {
        self.multiplicity
    }

    #[must_use]
    pub const fn default_multiplicity(&self) -> u32 {
        self.default_multiplicity
    }

    #[must_use]
    pub const fn parent(&self) -> Option<AssignmentId> {
        self.parent
    }

    #[must_use]
    pub const fn base(&self) -> AssignmentId {
        self.base
    }

    /// Whether this assignment was derived from another one.
    #[must_use]
    pub fn is_derived(&self) -> bool {
        self.base != self.id
    }

    #[must_use]
    pub fn own_label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    #[must_use]
    pub fn own_hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Options set on the assignment itself.
    #[must_use]
    pub const fn own_options(&self) -> &OptionList {
        &self.options
    }

    #[must_use]
    pub const fn is_system_internal(&self) -> bool {
        self.system_internal
    }

    fn effective_multiplicity(&self, element: Multiplicity, may_override: bool) -> Multiplicity {
        match self.multiplicity {
            Some(own) if may_override => own,
            _ => element,
        }
    }
}

/// A property bound into a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyAssignment {
    pub(crate) core: AssignmentCore,
    pub(crate) property: Arc<Property>,
    /// `None` uses the property's ACL.
    pub(crate) acl: Option<AclId>,
    pub(crate) default_value: Option<Value>,
}

impl PropertyAssignment {
    #[must_use]
    pub const fn core(&self) -> &AssignmentCore {
        &self.core
    }

    #[must_use]
    pub fn property(&self) -> &Property {
        &self.property
    }

    /// The same assignment pointing at a newer version of its property.
    #[must_use]
    pub fn with_property(mut self, property: Arc<Property>) -> Self {
        self.property = property;
        self
    }

    /// The effective multiplicity.
    #[must_use]
    pub fn multiplicity(&self) -> Multiplicity {
        self.core
            .effective_multiplicity(self.property.multiplicity(), self.property.may_override_multiplicity())
    }

    /// The effective ACL: the assignment's own one if the property permits it.
    #[must_use]
    pub fn acl(&self) -> AclId {
        match self.acl {
            Some(own) if self.property.may_override_acl() => own,
            _ => self.property.acl(),
        }
    }

    #[must_use]
    pub const fn own_acl(&self) -> Option<AclId> {
        self.acl
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.core.own_label().unwrap_or_else(|| self.property.element().label())
    }

    #[must_use]
    pub fn hint(&self) -> &str {
        self.core.own_hint().unwrap_or_else(|| self.property.element().hint())
    }

    #[must_use]
    pub const fn has_assignment_default_value(&self) -> bool {
        self.default_value.is_some()
    }

    /// The assignment's default value, else the property's.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref().or_else(|| self.property.default_value())
    }

    /// Input length limit for new values: the `MAXLENGTH` option, capped
    /// by the data type's own limit.
    #[must_use]
    pub fn max_input_length(&self) -> Option<u32> {
        let type_limit = self.property.data_type().max_length();
        if !self.has_max_length() {
            return type_limit;
        }
        let configured = u32::try_from(self.max_length().max(0)).unwrap_or(u32::MAX);
        Some(type_limit.map_or(configured, |limit| configured.min(limit)))
    }
}

impl OptionSource for PropertyAssignment {
    fn option(&self, key: &str) -> StructureOption {
        option::resolve(self.property.element().options(), &self.core.options, key)
    }

    fn has_option(&self, key: &str) -> bool {
        self.property.has_option(key) || self.core.options.has(key)
    }
}

/// A group bound into a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAssignment {
    pub(crate) core: AssignmentCore,
    pub(crate) group: Arc<Group>,
    pub(crate) mode: GroupMode,
    pub(crate) children: ChildList,
}

impl GroupAssignment {
    #[must_use]
    pub const fn core(&self) -> &AssignmentCore {
        &self.core
    }

    #[must_use]
    pub fn group(&self) -> &Group {
        &self.group
    }

    /// The same assignment pointing at a newer version of its group.
    #[must_use]
    pub fn with_group(mut self, group: Arc<Group>) -> Self {
        self.group = group;
        self
    }

    #[must_use]
    pub fn multiplicity(&self) -> Multiplicity {
        self.core
            .effective_multiplicity(self.group.multiplicity(), self.group.may_override_multiplicity())
    }

    #[must_use]
    pub const fn mode(&self) -> GroupMode {
        self.mode
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.core.own_label().unwrap_or_else(|| self.group.element().label())
    }

    #[must_use]
    pub fn hint(&self) -> &str {
        self.core.own_hint().unwrap_or_else(|| self.group.element().hint())
    }

    /// Direct children, ordered by position.
    #[must_use]
    pub const fn children(&self) -> &ChildList {
        &self.children
    }

    #[must_use]
    pub fn with_children(mut self, children: ChildList) -> Self {
        self.children = children;
        self
    }
}

impl OptionSource for GroupAssignment {
    fn option(&self, key: &str) -> StructureOption {
        option::resolve(self.group.element().options(), &self.core.options, key)
    }

    fn has_option(&self, key: &str) -> bool {
        self.group.has_option(key) || self.core.options.has(key)
    }
}

/// Either kind of assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assignment {
    Property(PropertyAssignment),
    Group(GroupAssignment),
}

impl Assignment {
    #[must_use]
    pub const fn core(&self) -> &AssignmentCore {
        match self {
            Self::Property(pa) => &pa.core,
            Self::Group(ga) => &ga.core,
        }
    }

    pub(crate) fn core_mut(&mut self) -> &mut AssignmentCore {
        match self {
            Self::Property(pa) => &mut pa.core,
            Self::Group(ga) => &mut ga.core,
        }
    }

    #[must_use]
    pub const fn id(&self) -> AssignmentId {
        self.core().id
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        self.core().alias()
    }

    #[must_use]
    pub fn xpath(&self) -> &str {
        self.core().xpath()
    }

    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.core().type_id
    }

    #[must_use]
    pub const fn position(&self) -> i32 {
        self.core().position
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.core().enabled
    }

    #[must_use]
    pub const fn parent(&self) -> Option<AssignmentId> {
        self.core().parent
    }

    #[must_use]
    pub const fn base(&self) -> AssignmentId {
        self.core().base
    }

    #[must_use]
    pub fn is_derived(&self) -> bool {
        self.core().is_derived()
    }

    #[must_use]
    pub const fn default_multiplicity(&self) -> u32 {
        self.core().default_multiplicity
    }

    #[must_use]
    pub fn multiplicity(&self) -> Multiplicity {
        match self {
            Self::Property(pa) => pa.multiplicity(),
            Self::Group(ga) => ga.multiplicity(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Property(pa) => pa.label(),
            Self::Group(ga) => ga.label(),
        }
    }

    #[must_use]
    pub fn hint(&self) -> &str {
        match self {
            Self::Property(pa) => pa.hint(),
            Self::Group(ga) => ga.hint(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ChildKind {
        match self {
            Self::Property(_) => ChildKind::Property,
            Self::Group(_) => ChildKind::Group,
        }
    }

    #[must_use]
    pub const fn child_ref(&self) -> ChildRef {
        ChildRef {
            id: self.id(),
            position: self.position(),
            kind: self.kind(),
        }
    }

    #[must_use]
    pub const fn as_property(&self) -> Option<&PropertyAssignment> {
        match self {
            Self::Property(pa) => Some(pa),
            Self::Group(_) => None,
        }
    }

    #[must_use]
    pub const fn as_group(&self) -> Option<&GroupAssignment> {
        match self {
            Self::Group(ga) => Some(ga),
            Self::Property(_) => None,
        }
    }

    /// The same assignment moved below `parent` at `xpath`.
    #[must_use]
    pub fn relocated(mut self, parent: Option<AssignmentId>, xpath: String) -> Self {
        let core = self.core_mut();
        core.parent = parent;
        core.xpath = xpath;
        self
    }

    #[must_use]
    pub const fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }
}

impl OptionSource for Assignment {
    fn option(&self, key: &str) -> StructureOption {
        match self {
            Self::Property(pa) => pa.option(key),
            Self::Group(ga) => ga.option(key),
        }
    }

    fn has_option(&self, key: &str) -> bool {
        match self {
            Self::Property(pa) => pa.has_option(key),
            Self::Group(ga) => ga.has_option(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(id: u64, position: i32) -> ChildRef {
        ChildRef {
            id: AssignmentId::new(id),
            position,
            kind: ChildKind::Property,
        }
    }

    #[test]
    fn insert_sorted_orders_by_position() {
        let mut list = ChildList::new();
        list.insert_sorted(child(1, 10));
        list.insert_sorted(child(2, 0));
        list.insert_sorted(child(3, 5));
        let ids: Vec<u64> = list.ids().map(|id| id.get()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn equal_positions_insert_before_existing() {
        let mut list = ChildList::new();
        list.insert_sorted(child(1, 3));
        list.insert_sorted(child(2, 3));
        let ids: Vec<u64> = list.ids().map(|id| id.get()).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn duplicate_insert_is_noop() {
        let mut list = ChildList::new();
        assert!(list.insert_sorted(child(1, 3)));
        assert!(!list.insert_sorted(child(1, 0)));
        assert_eq!(list.len(), 1);
        assert_eq!(list.iter().next().unwrap().position, 3);
    }
}
