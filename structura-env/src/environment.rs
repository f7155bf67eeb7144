//! The immutable structure snapshot.

use crate::builder::EnvironmentBuilder;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use structura_model::{
    Acl, Assignment, ContentType, DataType, Group, GroupAssignment, Property, PropertyAssignment,
};
use structura_types::{
    AclId, AssignmentId, Error, GroupId, PropertyId, Result, TypeId, xpath,
};

/// A consistent view of every ACL, element, type and assignment.
///
/// Snapshots are never mutated once built. Changes go through
/// [`Environment::to_builder`] and produce a new snapshot with a higher
/// [`version`](Environment::version).
#[derive(Debug, Clone, Default, Serialize)]
pub struct Environment {
    pub(crate) version: u64,
    /// Last id handed out; ids are unique across all kinds.
    pub(crate) sequence: u64,
    pub(crate) acls: BTreeMap<AclId, Acl>,
    pub(crate) properties: BTreeMap<PropertyId, Arc<Property>>,
    pub(crate) groups: BTreeMap<GroupId, Arc<Group>>,
    pub(crate) types: BTreeMap<TypeId, ContentType>,
    pub(crate) assignments: BTreeMap<AssignmentId, Assignment>,
}

impl Environment {
    /// An empty snapshot at version 0.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Opens a staging area holding a copy of this snapshot.
    #[must_use]
    pub fn to_builder(&self) -> EnvironmentBuilder {
        EnvironmentBuilder::from_environment(self.clone())
    }

    // ── ACLs ─────────────────────────────────────────────────────

    pub fn acl(&self, id: AclId) -> Result<&Acl> {
        self.acls.get(&id).ok_or_else(|| Error::not_found("acl", id))
    }

    pub fn acl_by_name(&self, name: &str) -> Result<&Acl> {
        let name = name.trim().to_uppercase();
        self.acls
            .values()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::not_found("acl", name))
    }

    pub fn acls(&self) -> impl Iterator<Item = &Acl> {
        self.acls.values()
    }

    // ── Properties and groups ────────────────────────────────────

    pub fn property(&self, id: PropertyId) -> Result<&Property> {
        self.properties
            .get(&id)
            .map(AsRef::as_ref)
            .ok_or_else(|| Error::not_found("property", id))
    }

    /// The shared handle of a property, as needed to assign it.
    pub fn property_arc(&self, id: PropertyId) -> Result<Arc<Property>> {
        self.properties
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("property", id))
    }

    pub fn property_by_name(&self, name: &str) -> Result<&Property> {
        let name = name.trim().to_uppercase();
        self.properties
            .values()
            .find(|p| p.name() == name)
            .map(AsRef::as_ref)
            .ok_or_else(|| Error::not_found("property", name))
    }

    #[must_use]
    pub fn property_exists(&self, name: &str) -> bool {
        self.property_by_name(name).is_ok()
    }

    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values().map(AsRef::as_ref)
    }

    pub fn group(&self, id: GroupId) -> Result<&Group> {
        self.groups
            .get(&id)
            .map(AsRef::as_ref)
            .ok_or_else(|| Error::not_found("group", id))
    }

    pub fn group_arc(&self, id: GroupId) -> Result<Arc<Group>> {
        self.groups
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("group", id))
    }

    pub fn group_by_name(&self, name: &str) -> Result<&Group> {
        let name = name.trim().to_uppercase();
        self.groups
            .values()
            .find(|g| g.name() == name)
            .map(AsRef::as_ref)
            .ok_or_else(|| Error::not_found("group", name))
    }

    #[must_use]
    pub fn group_exists(&self, name: &str) -> bool {
        self.group_by_name(name).is_ok()
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values().map(AsRef::as_ref)
    }

    // ── Types ────────────────────────────────────────────────────

    pub fn type_(&self, id: TypeId) -> Result<&ContentType> {
        self.types.get(&id).ok_or_else(|| Error::not_found("type", id))
    }

    pub fn type_by_name(&self, name: &str) -> Result<&ContentType> {
        let name = name.trim().to_uppercase();
        self.types
            .values()
            .find(|t| t.name() == name)
            .ok_or_else(|| Error::not_found("type", name))
    }

    #[must_use]
    pub fn type_exists(&self, name: &str) -> bool {
        self.type_by_name(name).is_ok()
    }

    pub fn types(&self) -> impl Iterator<Item = &ContentType> {
        self.types.values()
    }

    /// Whether `type_id` is `ancestor` or derives from it. Every type
    /// derives from [`TypeId::ROOT`].
    #[must_use]
    pub fn is_derived_from(&self, type_id: TypeId, ancestor: TypeId) -> bool {
        if ancestor == TypeId::ROOT {
            return true;
        }
        let mut current = Some(type_id);
        let mut hops = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            hops += 1;
            if hops > self.types.len() {
                break;
            }
            current = self.types.get(&id).and_then(ContentType::parent);
        }
        false
    }

    /// Types derived from `type_id`: direct children only, or the whole
    /// subtree when `transitive` is set.
    pub fn derived_types(&self, type_id: TypeId, transitive: bool, include_self: bool) -> Result<Vec<&ContentType>> {
        let root = self.type_(type_id)?;
        let mut out = Vec::new();
        if include_self {
            out.push(root);
        }
        let mut pending: Vec<TypeId> = self.direct_subtypes(type_id);
        while let Some(id) = pending.pop() {
            let t = self.type_(id)?;
            out.push(t);
            if transitive {
                pending.extend(self.direct_subtypes(id));
            }
        }
        Ok(out)
    }

    pub(crate) fn direct_subtypes(&self, type_id: TypeId) -> Vec<TypeId> {
        self.types
            .values()
            .filter(|t| t.parent() == Some(type_id))
            .map(ContentType::id)
            .collect()
    }

    // ── Assignments ──────────────────────────────────────────────

    pub fn assignment(&self, id: AssignmentId) -> Result<&Assignment> {
        self.assignments
            .get(&id)
            .ok_or_else(|| Error::not_found("assignment", id))
    }

    pub fn property_assignment(&self, id: AssignmentId) -> Result<&PropertyAssignment> {
        let a = self.assignment(id)?;
        a.as_property().ok_or_else(|| Error::NotAProperty(a.xpath().to_owned()))
    }

    pub fn group_assignment(&self, id: AssignmentId) -> Result<&GroupAssignment> {
        let a = self.assignment(id)?;
        a.as_group().ok_or_else(|| Error::NotAGroup(a.xpath().to_owned()))
    }

    /// Resolves `TYPE/A/B` (case-insensitive, indices ignored).
    pub fn assignment_by_xpath(&self, xpath: &str) -> Result<&Assignment> {
        let type_name = xpath::type_name(xpath).ok_or_else(|| Error::InvalidXPath { xpath: xpath.to_owned() })?;
        let type_ = self.type_by_name(&type_name)?;
        self.find_in_type(type_.id(), xpath)?
            .ok_or_else(|| Error::not_found("assignment", xpath::to_xpath_no_mult_str(xpath).unwrap_or_else(|_| xpath.to_owned())))
    }

    /// Looks up the assignment at `xpath` (with or without type prefix)
    /// inside `type_id`. `Ok(None)` when nothing is assigned there.
    pub(crate) fn find_in_type(&self, type_id: TypeId, xpath: &str) -> Result<Option<&Assignment>> {
        let relative = xpath::to_xpath_no_mult_str(&xpath::strip_type(xpath))?;
        if relative == "/" {
            return Ok(None);
        }
        Ok(self
            .assignments
            .values()
            .find(|a| a.type_id() == type_id && a.core().relative_xpath() == relative))
    }

    #[must_use]
    pub fn assignment_exists(&self, xpath: &str) -> bool {
        self.assignment_by_xpath(xpath).is_ok()
    }

    /// All property assignments, optionally including disabled ones.
    #[must_use]
    pub fn property_assignments(&self, include_disabled: bool) -> Vec<&PropertyAssignment> {
        self.assignments
            .values()
            .filter(|a| include_disabled || a.is_enabled())
            .filter_map(Assignment::as_property)
            .collect()
    }

    #[must_use]
    pub fn group_assignments(&self, include_disabled: bool) -> Vec<&GroupAssignment> {
        self.assignments
            .values()
            .filter(|a| include_disabled || a.is_enabled())
            .filter_map(Assignment::as_group)
            .collect()
    }

    /// Assignments whose base is `id`.
    #[must_use]
    pub fn derived_assignments(&self, id: AssignmentId) -> Vec<&Assignment> {
        self.assignments
            .values()
            .filter(|a| a.base() == id && a.id() != id)
            .collect()
    }

    #[must_use]
    pub fn assignments_for_property(&self, property: PropertyId) -> Vec<&PropertyAssignment> {
        self.assignments
            .values()
            .filter_map(Assignment::as_property)
            .filter(|pa| pa.property().id() == property)
            .collect()
    }

    /// Types with at least one assignment of `property`.
    #[must_use]
    pub fn types_for_property(&self, property: PropertyId) -> Vec<&ContentType> {
        let mut ids: Vec<TypeId> = self
            .assignments_for_property(property)
            .iter()
            .map(|pa| pa.core().type_id())
            .collect();
        ids.sort();
        ids.dedup();
        ids.iter().filter_map(|id| self.types.get(id)).collect()
    }

    /// Direct children of a group assignment, in position order.
    pub fn child_assignments(&self, group: AssignmentId) -> Result<Vec<&Assignment>> {
        let ga = self.group_assignment(group)?;
        ga.children().ids().map(|id| self.assignment(id)).collect()
    }

    /// Every descendant of a group assignment, pre-order.
    pub fn all_child_assignments(&self, group: AssignmentId) -> Result<Vec<&Assignment>> {
        let mut out = Vec::new();
        self.collect_descendants(self.group_assignment(group)?.children().ids(), &mut out)?;
        Ok(out)
    }

    /// Root-level assignments of a type, in position order.
    pub fn type_assignments(&self, type_id: TypeId) -> Result<Vec<&Assignment>> {
        self.type_(type_id)?
            .children()
            .ids()
            .map(|id| self.assignment(id))
            .collect()
    }

    /// Every assignment of a type, pre-order.
    pub fn all_type_assignments(&self, type_id: TypeId) -> Result<Vec<&Assignment>> {
        let mut out = Vec::new();
        self.collect_descendants(self.type_(type_id)?.children().ids(), &mut out)?;
        Ok(out)
    }

    fn collect_descendants<'a>(
        &'a self,
        ids: impl Iterator<Item = AssignmentId>,
        out: &mut Vec<&'a Assignment>,
    ) -> Result<()> {
        for id in ids {
            let a = self.assignment(id)?;
            out.push(a);
            if let Some(ga) = a.as_group() {
                self.collect_descendants(ga.children().ids(), out)?;
            }
        }
        Ok(())
    }

    /// Children of the group assignment at `parent_xpath` within a type,
    /// or the type's root assignments for `/`.
    pub fn connected_assignments(&self, type_id: TypeId, parent_xpath: &str) -> Result<Vec<&Assignment>> {
        match self.find_in_type(type_id, parent_xpath)? {
            None if xpath::to_xpath_no_mult_str(&xpath::strip_type(parent_xpath))? == "/" => {
                self.type_assignments(type_id)
            }
            None => Err(Error::not_found("assignment", parent_xpath)),
            Some(a) => self.child_assignments(a.id()),
        }
    }

    /// Checks that every step of `xpath` names an enabled assignment of the
    /// type, every index is within `1..=max`, and that the last step is a
    /// property (`check_property`) or a group.
    #[must_use]
    pub fn is_xpath_valid(&self, type_id: TypeId, xpath: &str, check_property: bool) -> bool {
        let Ok(type_) = self.type_(type_id) else {
            return false;
        };
        if xpath::type_name(xpath).is_some_and(|name| name != type_.name()) {
            return false;
        }
        let Ok(steps) = xpath::split(xpath) else {
            return false;
        };
        if steps.is_empty() {
            return !check_property;
        }
        let mut siblings: Vec<AssignmentId> = type_.children().ids().collect();
        let mut last: Option<&Assignment> = None;
        for step in &steps {
            let found = siblings
                .iter()
                .filter_map(|id| self.assignments.get(id))
                .find(|a| a.alias() == step.alias());
            let Some(a) = found else {
                return false;
            };
            if !a.is_enabled() || !a.multiplicity().is_valid_max(step.index()) {
                return false;
            }
            siblings = a.as_group().map(|ga| ga.children().ids().collect()).unwrap_or_default();
            last = Some(a);
        }
        last.is_some_and(|a| a.is_group() != check_property)
    }

    /// Enabled property assignments of `data_type` in a type that are
    /// required, along with every enclosing group.
    pub fn mandatory_assignments(&self, type_id: TypeId, data_type: DataType) -> Result<Vec<&PropertyAssignment>> {
        let mut out = Vec::new();
        for a in self.all_type_assignments(type_id)? {
            let Some(pa) = a.as_property() else { continue };
            if !pa.core().is_enabled() || pa.property().data_type() != data_type || !pa.multiplicity().is_required() {
                continue;
            }
            if self.parents_required(pa.core().parent())? {
                out.push(pa);
            }
        }
        Ok(out)
    }

    fn parents_required(&self, mut parent: Option<AssignmentId>) -> Result<bool> {
        while let Some(id) = parent {
            let ga = self.group_assignment(id)?;
            if !ga.multiplicity().is_required() {
                return Ok(false);
            }
            parent = ga.core().parent();
        }
        Ok(true)
    }
}
