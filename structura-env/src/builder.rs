//! Staging area that produces new [`Environment`] snapshots.
//!
//! Every mutation validates against the staging state and keeps it
//! consistent (child lists included), so lookups on [`staging`] reflect
//! the pending changes. [`build`] runs the snapshot-wide checks and hands
//! out the result.
//!
//! [`staging`]: EnvironmentBuilder::staging
//! [`build`]: EnvironmentBuilder::build

use crate::environment::Environment;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use structura_model::edit::{GroupAssignmentEdit, GroupEdit, PropertyAssignmentEdit, PropertyEdit, TypeEdit};
use structura_model::{Acl, Assignment, AssignmentCore, ChildList, ContentType, StructureElement, TypeOption};
use structura_types::{
    AclId, AssignmentId, Error, GroupId, PropertyId, Result, TypeId, xpath,
};
use tracing::{debug, info, warn};

fn already_committed(kind: &'static str) -> Error {
    Error::invalid(kind, "edit session was opened from an existing value, use the update operation")
}

fn not_committed(kind: &'static str) -> Error {
    Error::invalid(kind, "edit session has no id, use the add operation")
}

fn check_property(env: &Environment, id: PropertyId, name: &str, acl: AclId) -> Result<()> {
    if env.property_by_name(name).is_ok_and(|p| p.id() != id) {
        return Err(Error::DuplicateName {
            kind: "property",
            name: name.to_owned(),
        });
    }
    env.acl(acl)?;
    Ok(())
}

fn check_group(env: &Environment, id: GroupId, name: &str) -> Result<()> {
    if env.group_by_name(name).is_ok_and(|g| g.id() != id) {
        return Err(Error::DuplicateName {
            kind: "group",
            name: name.to_owned(),
        });
    }
    Ok(())
}

fn check_type(env: &Environment, type_: &ContentType) -> Result<()> {
    if env.type_by_name(type_.name()).is_ok_and(|t| t.id() != type_.id()) {
        return Err(Error::DuplicateName {
            kind: "type",
            name: type_.name().to_owned(),
        });
    }
    env.acl(type_.acl())?;
    if let Some(parent) = type_.parent() {
        env.type_(parent)?;
    }
    for relation in type_.relations() {
        env.type_(relation.source)?;
        env.type_(relation.destination)?;
    }
    Ok(())
}

/// Rejects overrides introduced since `before` that `element` forbids.
/// Overrides already stored on the assignment are kept as they are.
fn check_overrides(before: &AssignmentCore, after: &AssignmentCore, element: &StructureElement) -> Result<()> {
    let multiplicity = after.own_multiplicity();
    if multiplicity.is_some() && multiplicity != before.own_multiplicity() && !element.may_override_multiplicity() {
        return Err(Error::override_forbidden("multiplicity", element.name()));
    }
    for option in after.own_options().iter() {
        if before.own_options().find(option.key()) != Some(option) && !element.may_override_option(option.key()) {
            return Err(Error::override_forbidden(format!("option {}", option.key()), element.name()));
        }
    }
    Ok(())
}

/// Mutation side of the environment.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentBuilder {
    env: Environment,
}

impl EnvironmentBuilder {
    /// A builder over an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) const fn from_environment(env: Environment) -> Self {
        Self { env }
    }

    /// The pending state, including every change made so far.
    #[must_use]
    pub const fn staging(&self) -> &Environment {
        &self.env
    }

    /// Runs `commit` with the next free id and claims it on success.
    fn claim<T>(&mut self, commit: impl FnOnce(&Environment, u64) -> Result<T>) -> Result<T> {
        let next = self.env.sequence + 1;
        let value = commit(&self.env, next)?;
        self.env.sequence = next;
        Ok(value)
    }

    /// Runs `change` and restores the staging state when it fails.
    fn atomically<T>(&mut self, change: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let before = self.env.clone();
        let result = change(self);
        if result.is_err() {
            self.env = before;
        }
        result
    }

    // ── ACLs ─────────────────────────────────────────────────────

    pub fn add_acl(&mut self, name: &str) -> Result<AclId> {
        if name.trim().is_empty() {
            return Err(Error::EmptyParameter("name"));
        }
        if self.env.acl_by_name(name).is_ok() {
            return Err(Error::DuplicateName {
                kind: "acl",
                name: name.trim().to_uppercase(),
            });
        }
        let acl = self.claim(|_, id| Ok(Acl::new(AclId::new(id), name)))?;
        let id = acl.id;
        debug!(acl = %acl.name, id = %id, "ACL added");
        self.env.acls.insert(id, acl);
        Ok(id)
    }

    /// The id of the ACL named `name`, registering it when missing.
    pub fn ensure_acl(&mut self, name: &str) -> Result<AclId> {
        match self.env.acl_by_name(name) {
            Ok(acl) => Ok(acl.id),
            Err(_) => self.add_acl(name),
        }
    }

    // ── Properties ───────────────────────────────────────────────

    pub fn add_property(&mut self, edit: PropertyEdit) -> Result<PropertyId> {
        if !edit.is_new() {
            return Err(already_committed("property"));
        }
        let property = self.claim(|env, id| {
            let property = edit.commit(PropertyId::new(id))?;
            check_property(env, property.id(), property.name(), property.acl())?;
            Ok(property)
        })?;
        let id = property.id();
        debug!(property = %property.name(), id = %id, "Property added");
        self.env.properties.insert(id, Arc::new(property));
        Ok(id)
    }

    /// Commits a changed property and points every assignment of it at the
    /// new version.
    pub fn update_property(&mut self, edit: PropertyEdit) -> Result<()> {
        let id = edit.id().ok_or_else(|| not_committed("property"))?;
        self.env.property(id)?;
        let property = edit.commit(id)?;
        check_property(&self.env, id, property.name(), property.acl())?;
        let property = Arc::new(property);
        self.env.properties.insert(id, Arc::clone(&property));
        for assignment in self.env.assignments.values_mut() {
            if let Assignment::Property(pa) = assignment {
                if pa.property().id() == id {
                    *pa = pa.clone().with_property(Arc::clone(&property));
                }
            }
        }
        debug!(property = %property.name(), id = %id, "Property updated");
        Ok(())
    }

    // ── Groups ───────────────────────────────────────────────────

    pub fn add_group(&mut self, edit: GroupEdit) -> Result<GroupId> {
        if !edit.is_new() {
            return Err(already_committed("group"));
        }
        let group = self.claim(|env, id| {
            let group = edit.commit(GroupId::new(id))?;
            check_group(env, group.id(), group.name())?;
            Ok(group)
        })?;
        let id = group.id();
        debug!(group = %group.name(), id = %id, "Group added");
        self.env.groups.insert(id, Arc::new(group));
        Ok(id)
    }

    pub fn update_group(&mut self, edit: GroupEdit) -> Result<()> {
        let id = edit.id().ok_or_else(|| not_committed("group"))?;
        self.env.group(id)?;
        let group = edit.commit(id)?;
        check_group(&self.env, id, group.name())?;
        let group = Arc::new(group);
        self.env.groups.insert(id, Arc::clone(&group));
        for assignment in self.env.assignments.values_mut() {
            if let Assignment::Group(ga) = assignment {
                if ga.group().id() == id {
                    *ga = ga.clone().with_group(Arc::clone(&group));
                }
            }
        }
        debug!(group = %group.name(), id = %id, "Group updated");
        Ok(())
    }

    // ── Types ────────────────────────────────────────────────────

    /// Adds a type. A derived type receives a derived copy of every
    /// assignment of its parent. Nothing is staged when derivation fails.
    pub fn add_type(&mut self, edit: TypeEdit) -> Result<TypeId> {
        if !edit.is_new() {
            return Err(already_committed("type"));
        }
        self.atomically(|b| b.insert_type(edit))
    }

    fn insert_type(&mut self, edit: TypeEdit) -> Result<TypeId> {
        let type_ = self.claim(|env, id| {
            let type_ = edit.commit(TypeId::new(id))?;
            check_type(env, &type_)?;
            Ok(type_)
        })?;
        let id = type_.id();
        let parent = type_.parent();
        info!(type_name = %type_.name(), id = %id, "Type added");
        self.env.types.insert(id, type_);

        if let Some(parent) = parent {
            let bases: Vec<AssignmentId> = self
                .env
                .all_type_assignments(parent)?
                .iter()
                .map(|a| a.id())
                .collect();
            let mut mapped: HashMap<AssignmentId, AssignmentId> = HashMap::new();
            for base in bases {
                let base = self.env.assignment(base)?.clone();
                let derived_parent = match base.parent() {
                    None => None,
                    Some(p) => match mapped.get(&p) {
                        Some(derived) => Some(*derived),
                        None => continue,
                    },
                };
                if let Some(derived) = self.derive_into(&base, id, derived_parent)? {
                    mapped.insert(base.id(), derived);
                }
            }
            self.relink()?;
        }
        Ok(id)
    }

    /// Commits a changed type. The parent of a type cannot change.
    pub fn update_type(&mut self, edit: TypeEdit) -> Result<()> {
        let id = edit.id().ok_or_else(|| not_committed("type"))?;
        let before = self.env.type_(id)?.parent();
        let type_ = edit.commit(id)?;
        if type_.parent() != before {
            return Err(Error::InvalidDerivation(format!(
                "the parent of type `{}` cannot change",
                type_.name()
            )));
        }
        check_type(&self.env, &type_)?;
        debug!(type_name = %type_.name(), id = %id, "Type updated");
        self.env.types.insert(id, type_);
        self.relink()
    }

    // ── Assignments ──────────────────────────────────────────────

    /// Opens an edit session assigning a property to a type below
    /// `parent_xpath` (`/` for the root). The position defaults to the end
    /// of the parent's children.
    pub fn new_property_assignment(
        &self,
        property: PropertyId,
        type_id: TypeId,
        parent_xpath: &str,
        alias: Option<&str>,
    ) -> Result<PropertyAssignmentEdit> {
        let mut edit =
            PropertyAssignmentEdit::new(self.env.property_arc(property)?, self.env.type_(type_id)?, parent_xpath, alias)?;
        edit.set_position(self.sibling_count(type_id, &edit.parent_xpath())?);
        Ok(edit)
    }

    pub fn new_group_assignment(
        &self,
        group: GroupId,
        type_id: TypeId,
        parent_xpath: &str,
        alias: Option<&str>,
    ) -> Result<GroupAssignmentEdit> {
        let mut edit = GroupAssignmentEdit::new(self.env.group_arc(group)?, self.env.type_(type_id)?, parent_xpath, alias)?;
        edit.set_position(self.sibling_count(type_id, &edit.parent_xpath())?);
        Ok(edit)
    }

    /// Number of children below `parent_xpath`; zero when the parent is missing.
    fn sibling_count(&self, type_id: TypeId, parent_xpath: &str) -> Result<i32> {
        let count = if parent_xpath == "/" {
            self.env.type_(type_id)?.children().len()
        } else {
            self.env
                .find_in_type(type_id, parent_xpath)?
                .and_then(Assignment::as_group)
                .map_or(0, |ga| ga.children().len())
        };
        Ok(i32::try_from(count).unwrap_or(i32::MAX))
    }

    /// Adds a property assignment and derives it into every subtype.
    pub fn assign_property(&mut self, edit: PropertyAssignmentEdit) -> Result<AssignmentId> {
        if !edit.is_new() {
            return Err(already_committed("assignment"));
        }
        self.env.property(edit.property().id())?;
        let parent = self.placement(edit.type_id(), &edit.parent_xpath(), edit.xpath())?;
        self.atomically(|b| {
            let assignment = b.claim(|_, id| edit.commit(AssignmentId::new(id), parent))?;
            b.insert_and_propagate(Assignment::Property(assignment))
        })
    }

    /// Adds a group assignment and derives it into every subtype.
    pub fn assign_group(&mut self, edit: GroupAssignmentEdit) -> Result<AssignmentId> {
        if !edit.is_new() {
            return Err(already_committed("assignment"));
        }
        self.env.group(edit.group().id())?;
        let parent = self.placement(edit.type_id(), &edit.parent_xpath(), edit.xpath())?;
        self.atomically(|b| {
            let assignment = b.claim(|_, id| edit.commit(AssignmentId::new(id), parent))?;
            b.insert_and_propagate(Assignment::Group(assignment))
        })
    }

    fn insert_and_propagate(&mut self, assignment: Assignment) -> Result<AssignmentId> {
        let id = assignment.id();
        debug!(xpath = %assignment.xpath(), id = %id, "Assignment added");
        self.env.assignments.insert(id, assignment);
        self.propagate(id)?;
        self.relink()?;
        Ok(id)
    }

    /// Resolves the parent group assignment for a new assignment at `xpath`
    /// and rejects a path that is already taken.
    fn placement(&self, type_id: TypeId, parent_xpath: &str, xpath: &str) -> Result<Option<AssignmentId>> {
        let type_ = self.env.type_(type_id)?;
        if self.env.find_in_type(type_id, xpath)?.is_some() {
            return Err(Error::DuplicateXPath {
                xpath: xpath.to_owned(),
                type_name: type_.name().to_owned(),
            });
        }
        if parent_xpath == "/" {
            return Ok(None);
        }
        let parent = self
            .env
            .find_in_type(type_id, parent_xpath)?
            .ok_or_else(|| Error::not_found("assignment", format!("{}{parent_xpath}", type_.name())))?;
        if !parent.is_group() {
            return Err(Error::NotAGroup(parent.xpath().to_owned()));
        }
        Ok(Some(parent.id()))
    }

    /// Derives `base_id` into every direct subtype of its type, then
    /// recurses with the new derived assignment as the base.
    fn propagate(&mut self, base_id: AssignmentId) -> Result<()> {
        let base = self.env.assignment(base_id)?.clone();
        for subtype in self.env.direct_subtypes(base.type_id()) {
            let parent = match base.parent() {
                None => None,
                Some(base_parent) => match self.derived_in(subtype, base_parent) {
                    Some(derived) => Some(derived),
                    None => continue,
                },
            };
            if let Some(derived) = self.derive_into(&base, subtype, parent)? {
                self.propagate(derived)?;
            }
        }
        Ok(())
    }

    /// The assignment of `type_id` whose base is `base`.
    fn derived_in(&self, type_id: TypeId, base: AssignmentId) -> Option<AssignmentId> {
        self.env
            .assignments
            .values()
            .find(|a| a.type_id() == type_id && a.base() == base && a.id() != base)
            .map(Assignment::id)
    }

    /// Creates a derived copy of `base` in `type_id` below `parent`.
    /// `Ok(None)` when the subtype already has something at that path.
    fn derive_into(&mut self, base: &Assignment, type_id: TypeId, parent: Option<AssignmentId>) -> Result<Option<AssignmentId>> {
        let type_ = self.env.type_(type_id)?.clone();
        let parent_xpath = match parent {
            Some(p) => self.env.assignment(p)?.core().relative_xpath(),
            None => "/".to_owned(),
        };
        let target = xpath::build_xpath(false, &[type_.name(), &parent_xpath, base.alias()]);
        if self.env.find_in_type(type_id, &target)?.is_some() {
            warn!(xpath = %target, base = %base.id(), "Derived assignment skipped, path already taken");
            return Ok(None);
        }
        let derived = match base {
            Assignment::Property(pa) => {
                let edit = PropertyAssignmentEdit::derive(pa, &type_, None, &parent_xpath)?;
                Assignment::Property(self.claim(|_, id| edit.commit(AssignmentId::new(id), parent))?)
            }
            Assignment::Group(ga) => {
                let edit = GroupAssignmentEdit::derive(ga, &type_, None, &parent_xpath)?;
                Assignment::Group(self.claim(|_, id| edit.commit(AssignmentId::new(id), parent))?)
            }
        };
        let id = derived.id();
        self.env.assignments.insert(id, derived);
        Ok(Some(id))
    }

    /// Commits a changed property assignment against the current version
    /// of its property.
    pub fn update_property_assignment(&mut self, edit: PropertyAssignmentEdit) -> Result<()> {
        let id = edit.id().ok_or_else(|| not_committed("assignment"))?;
        let current = self.env.property_assignment(id)?;
        let property = self.env.property_arc(current.property().id())?;
        let updated = edit.commit(id, current.core().parent())?.with_property(property);
        check_overrides(current.core(), updated.core(), updated.property().element())?;
        if updated.own_acl().is_some_and(|acl| current.own_acl() != Some(acl)) && !updated.property().may_override_acl() {
            return Err(Error::override_forbidden("acl", updated.property().name()));
        }
        self.replace_assignment(Assignment::Property(updated))
    }

    /// Commits a changed group assignment against the current version of
    /// its group. Renaming it moves every descendant to the new path.
    pub fn update_group_assignment(&mut self, edit: GroupAssignmentEdit) -> Result<()> {
        let id = edit.id().ok_or_else(|| not_committed("assignment"))?;
        let current = self.env.group_assignment(id)?;
        let group = self.env.group_arc(current.group().id())?;
        let updated = edit.commit(id, current.core().parent())?.with_group(group);
        check_overrides(current.core(), updated.core(), updated.group().element())?;
        self.replace_assignment(Assignment::Group(updated))
    }

    fn replace_assignment(&mut self, updated: Assignment) -> Result<()> {
        let id = updated.id();
        let old_xpath = self.env.assignment(id)?.xpath().to_owned();
        let new_xpath = updated.xpath().to_owned();
        if old_xpath != new_xpath {
            if let Some(taken) = self.env.find_in_type(updated.type_id(), &new_xpath)? {
                if taken.id() != id {
                    return Err(Error::DuplicateXPath {
                        xpath: new_xpath,
                        type_name: self.env.type_(updated.type_id())?.name().to_owned(),
                    });
                }
            }
            let moved: Vec<AssignmentId> = match updated.as_group() {
                Some(_) => self.env.all_child_assignments(id)?.iter().map(|a| a.id()).collect(),
                None => Vec::new(),
            };
            for child in moved {
                if let Some(a) = self.env.assignments.remove(&child) {
                    let xpath = format!("{new_xpath}{}", &a.xpath()[old_xpath.len()..]);
                    let parent = a.parent();
                    self.env.assignments.insert(child, a.relocated(parent, xpath));
                }
            }
        }
        debug!(xpath = %new_xpath, id = %id, "Assignment updated");
        self.env.assignments.insert(id, updated);
        self.relink()
    }

    /// Removes an assignment with its descendants and every assignment
    /// derived from any of them. Returns the removed ids.
    pub fn remove_assignment(&mut self, id: AssignmentId) -> Result<Vec<AssignmentId>> {
        self.env.assignment(id)?;
        let mut removed: Vec<AssignmentId> = Vec::new();
        let mut seen: HashSet<AssignmentId> = HashSet::new();
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if !seen.insert(next) {
                continue;
            }
            removed.push(next);
            pending.extend(
                self.env
                    .assignments
                    .values()
                    .filter(|a| a.id() != next && (a.parent() == Some(next) || a.base() == next))
                    .map(Assignment::id),
            );
        }
        for r in &removed {
            self.env.assignments.remove(r);
        }
        info!(id = %id, removed = removed.len(), "Assignment removed");
        self.relink()?;
        Ok(removed)
    }

    // ── Build ────────────────────────────────────────────────────

    /// Rebuilds every child list from the assignments' parent links.
    fn relink(&mut self) -> Result<()> {
        let mut type_children: BTreeMap<TypeId, ChildList> = BTreeMap::new();
        let mut group_children: BTreeMap<AssignmentId, ChildList> = BTreeMap::new();
        for a in self.env.assignments.values() {
            match a.parent() {
                None => {
                    type_children.entry(a.type_id()).or_default().insert_sorted(a.child_ref());
                }
                Some(parent) => {
                    let owner = self.env.assignment(parent)?;
                    if !owner.is_group() {
                        return Err(Error::NotAGroup(owner.xpath().to_owned()));
                    }
                    group_children.entry(parent).or_default().insert_sorted(a.child_ref());
                }
            }
        }
        let types = std::mem::take(&mut self.env.types);
        self.env.types = types
            .into_iter()
            .map(|(id, t)| {
                let children = type_children.remove(&id).unwrap_or_default();
                (id, t.with_children(children))
            })
            .collect();
        let assignments = std::mem::take(&mut self.env.assignments);
        self.env.assignments = assignments
            .into_iter()
            .map(|(id, a)| match a {
                Assignment::Group(ga) => {
                    let children = group_children.remove(&id).unwrap_or_default();
                    (id, Assignment::Group(ga.with_children(children)))
                }
                property => (id, property),
            })
            .collect();
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let mut seen: HashSet<(TypeId, String)> = HashSet::new();
        for a in self.env.assignments.values() {
            let type_ = self.env.type_(a.type_id())?;
            if !seen.insert((a.type_id(), a.xpath().to_owned())) {
                return Err(Error::DuplicateXPath {
                    xpath: a.xpath().to_owned(),
                    type_name: type_.name().to_owned(),
                });
            }
            if a.base() != a.id() {
                self.env.assignment(a.base())?;
            }
            if let Some(pa) = a.as_property() {
                self.env.property(pa.property().id())?;
                self.env.acl(pa.acl())?;
            }
            if let Some(ga) = a.as_group() {
                self.env.group(ga.group().id())?;
            }
        }
        for t in self.env.types.values() {
            if let Some(parent) = t.parent() {
                self.env.type_(parent)?;
            }
            if self.env.has_parent_cycle(t.id()) {
                return Err(Error::InvalidDerivation(format!("type `{}` derives from itself", t.name())));
            }
        }
        Ok(())
    }

    /// Types ordered parents first.
    fn types_by_depth(&self) -> Vec<TypeId> {
        let depth = |mut id: TypeId| {
            let mut d = 0usize;
            while let Some(parent) = self.env.types.get(&id).and_then(ContentType::parent) {
                d += 1;
                id = parent;
                if d > self.env.types.len() {
                    break;
                }
            }
            d
        };
        let mut ids: Vec<TypeId> = self.env.types.keys().copied().collect();
        ids.sort_by_key(|id| (depth(*id), *id));
        ids
    }

    /// Validates the staging area and produces the next snapshot.
    pub fn build(mut self) -> Result<Environment> {
        self.relink()?;
        self.validate()?;

        for id in self.types_by_depth() {
            let derived = self.env.direct_subtypes(id);
            let parent_options: Option<Vec<TypeOption>> = self
                .env
                .types
                .get(&id)
                .and_then(ContentType::parent)
                .and_then(|p| self.env.types.get(&p))
                .map(|p| p.options().to_vec());
            if let Some(t) = self.env.types.remove(&id) {
                let t = t.with_derived(derived);
                let t = match parent_options {
                    Some(options) => t.inheriting_options(&options),
                    None => t,
                };
                self.env.types.insert(id, t);
            }
        }

        self.env.version += 1;
        info!(
            version = self.env.version,
            types = self.env.types.len(),
            assignments = self.env.assignments.len(),
            "Environment built"
        );
        Ok(self.env)
    }
}

impl Environment {
    /// Whether the parent chain of `type_id` loops back to it.
    fn has_parent_cycle(&self, type_id: TypeId) -> bool {
        let mut current = self.types.get(&type_id).and_then(ContentType::parent);
        let mut hops = 0;
        while let Some(id) = current {
            if id == type_id {
                return true;
            }
            hops += 1;
            if hops > self.types.len() {
                return true;
            }
            current = self.types.get(&id).and_then(ContentType::parent);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_only_advances_on_success() {
        let mut b = EnvironmentBuilder::new();
        let failed: Result<()> = b.claim(|_, _| Err(Error::EmptyParameter("x")));
        assert!(failed.is_err());
        assert_eq!(b.claim(|_, id| Ok(id)).unwrap(), 1);
        assert_eq!(b.claim(|_, id| Ok(id)).unwrap(), 2);
    }

    #[test]
    fn atomically_restores_on_failure() {
        let mut b = EnvironmentBuilder::new();
        let failed: Result<()> = b.atomically(|b| {
            b.add_acl("editors")?;
            Err(Error::EmptyParameter("x"))
        });
        assert!(failed.is_err());
        assert!(b.staging().acl_by_name("editors").is_err());
        assert_eq!(b.add_acl("editors").unwrap(), AclId::new(1));
    }
}
