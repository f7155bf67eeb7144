//! Creation of empty and random content data from a type's structure.

use crate::environment::Environment;
use rand::Rng;
use rand::seq::SliceRandom;
use structura_model::{
    Assignment, Data, DataNode, GroupAssignment, GroupData, GroupMode, PermissionChecker,
    PropertyAssignment, PropertyData,
};
use structura_types::{AssignmentId, Error, Result, TypeId};
use tracing::{debug, warn};

/// Upper bound for generated text values.
pub const RANDOM_TEXT_LENGTH: u32 = 128;

/// Shared state of one instantiation run.
struct Instantiation<'a> {
    env: &'a Environment,
    checker: &'a dyn PermissionChecker,
    /// Whether property ACLs are checked (the type uses property permissions).
    check_acl: bool,
}

impl<'a> Instantiation<'a> {
    fn new(env: &'a Environment, type_id: TypeId, checker: &'a dyn PermissionChecker) -> Result<Self> {
        Ok(Self {
            env,
            checker,
            check_acl: env.type_(type_id)?.use_property_permissions(),
        })
    }

    /// Whether `a` takes part in instantiation at all.
    fn admits(&self, a: &Assignment) -> bool {
        if !a.is_enabled() {
            return false;
        }
        match a.as_property() {
            Some(pa) if self.check_acl => self.checker.may_create(pa.acl()),
            _ => true,
        }
    }

    fn children(&self, ids: impl Iterator<Item = AssignmentId>) -> Result<Vec<&'a Assignment>> {
        let mut out = Vec::new();
        for id in ids {
            let a = self.env.assignment(id)?;
            if self.admits(a) {
                out.push(a);
            }
        }
        Ok(out)
    }

    fn create(&self, a: &Assignment, parent: &GroupData, index: u32, position: i32) -> Result<Data> {
        let node = data_node(a, parent, index, position)?;
        match a {
            Assignment::Property(pa) => Ok(Data::Property(property_data(pa, node))),
            Assignment::Group(ga) => {
                let mut group = GroupData::new(node);
                for child in self.empty_group_children(ga, &group)? {
                    group.add_child(child);
                }
                Ok(Data::Group(group))
            }
        }
    }

    /// Children of a new group instance, following the group mode.
    fn empty_group_children(&self, ga: &GroupAssignment, group: &GroupData) -> Result<Vec<Data>> {
        let mut out = Vec::new();
        let mut required_seen = false;
        for child in self.children(ga.children().ids())? {
            let multiplicity = child.multiplicity();
            let count = match ga.mode() {
                GroupMode::OneOf if multiplicity.is_required() => {
                    if required_seen {
                        return Err(Error::OneOfMultiple {
                            xpath: group.node.xpath_full.clone(),
                        });
                    }
                    required_seen = true;
                    multiplicity.min()
                }
                GroupMode::OneOf => 0,
                GroupMode::AnyOf if multiplicity.is_required() => multiplicity.min(),
                GroupMode::AnyOf => 1,
            };
            for index in 1..=count {
                out.push(self.create(child, group, index, child.position())?);
            }
        }
        Ok(out)
    }

    fn random<R: Rng + ?Sized>(
        &self,
        a: &Assignment,
        parent: &GroupData,
        index: u32,
        position: i32,
        fill: &mut RandomFill<'_, R>,
    ) -> Result<Data> {
        let node = data_node(a, parent, index, position)?;
        match a {
            Assignment::Property(pa) => {
                let mut data = property_data(pa, node);
                let max_len = pa.max_input_length().unwrap_or(RANDOM_TEXT_LENGTH).min(RANDOM_TEXT_LENGTH);
                data.value = Some(pa.property().data_type().random_value(&mut *fill.rng, max_len));
                data.contains_default_value = false;
                Ok(Data::Property(data))
            }
            Assignment::Group(ga) => {
                let mut group = GroupData::new(node);
                let children = self.children(ga.children().ids())?;
                let candidates: Vec<&Assignment> = match ga.mode() {
                    GroupMode::AnyOf => children.into_iter().filter(|c| takes_random_data(c)).collect(),
                    GroupMode::OneOf => {
                        let mut required = children.iter().filter(|c| c.multiplicity().is_required());
                        match (required.next(), required.next()) {
                            (Some(_), Some(_)) => {
                                return Err(Error::OneOfMultiple {
                                    xpath: group.node.xpath_full.clone(),
                                });
                            }
                            (Some(only), None) => Some(*only).filter(|c| takes_random_data(c)).into_iter().collect(),
                            (None, _) => {
                                let eligible: Vec<&Assignment> =
                                    children.iter().copied().filter(|c| takes_random_data(c)).collect();
                                eligible.choose(&mut *fill.rng).copied().into_iter().collect()
                            }
                        }
                    }
                };
                for child in candidates {
                    let count = child.multiplicity().random_range(&mut *fill.rng, fill.max_multiplicity);
                    for index in 1..=count {
                        let data = self.random(child, &group, index, child.position(), fill)?;
                        group.add_child(data);
                    }
                }
                Ok(Data::Group(group))
            }
        }
    }
}

struct RandomFill<'r, R: Rng + ?Sized> {
    rng: &'r mut R,
    max_multiplicity: u32,
}

/// System-internal assignments and binary or reference properties get no
/// random data.
fn takes_random_data(a: &Assignment) -> bool {
    if a.core().is_system_internal() {
        return false;
    }
    a.as_property()
        .is_none_or(|pa| pa.property().data_type().supports_random())
}

/// Placement of instance `index` of `a` below `parent`. Fails when the
/// index is outside `1..=max`.
fn data_node(a: &Assignment, parent: &GroupData, index: u32, position: i32) -> Result<DataNode> {
    let multiplicity = a.multiplicity();
    let (xpath, xpath_full) = parent.child_paths(a.alias(), index);
    if !multiplicity.is_valid_max(index) {
        return Err(Error::IndexOutOfRange {
            index,
            multiplicity: multiplicity.to_string(),
            xpath: xpath_full,
        });
    }
    Ok(DataNode {
        alias: a.alias().to_owned(),
        index,
        xpath,
        xpath_full,
        assignment: a.id(),
        multiplicity,
        position,
        system_internal: a.core().is_system_internal(),
    })
}

fn property_data(pa: &PropertyAssignment, node: DataNode) -> PropertyData {
    let mut data = PropertyData {
        node,
        property: pa.property().id(),
        data_type: pa.property().data_type(),
        value: pa.default_value().cloned(),
        contains_default_value: false,
        max_input_length: pa.max_input_length(),
    };
    data.contains_default_value = !data.is_empty();
    data
}

/// Assigns each `(assignment, instance count)` its first position.
/// Instances of one assignment take consecutive positions, and the next
/// assignment starts after them.
fn spread_positions<'a>(planned: impl IntoIterator<Item = (&'a Assignment, u32)>) -> Vec<(&'a Assignment, u32, i32)> {
    let mut next_free = 0i32;
    planned
        .into_iter()
        .map(|(a, n)| {
            let begin = a.position().max(next_free);
            next_free = begin.saturating_add(i32::try_from(n).unwrap_or(i32::MAX));
            (a, n, begin)
        })
        .collect()
}

fn offset(begin: i32, c: u32) -> i32 {
    begin.saturating_add(i32::try_from(c).unwrap_or(i32::MAX))
}

impl Environment {
    /// Builds the empty data tree for a new instance of `type_id`.
    ///
    /// Every enabled root assignment gets its default number of instances.
    /// Group instances are filled according to their mode. When the type
    /// uses property permissions, properties `checker` denies are left out.
    pub fn create_empty_data(&self, type_id: TypeId, checker: &dyn PermissionChecker) -> Result<GroupData> {
        self.empty_root(type_id, checker)
            .inspect_err(|e| warn!(type_id = %type_id, "Empty data creation failed: {}", e))
    }

    fn empty_root(&self, type_id: TypeId, checker: &dyn PermissionChecker) -> Result<GroupData> {
        let run = Instantiation::new(self, type_id, checker)?;
        let type_ = self.type_(type_id)?;
        let mut root = GroupData::virtual_root(type_.name());
        let children = run.children(type_.children().ids())?;
        let planned = children.into_iter().map(|a| (a, a.default_multiplicity()));
        for (a, count, begin) in spread_positions(planned) {
            for c in 0..count {
                let data = run.create(a, &root, c + 1, offset(begin, c))?;
                root.add_child(data);
            }
        }
        debug!(type_id = %type_id, children = root.children.len(), "Empty data created");
        Ok(root)
    }

    /// Creates instance `index` of one assignment below `parent`, filled the
    /// same way as [`create_empty_data`](Self::create_empty_data).
    pub fn create_data(
        &self,
        assignment: AssignmentId,
        parent: &GroupData,
        index: u32,
        checker: &dyn PermissionChecker,
    ) -> Result<Data> {
        let a = self.assignment(assignment)?;
        let run = Instantiation::new(self, a.type_id(), checker)?;
        run.create(a, parent, index, a.position())
            .inspect_err(|e| warn!(assignment = %assignment, index, "Data creation failed: {}", e))
    }

    /// Builds a data tree with random instance counts and values.
    ///
    /// Unlimited multiplicities are capped at `max_multiplicity`. Disabled
    /// and system-internal assignments, binary and reference properties,
    /// and properties `checker` denies are skipped. A `OneOf` group gets its
    /// required child, or one randomly chosen child when none is required.
    pub fn create_random_data<R: Rng + ?Sized>(
        &self,
        type_id: TypeId,
        rng: &mut R,
        max_multiplicity: u32,
        checker: &dyn PermissionChecker,
    ) -> Result<GroupData> {
        let run = Instantiation::new(self, type_id, checker)?;
        let type_ = self.type_(type_id)?;
        let mut fill = RandomFill { rng, max_multiplicity };
        let mut root = GroupData::virtual_root(type_.name());
        let mut planned = Vec::new();
        for a in run.children(type_.children().ids())? {
            if takes_random_data(a) {
                planned.push((a, a.multiplicity().random_range(&mut *fill.rng, max_multiplicity)));
            }
        }
        for (a, count, begin) in spread_positions(planned) {
            for c in 0..count {
                let data = run
                    .random(a, &root, c + 1, offset(begin, c), &mut fill)
                    .inspect_err(|e| warn!(type_id = %type_id, "Random data creation failed: {}", e))?;
                root.add_child(data);
            }
        }
        Ok(root)
    }
}
