use super::{Change, ChangeFlags, validate_name};
use crate::assignment::{AssignmentCore, ChildList, GroupAssignment, PropertyAssignment};
use crate::content_type::ContentType;
use crate::element::{Group, GroupMode, Property, StructureElement};
use serde_json::Value;
use std::sync::Arc;
use structura_types::{AclId, AssignmentId, Error, Multiplicity, Result, xpath};
use tracing::debug;

/// `TYPE/PARENT/ALIAS` for an assignment below `parent_xpath`.
fn assignment_xpath(type_name: &str, parent_xpath: &str, alias: &str) -> Result<String> {
    let parent = xpath::to_xpath_no_mult_str(&xpath::strip_type(parent_xpath))?;
    Ok(xpath::build_xpath(false, &[type_name, &parent, alias]))
}

/// Parent path of an assignment XPath, without the type: `/A` for `T/A/B`.
fn parent_of(xpath: &str) -> String {
    let relative = xpath::strip_type(xpath);
    match relative.rfind('/') {
        Some(0) | None => "/".to_owned(),
        Some(cut) => relative[..cut].to_owned(),
    }
}

/// Rules and setters shared by both assignment kinds.
#[derive(Debug, Clone)]
struct CoreEdit {
    core: AssignmentCore,
    id: Option<AssignmentId>,
    base: Option<AssignmentId>,
    changes: ChangeFlags,
}

impl CoreEdit {
    fn new(type_: &ContentType, parent_xpath: &str, alias: &str) -> Result<Self> {
        let alias = validate_name("alias", alias)?;
        let xpath = assignment_xpath(type_.name(), parent_xpath, &alias)?;
        let mut core = AssignmentCore::draft(type_.id(), xpath, alias);
        // nested assignments start at 0, the type only knows its root children
        if parent_of(&core.xpath) == "/" {
            core.position = i32::try_from(type_.children().len()).unwrap_or(i32::MAX);
        }
        Ok(Self {
            core,
            id: None,
            base: None,
            changes: ChangeFlags::default(),
        })
    }

    fn existing(core: &AssignmentCore) -> Self {
        Self {
            core: core.clone(),
            id: Some(core.id),
            base: Some(core.base),
            changes: ChangeFlags::default(),
        }
    }

    /// A new assignment in `type_` copying the overrides of `base`.
    fn derived(base: &AssignmentCore, type_: &ContentType, alias: Option<&str>, parent_xpath: &str) -> Result<Self> {
        let mut edit = Self::new(type_, parent_xpath, alias.unwrap_or(base.alias()))?;
        let core = &mut edit.core;
        core.enabled = base.enabled;
        core.position = base.position;
        core.multiplicity = base.multiplicity;
        core.default_multiplicity = base.default_multiplicity;
        core.label = base.label.clone();
        core.hint = base.hint.clone();
        core.options = base.options.clone();
        core.system_internal = base.system_internal;
        edit.base = Some(base.id);
        Ok(edit)
    }

    fn effective_multiplicity(&self, element: &StructureElement) -> Multiplicity {
        match self.core.multiplicity {
            Some(own) if element.may_override_multiplicity() => own,
            _ => element.multiplicity(),
        }
    }

    fn set_alias(&mut self, alias: &str) -> Result<()> {
        let alias = validate_name("alias", alias)?;
        let cut = self.core.xpath.rfind('/').map_or(0, |slash| slash + 1);
        self.core.xpath.truncate(cut);
        self.core.xpath.push_str(&alias);
        self.core.alias = alias;
        self.changes.mark(Change::Alias);
        Ok(())
    }

    fn set_multiplicity(&mut self, element: &StructureElement, multiplicity: Multiplicity) -> Result<()> {
        if !element.may_override_multiplicity() {
            return Err(Error::override_forbidden("multiplicity", element.name()));
        }
        self.core.multiplicity = Some(multiplicity);
        self.core.default_multiplicity = self.core.default_multiplicity.clamp(multiplicity.min(), multiplicity.max());
        self.changes.mark(Change::Multiplicity);
        Ok(())
    }

    fn set_default_multiplicity(&mut self, element: &StructureElement, value: u32) {
        let bounds = self.effective_multiplicity(element);
        self.core.default_multiplicity = value.clamp(bounds.min(), bounds.max());
        self.changes.mark(Change::DefaultMultiplicity);
    }

    fn set_option(&mut self, element: &StructureElement, key: &str, overridable: bool, value: &str) -> Result<()> {
        if !element.may_override_option(key) {
            return Err(Error::override_forbidden(
                format!("option {}", key.trim().to_uppercase()),
                element.name(),
            ));
        }
        self.core.options.set(key, overridable, value)?;
        self.changes.mark(Change::Options);
        Ok(())
    }

    fn clear_option(&mut self, key: &str) {
        if self.core.options.clear(key) {
            self.changes.mark(Change::Options);
        }
    }

    fn finish(mut self, element: &StructureElement, id: AssignmentId, parent: Option<AssignmentId>) -> AssignmentCore {
        let bounds = self.effective_multiplicity(element);
        self.core.default_multiplicity = self.core.default_multiplicity.clamp(bounds.min(), bounds.max());
        self.core.id = id;
        self.core.base = self.base.unwrap_or(id);
        self.core.parent = parent;
        self.core
    }
}

macro_rules! core_setters {
    () => {
        #[must_use]
        pub const fn id(&self) -> Option<AssignmentId> {
            self.edit.id
        }

        #[must_use]
        pub const fn is_new(&self) -> bool {
            self.edit.id.is_none()
        }

        /// The assignment this one derives from, if any.
        #[must_use]
        pub const fn base(&self) -> Option<AssignmentId> {
            self.edit.base
        }

        #[must_use]
        pub const fn changes(&self) -> &ChangeFlags {
            &self.edit.changes
        }

        #[must_use]
        pub fn alias(&self) -> &str {
            self.edit.core.alias()
        }

        #[must_use]
        pub fn xpath(&self) -> &str {
            self.edit.core.xpath()
        }

        /// XPath of the parent group assignment without type, `/` at the root.
        #[must_use]
        pub fn parent_xpath(&self) -> String {
            parent_of(self.edit.core.xpath())
        }

        #[must_use]
        pub const fn type_id(&self) -> structura_types::TypeId {
            self.edit.core.type_id()
        }

        /// Changes the alias and the last step of the XPath.
        pub fn set_alias(&mut self, alias: &str) -> Result<&mut Self> {
            self.edit.set_alias(alias)?;
            Ok(self)
        }

        pub fn set_enabled(&mut self, enabled: bool) -> &mut Self {
            self.edit.core.enabled = enabled;
            self.edit.changes.mark(Change::Enabled);
            self
        }

        pub fn set_position(&mut self, position: i32) -> &mut Self {
            self.edit.core.position = position.max(0);
            self.edit.changes.mark(Change::Position);
            self
        }

        pub fn set_label(&mut self, label: Option<&str>) -> &mut Self {
            self.edit.core.label = label.map(str::to_owned);
            self.edit.changes.mark(Change::Label);
            self
        }

        pub fn set_hint(&mut self, hint: Option<&str>) -> &mut Self {
            self.edit.core.hint = hint.map(str::to_owned);
            self.edit.changes.mark(Change::Hint);
            self
        }

        pub fn set_system_internal(&mut self, system_internal: bool) -> &mut Self {
            self.edit.core.system_internal = system_internal;
            self.edit.changes.mark(Change::SystemInternal);
            self
        }

        /// Overrides the element's multiplicity, if the element permits it.
        pub fn set_multiplicity(&mut self, multiplicity: Multiplicity) -> Result<&mut Self> {
            let element = self.element().clone();
            self.edit.set_multiplicity(&element, multiplicity)?;
            Ok(self)
        }

        /// Falls back to the element's multiplicity.
        pub fn clear_multiplicity(&mut self) -> &mut Self {
            self.edit.core.multiplicity = None;
            self.edit.changes.mark(Change::Multiplicity);
            self
        }

        /// Sets the default instance count, clamped into the effective
        /// multiplicity.
        pub fn set_default_multiplicity(&mut self, value: u32) -> &mut Self {
            let element = self.element().clone();
            self.edit.set_default_multiplicity(&element, value);
            self
        }

        #[must_use]
        pub fn default_multiplicity(&self) -> u32 {
            self.edit.core.default_multiplicity()
        }

        #[must_use]
        pub fn multiplicity(&self) -> Multiplicity {
            self.edit.effective_multiplicity(self.element())
        }

        /// Sets an option on the assignment. Fails if the element sets the
        /// same key as not overridable.
        pub fn set_option(&mut self, key: &str, overridable: bool, value: &str) -> Result<&mut Self> {
            let element = self.element().clone();
            self.edit.set_option(&element, key, overridable, value)?;
            Ok(self)
        }

        pub fn set_option_bool(&mut self, key: &str, overridable: bool, value: bool) -> Result<&mut Self> {
            let value = if value { crate::option::VALUE_TRUE } else { crate::option::VALUE_FALSE };
            self.set_option(key, overridable, value)
        }

        pub fn clear_option(&mut self, key: &str) -> &mut Self {
            self.edit.clear_option(key);
            self
        }
    };
}

/// Edit session for a [`PropertyAssignment`].
#[derive(Debug, Clone)]
pub struct PropertyAssignmentEdit {
    edit: CoreEdit,
    property: Arc<Property>,
    acl: Option<AclId>,
    default_value: Option<Value>,
}

impl PropertyAssignmentEdit {
    /// Assigns `property` to `type_` below `parent_xpath` (`/` for the root).
    /// The alias defaults to the property name.
    pub fn new(property: Arc<Property>, type_: &ContentType, parent_xpath: &str, alias: Option<&str>) -> Result<Self> {
        let alias = alias.unwrap_or(property.name()).to_owned();
        let mut edit = CoreEdit::new(type_, parent_xpath, &alias)?;
        edit.core.default_multiplicity = property.multiplicity().min().max(1).min(property.multiplicity().max());
        Ok(Self {
            edit,
            property,
            acl: None,
            default_value: None,
        })
    }

    #[must_use]
    pub fn from_assignment(assignment: &PropertyAssignment) -> Self {
        Self {
            edit: CoreEdit::existing(&assignment.core),
            property: Arc::clone(&assignment.property),
            acl: assignment.acl,
            default_value: assignment.default_value.clone(),
        }
    }

    /// Reuses `base` in `type_`: a new assignment whose base is `base`,
    /// carrying the same overrides.
    pub fn derive(base: &PropertyAssignment, type_: &ContentType, alias: Option<&str>, parent_xpath: &str) -> Result<Self> {
        debug!(base = %base.core.id, type_name = %type_.name(), "deriving property assignment");
        Ok(Self {
            edit: CoreEdit::derived(&base.core, type_, alias, parent_xpath)?,
            property: Arc::clone(&base.property),
            acl: base.acl,
            default_value: base.default_value.clone(),
        })
    }

    core_setters!();

    fn element(&self) -> &StructureElement {
        self.property.element()
    }

    #[must_use]
    pub fn property(&self) -> &Property {
        &self.property
    }

    /// Overrides the property's ACL, if the property permits it.
    pub fn set_acl(&mut self, acl: AclId) -> Result<&mut Self> {
        if !self.property.may_override_acl() {
            return Err(Error::override_forbidden("acl", self.property.name()));
        }
        self.acl = Some(acl);
        self.edit.changes.mark(Change::Acl);
        Ok(self)
    }

    pub fn set_default_value(&mut self, value: Option<Value>) -> &mut Self {
        self.default_value = value;
        self.edit.changes.mark(Change::DefaultValue);
        self
    }

    /// Validates the draft and returns the committed assignment.
    pub fn commit(self, id: AssignmentId, parent: Option<AssignmentId>) -> Result<PropertyAssignment> {
        let core = self.edit.finish(self.property.element(), id, parent);
        Ok(PropertyAssignment {
            core,
            property: self.property,
            acl: self.acl,
            default_value: self.default_value,
        })
    }
}

impl From<&PropertyAssignment> for PropertyAssignmentEdit {
    fn from(assignment: &PropertyAssignment) -> Self {
        Self::from_assignment(assignment)
    }
}

/// Edit session for a [`GroupAssignment`].
#[derive(Debug, Clone)]
pub struct GroupAssignmentEdit {
    edit: CoreEdit,
    group: Arc<Group>,
    mode: GroupMode,
    children: ChildList,
}

impl GroupAssignmentEdit {
    /// Assigns `group` to `type_` below `parent_xpath`, using the group's
    /// default mode.
    pub fn new(group: Arc<Group>, type_: &ContentType, parent_xpath: &str, alias: Option<&str>) -> Result<Self> {
        let alias = alias.unwrap_or(group.name()).to_owned();
        let mut edit = CoreEdit::new(type_, parent_xpath, &alias)?;
        edit.core.default_multiplicity = group.multiplicity().min().max(1).min(group.multiplicity().max());
        Ok(Self {
            edit,
            mode: group.default_mode(),
            group,
            children: ChildList::new(),
        })
    }

    #[must_use]
    pub fn from_assignment(assignment: &GroupAssignment) -> Self {
        Self {
            edit: CoreEdit::existing(&assignment.core),
            group: Arc::clone(&assignment.group),
            mode: assignment.mode,
            children: assignment.children.clone(),
        }
    }

    /// Reuses `base` in `type_`. Children are derived separately.
    pub fn derive(base: &GroupAssignment, type_: &ContentType, alias: Option<&str>, parent_xpath: &str) -> Result<Self> {
        debug!(base = %base.core.id, type_name = %type_.name(), "deriving group assignment");
        Ok(Self {
            edit: CoreEdit::derived(&base.core, type_, alias, parent_xpath)?,
            group: Arc::clone(&base.group),
            mode: base.mode,
            children: ChildList::new(),
        })
    }

    core_setters!();

    fn element(&self) -> &StructureElement {
        self.group.element()
    }

    #[must_use]
    pub fn group(&self) -> &Group {
        &self.group
    }

    #[must_use]
    pub const fn mode(&self) -> GroupMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: GroupMode) -> &mut Self {
        self.mode = mode;
        self.edit.changes.mark(Change::Mode);
        self
    }

    pub fn commit(self, id: AssignmentId, parent: Option<AssignmentId>) -> Result<GroupAssignment> {
        let core = self.edit.finish(self.group.element(), id, parent);
        Ok(GroupAssignment {
            core,
            group: self.group,
            mode: self.mode,
            children: self.children,
        })
    }
}

impl From<&GroupAssignment> for GroupAssignmentEdit {
    fn from(assignment: &GroupAssignment) -> Self {
        Self::from_assignment(assignment)
    }
}
