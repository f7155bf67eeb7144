use super::{Change, ChangeFlags, validate_name};
use crate::data_type::DataType;
use crate::element::{Group, GroupMode, Property, UniqueMode};
use serde_json::Value;
use structura_types::{AclId, Error, GroupId, Multiplicity, PropertyId, Result, TypeId};

/// Edit session for a [`Property`].
#[derive(Debug, Clone)]
pub struct PropertyEdit {
    draft: Property,
    id: Option<PropertyId>,
    changes: ChangeFlags,
}

impl PropertyEdit {
    /// Starts a new property. The name is validated on commit.
    #[must_use]
    pub fn new(name: &str, data_type: DataType, acl: AclId) -> Self {
        Self {
            draft: Property::draft(name, data_type, acl),
            id: None,
            changes: ChangeFlags::default(),
        }
    }

    #[must_use]
    pub fn from_property(property: &Property) -> Self {
        Self {
            draft: property.clone(),
            id: Some(property.id),
            changes: ChangeFlags::default(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> Option<PropertyId> {
        self.id
    }

    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.id.is_none()
    }

    #[must_use]
    pub const fn changes(&self) -> &ChangeFlags {
        &self.changes
    }

    #[must_use]
    pub const fn draft(&self) -> &Property {
        &self.draft
    }

    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.draft.element.name = name.trim().to_uppercase();
        self.changes.mark(Change::Name);
        self
    }

    pub fn set_label(&mut self, label: &str) -> &mut Self {
        self.draft.element.label = label.to_owned();
        self.changes.mark(Change::Label);
        self
    }

    pub fn set_hint(&mut self, hint: &str) -> &mut Self {
        self.draft.element.hint = hint.to_owned();
        self.changes.mark(Change::Hint);
        self
    }

    pub fn set_multiplicity(&mut self, multiplicity: Multiplicity) -> &mut Self {
        self.draft.element.multiplicity = multiplicity;
        self.changes.mark(Change::Multiplicity);
        self
    }

    pub fn set_override_multiplicity(&mut self, may_override: bool) -> &mut Self {
        self.draft.element.override_multiplicity = may_override;
        self.changes.mark(Change::OverrideMultiplicity);
        self
    }

    pub fn set_option(&mut self, key: &str, overridable: bool, value: &str) -> Result<&mut Self> {
        self.draft.element.options.set(key, overridable, value)?;
        self.changes.mark(Change::Options);
        Ok(self)
    }

    pub fn set_option_bool(&mut self, key: &str, overridable: bool, value: bool) -> Result<&mut Self> {
        self.draft.element.options.set_bool(key, overridable, value)?;
        self.changes.mark(Change::Options);
        Ok(self)
    }

    pub fn clear_option(&mut self, key: &str) -> &mut Self {
        if self.draft.element.options.clear(key) {
            self.changes.mark(Change::Options);
        }
        self
    }

    pub fn set_acl(&mut self, acl: AclId) -> &mut Self {
        self.draft.acl = acl;
        self.changes.mark(Change::Acl);
        self
    }

    pub fn set_override_acl(&mut self, may_override: bool) -> &mut Self {
        self.draft.override_acl = may_override;
        self.changes.mark(Change::OverrideAcl);
        self
    }

    pub fn set_data_type(&mut self, data_type: DataType) -> &mut Self {
        self.draft.data_type = data_type;
        self.changes.mark(Change::DataType);
        self
    }

    pub fn set_default_value(&mut self, value: Option<Value>) -> &mut Self {
        self.draft.default_value = value;
        self.changes.mark(Change::DefaultValue);
        self
    }

    pub fn set_system_internal(&mut self, system_internal: bool) -> &mut Self {
        self.draft.system_internal = system_internal;
        self.changes.mark(Change::SystemInternal);
        self
    }

    pub fn set_fulltext_indexed(&mut self, indexed: bool) -> &mut Self {
        self.draft.fulltext_indexed = indexed;
        self.changes.mark(Change::FulltextIndexed);
        self
    }

    pub fn set_unique_mode(&mut self, mode: UniqueMode) -> &mut Self {
        self.draft.unique_mode = mode;
        self.changes.mark(Change::UniqueMode);
        self
    }

    pub fn set_referenced_type(&mut self, referenced: Option<TypeId>) -> &mut Self {
        self.draft.referenced_type = referenced;
        self.changes.mark(Change::ReferencedType);
        self
    }

    /// Validates the draft and returns the committed property.
    pub fn commit(self, id: PropertyId) -> Result<Property> {
        let mut property = self.draft;
        property.element.name = validate_name("name", &property.element.name)?;
        if property.element.label.trim().is_empty() {
            property.element.label = property.element.name.clone();
        }
        if property.referenced_type.is_some() && property.data_type != DataType::Reference {
            return Err(Error::invalid(
                "referenced_type",
                format!("property `{}` is not a reference", property.element.name),
            ));
        }
        property.id = id;
        Ok(property)
    }
}

impl From<&Property> for PropertyEdit {
    fn from(property: &Property) -> Self {
        Self::from_property(property)
    }
}

/// Edit session for a [`Group`].
#[derive(Debug, Clone)]
pub struct GroupEdit {
    draft: Group,
    id: Option<GroupId>,
    changes: ChangeFlags,
}

impl GroupEdit {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            draft: Group::draft(name),
            id: None,
            changes: ChangeFlags::default(),
        }
    }

    #[must_use]
    pub fn from_group(group: &Group) -> Self {
        Self {
            draft: group.clone(),
            id: Some(group.id),
            changes: ChangeFlags::default(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> Option<GroupId> {
        self.id
    }

    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.id.is_none()
    }

    #[must_use]
    pub const fn changes(&self) -> &ChangeFlags {
        &self.changes
    }

    #[must_use]
    pub const fn draft(&self) -> &Group {
        &self.draft
    }

    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.draft.element.name = name.trim().to_uppercase();
        self.changes.mark(Change::Name);
        self
    }

    pub fn set_label(&mut self, label: &str) -> &mut Self {
        self.draft.element.label = label.to_owned();
        self.changes.mark(Change::Label);
        self
    }

    pub fn set_hint(&mut self, hint: &str) -> &mut Self {
        self.draft.element.hint = hint.to_owned();
        self.changes.mark(Change::Hint);
        self
    }

    pub fn set_multiplicity(&mut self, multiplicity: Multiplicity) -> &mut Self {
        self.draft.element.multiplicity = multiplicity;
        self.changes.mark(Change::Multiplicity);
        self
    }

    pub fn set_override_multiplicity(&mut self, may_override: bool) -> &mut Self {
        self.draft.element.override_multiplicity = may_override;
        self.changes.mark(Change::OverrideMultiplicity);
        self
    }

    pub fn set_option(&mut self, key: &str, overridable: bool, value: &str) -> Result<&mut Self> {
        self.draft.element.options.set(key, overridable, value)?;
        self.changes.mark(Change::Options);
        Ok(self)
    }

    pub fn clear_option(&mut self, key: &str) -> &mut Self {
        if self.draft.element.options.clear(key) {
            self.changes.mark(Change::Options);
        }
        self
    }

    pub fn set_mode(&mut self, mode: GroupMode) -> &mut Self {
        self.draft.mode = mode;
        self.changes.mark(Change::Mode);
        self
    }

    pub fn commit(self, id: GroupId) -> Result<Group> {
        let mut group = self.draft;
        group.element.name = validate_name("name", &group.element.name)?;
        if group.element.label.trim().is_empty() {
            group.element.label = group.element.name.clone();
        }
        group.id = id;
        Ok(group)
    }
}

impl From<&Group> for GroupEdit {
    fn from(group: &Group) -> Self {
        Self::from_group(group)
    }
}
