use super::{Change, ChangeFlags, validate_name};
use crate::content_type::{ContentType, TypeMode, TypePermissions, TypeRelation, TypeState};
use crate::option::TypeOption;
use structura_types::{AclId, Error, Result, TypeId};

/// Edit session for a [`ContentType`].
#[derive(Debug, Clone)]
pub struct TypeEdit {
    draft: ContentType,
    id: Option<TypeId>,
    changes: ChangeFlags,
}

impl TypeEdit {
    #[must_use]
    pub fn new(name: &str, acl: AclId) -> Self {
        Self {
            draft: ContentType::draft(name, acl),
            id: None,
            changes: ChangeFlags::default(),
        }
    }

    /// A new type derived from `parent`. Mode, ACL and permissions start
    /// out as the parent's.
    #[must_use]
    pub fn derive(parent: &ContentType, name: &str) -> Self {
        let mut draft = ContentType::draft(name, parent.acl);
        draft.parent = Some(parent.id);
        draft.mode = parent.mode;
        draft.permissions = parent.permissions;
        draft.max_rel_source = parent.max_rel_source;
        draft.max_rel_destination = parent.max_rel_destination;
        draft.relations = parent.relations.clone();
        Self {
            draft,
            id: None,
            changes: ChangeFlags::default(),
        }
    }

    #[must_use]
    pub fn from_type(type_: &ContentType) -> Self {
        Self {
            draft: type_.clone(),
            id: Some(type_.id),
            changes: ChangeFlags::default(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> Option<TypeId> {
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
    pub const fn draft(&self) -> &ContentType {
        &self.draft
    }

    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.draft.name = name.trim().to_uppercase();
        self.changes.mark(Change::Name);
        self
    }

    pub fn set_label(&mut self, label: &str) -> &mut Self {
        self.draft.label = label.to_owned();
        self.changes.mark(Change::Label);
        self
    }

    pub fn set_mode(&mut self, mode: TypeMode) -> &mut Self {
        self.draft.mode = mode;
        self.changes.mark(Change::Mode);
        self
    }

    pub fn set_state(&mut self, state: TypeState) -> &mut Self {
        self.draft.state = state;
        self.changes.mark(Change::State);
        self
    }

    pub fn set_acl(&mut self, acl: AclId) -> &mut Self {
        self.draft.acl = acl;
        self.changes.mark(Change::Acl);
        self
    }

    pub fn set_permissions(&mut self, permissions: TypePermissions) -> &mut Self {
        self.draft.permissions = permissions;
        self.changes.mark(Change::Permissions);
        self
    }

    pub fn set_use_property_permissions(&mut self, enabled: bool) -> &mut Self {
        self.draft.permissions.property = enabled;
        self.changes.mark(Change::Permissions);
        self
    }

    pub fn set_max_rel_source(&mut self, max: u32) -> &mut Self {
        self.draft.max_rel_source = max;
        self.changes.mark(Change::Relations);
        self
    }

    pub fn set_max_rel_destination(&mut self, max: u32) -> &mut Self {
        self.draft.max_rel_destination = max;
        self.changes.mark(Change::Relations);
        self
    }

    /// Adds a relation, replacing one with the same source and destination.
    pub fn add_relation(&mut self, relation: TypeRelation) -> &mut Self {
        self.draft
            .relations
            .retain(|r| !(r.source == relation.source && r.destination == relation.destination));
        self.draft.relations.push(relation);
        self.changes.mark(Change::Relations);
        self
    }

    pub fn remove_relation(&mut self, source: TypeId, destination: TypeId) -> &mut Self {
        let before = self.draft.relations.len();
        self.draft
            .relations
            .retain(|r| !(r.source == source && r.destination == destination));
        if before != self.draft.relations.len() {
            self.changes.mark(Change::Relations);
        }
        self
    }

    pub fn set_option(&mut self, key: &str, overridable: bool, passed_on: bool, value: &str) -> Result<&mut Self> {
        let option = TypeOption::new(key, overridable, passed_on, value);
        if option.key().is_empty() {
            return Err(Error::EmptyParameter("key"));
        }
        self.draft.options.retain(|o| o.key() != option.key());
        self.draft.options.push(option);
        self.changes.mark(Change::Options);
        Ok(self)
    }

    pub fn clear_option(&mut self, key: &str) -> &mut Self {
        let key = key.trim().to_uppercase();
        let before = self.draft.options.len();
        self.draft.options.retain(|o| o.key() != key);
        if before != self.draft.options.len() {
            self.changes.mark(Change::Options);
        }
        self
    }

    /// Validates the draft and returns the committed type.
    pub fn commit(self, id: TypeId) -> Result<ContentType> {
        let mut type_ = self.draft;
        type_.name = validate_name("name", &type_.name)?;
        if type_.label.trim().is_empty() {
            type_.label = type_.name.clone();
        }
        if type_.parent == Some(id) {
            return Err(Error::InvalidDerivation(format!("type `{}` cannot derive from itself", type_.name)));
        }
        let has_relation_data =
            !type_.relations.is_empty() || type_.max_rel_source > 0 || type_.max_rel_destination > 0;
        if has_relation_data && !type_.is_relation() {
            return Err(Error::invalid(
                "relations",
                format!("type `{}` is not a relation type", type_.name),
            ));
        }
        type_.id = id;
        Ok(type_)
    }
}

impl From<&ContentType> for TypeEdit {
    fn from(type_: &ContentType) -> Self {
        Self::from_type(type_)
    }
}
