use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use structura_types::AclId;

/// An access control list referenced by properties and types.
///
/// Only identity matters to the structure layer. Evaluating who may do what
/// under an ACL is delegated to a [`PermissionChecker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    pub id: AclId,
    pub name: String,
    #[serde(default)]
    pub label: String,
}

impl Acl {
    pub fn new(id: AclId, name: &str) -> Self {
        Self {
            id,
            name: name.trim().to_uppercase(),
            label: String::new(),
        }
    }
}

/// Decides whether the acting principal may create data guarded by an ACL.
///
/// Used when instantiating content for types that use property permissions:
/// property assignments whose effective ACL fails the check are skipped.
///
/// Most callers do NOT need a custom implementation; [`AllowAll`] is the
/// default for system contexts, [`AclGrants`] covers a fixed grant set.
pub trait PermissionChecker: Send + Sync {
    /// Whether the principal may create instances guarded by `acl`.
    fn may_create(&self, acl: AclId) -> bool;
}

/// Grants everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionChecker for AllowAll {
    fn may_create(&self, _acl: AclId) -> bool {
        true
    }
}

/// A fixed set of ACLs the principal may create under.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AclGrants {
    create: HashSet<AclId>,
}

impl AclGrants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant_create(&mut self, acl: AclId) {
        self.create.insert(acl);
    }

    pub fn revoke_create(&mut self, acl: AclId) {
        self.create.remove(&acl);
    }

    pub fn granted(&self) -> &HashSet<AclId> {
        &self.create
    }
}

impl FromIterator<AclId> for AclGrants {
    fn from_iter<I: IntoIterator<Item = AclId>>(iter: I) -> Self {
        Self {
            create: iter.into_iter().collect(),
        }
    }
}

impl PermissionChecker for AclGrants {
    fn may_create(&self, acl: AclId) -> bool {
        self.create.contains(&acl)
    }
}
