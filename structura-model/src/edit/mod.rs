//! Edit sessions.
//!
//! Committed definitions are immutable. To change one, open an edit session
//! from it (or start a new one), mutate the draft and `commit`. Commit
//! validates the draft and returns the new immutable value; the session
//! records which attributes changed.

mod assignment;
mod element;
mod content_type;

pub use assignment::{GroupAssignmentEdit, PropertyAssignmentEdit};
pub use content_type::TypeEdit;
pub use element::{GroupEdit, PropertyEdit};

use std::collections::BTreeSet;
use structura_types::{Error, Result, xpath};

/// An attribute touched during an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Change {
    Name,
    Label,
    Hint,
    Multiplicity,
    OverrideMultiplicity,
    Options,
    Acl,
    OverrideAcl,
    DataType,
    DefaultValue,
    SystemInternal,
    FulltextIndexed,
    UniqueMode,
    ReferencedType,
    Alias,
    Enabled,
    Position,
    DefaultMultiplicity,
    Mode,
    State,
    Permissions,
    Relations,
}

/// The set of attributes an edit session changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeFlags(BTreeSet<Change>);

impl ChangeFlags {
    pub(crate) fn mark(&mut self, change: Change) {
        self.0.insert(change);
    }

    #[must_use]
    pub fn contains(&self, change: Change) -> bool {
        self.0.contains(&change)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Change> + '_ {
        self.0.iter().copied()
    }
}

/// Upper-cases `name` and checks it is usable as an XPath step.
pub(crate) fn validate_name(parameter: &'static str, name: &str) -> Result<String> {
    let name = name.trim().to_uppercase();
    if name.is_empty() {
        return Err(Error::EmptyParameter(parameter));
    }
    if !xpath::is_valid_alias(&name) {
        return Err(Error::InvalidName(name));
    }
    Ok(name)
}
