//! Difference analysis between an assignment and what it derives from.

use crate::assignment::{Assignment, AssignmentCore};
use crate::option::OptionSource;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use structura_types::{Error, Result};

/// An attribute whose effective value differs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffAttribute {
    Enabled,
    Alias,
    Position,
    Multiplicity,
    DefaultMultiplicity,
    Acl,
    Label,
    Hint,
    /// An option, by key.
    Option(String),
    Mode,
    DefaultValue,
}

impl fmt::Display for DiffAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => f.write_str("enabled"),
            Self::Alias => f.write_str("alias"),
            Self::Position => f.write_str("position"),
            Self::Multiplicity => f.write_str("multiplicity"),
            Self::DefaultMultiplicity => f.write_str("defaultMultiplicity"),
            Self::Acl => f.write_str("acl"),
            Self::Label => f.write_str("label"),
            Self::Hint => f.write_str("hint"),
            Self::Option(key) => write!(f, "option:{key}"),
            Self::Mode => f.write_str("mode"),
            Self::DefaultValue => f.write_str("defaultValue"),
        }
    }
}

/// The attributes in which an assignment differs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentDiff {
    attributes: BTreeSet<DiffAttribute>,
}

impl AssignmentDiff {
    /// Compares a derived assignment against its base. Only effective
    /// values count, so an override the element forbids is no difference.
    pub fn between(base: &Assignment, derived: &Assignment) -> Result<Self> {
        let mut diff = Self::default();
        diff.compare_cores(base.core(), derived.core());
        diff.flag(base.multiplicity() != derived.multiplicity(), DiffAttribute::Multiplicity);
        diff.flag(base.label() != derived.label(), DiffAttribute::Label);
        diff.flag(base.hint() != derived.hint(), DiffAttribute::Hint);
        match (base, derived) {
            (Assignment::Property(b), Assignment::Property(d)) => {
                diff.flag(b.acl() != d.acl(), DiffAttribute::Acl);
                diff.flag(b.default_value() != d.default_value(), DiffAttribute::DefaultValue);
            }
            (Assignment::Group(b), Assignment::Group(d)) => {
                diff.flag(b.mode() != d.mode(), DiffAttribute::Mode);
            }
            _ => {
                return Err(Error::InvalidDerivation(format!(
                    "`{}` and `{}` assign different kinds of elements",
                    base.xpath(),
                    derived.xpath()
                )));
            }
        }
        let keys = option_keys(base).chain(option_keys(derived)).collect::<BTreeSet<_>>();
        for key in keys {
            let (b, d) = (base.option(&key), derived.option(&key));
            diff.flag(b.value() != d.value() || b.is_set() != d.is_set(), DiffAttribute::Option(key));
        }
        Ok(diff)
    }

    /// Compares an assignment against its own element.
    #[must_use]
    pub fn against_element(assignment: &Assignment) -> Self {
        let mut diff = Self::default();
        match assignment {
            Assignment::Property(pa) => {
                let property = pa.property();
                diff.flag(pa.multiplicity() != property.multiplicity(), DiffAttribute::Multiplicity);
                diff.flag(pa.label() != property.element().label(), DiffAttribute::Label);
                diff.flag(pa.hint() != property.element().hint(), DiffAttribute::Hint);
                diff.flag(pa.acl() != property.acl(), DiffAttribute::Acl);
                diff.flag(pa.default_value() != property.default_value(), DiffAttribute::DefaultValue);
                diff.flag(pa.core().alias() != property.name(), DiffAttribute::Alias);
                for key in option_keys(assignment).collect::<BTreeSet<_>>() {
                    let (a, e) = (pa.option(&key), property.option(&key));
                    diff.flag(a.value() != e.value() || a.is_set() != e.is_set(), DiffAttribute::Option(key));
                }
            }
            Assignment::Group(ga) => {
                let group = ga.group();
                diff.flag(ga.multiplicity() != group.multiplicity(), DiffAttribute::Multiplicity);
                diff.flag(ga.label() != group.element().label(), DiffAttribute::Label);
                diff.flag(ga.hint() != group.element().hint(), DiffAttribute::Hint);
                diff.flag(ga.mode() != group.default_mode(), DiffAttribute::Mode);
                diff.flag(ga.core().alias() != group.name(), DiffAttribute::Alias);
                for key in option_keys(assignment).collect::<BTreeSet<_>>() {
                    let (a, e) = (ga.option(&key), group.option(&key));
                    diff.flag(a.value() != e.value() || a.is_set() != e.is_set(), DiffAttribute::Option(key));
                }
            }
        }
        diff
    }

    fn compare_cores(&mut self, base: &AssignmentCore, derived: &AssignmentCore) {
        self.flag(base.is_enabled() != derived.is_enabled(), DiffAttribute::Enabled);
        self.flag(base.alias() != derived.alias(), DiffAttribute::Alias);
        self.flag(base.position() != derived.position(), DiffAttribute::Position);
        self.flag(
            base.default_multiplicity() != derived.default_multiplicity(),
            DiffAttribute::DefaultMultiplicity,
        );
    }

    fn flag(&mut self, differs: bool, attribute: DiffAttribute) {
        if differs {
            self.attributes.insert(attribute);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, attribute: &DiffAttribute) -> bool {
        self.attributes.contains(attribute)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &DiffAttribute> {
        self.attributes.iter()
    }
}

/// Keys set on the assignment or on its element.
fn option_keys(assignment: &Assignment) -> impl Iterator<Item = String> + '_ {
    let element = match assignment {
        Assignment::Property(pa) => pa.property().element().options(),
        Assignment::Group(ga) => ga.group().element().options(),
    };
    assignment
        .core()
        .own_options()
        .iter()
        .chain(element.iter())
        .map(|o| o.key().to_owned())
}
