//! Structure options: keyed, overridable attributes of elements,
//! assignments and types.

use serde::{Deserialize, Serialize};
use structura_types::{Error, Result};

/// Well-known option keys.
pub mod keys {
    pub const MULTILANG: &str = "MULTILANG";
    pub const FULLTEXT: &str = "FULLTEXT";
    pub const SHOW_OVERVIEW: &str = "SHOW.OVERVIEW";
    pub const HTML_EDITOR: &str = "HTML.EDITOR";
    pub const SEARCHABLE: &str = "SEARCHABLE";
    pub const MAXLENGTH: &str = "MAXLENGTH";
    pub const MULTILINE: &str = "MULTILINE";
    pub const MIMETYPE: &str = "MIMETYPE";
}

pub const VALUE_TRUE: &str = "1";
pub const VALUE_FALSE: &str = "0";

fn normalize_key(key: &str) -> String {
    key.trim().to_uppercase()
}

/// A single option value plus its override flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructureOption {
    key: String,
    value: String,
    overridable: bool,
    set: bool,
    #[serde(default)]
    inherited: bool,
}

impl StructureOption {
    #[must_use]
    pub fn new(key: &str, overridable: bool, set: bool, value: impl Into<String>) -> Self {
        Self {
            key: normalize_key(key),
            value: value.into(),
            overridable,
            set,
            inherited: false,
        }
    }

    /// The placeholder returned for keys nobody defined.
    #[must_use]
    pub fn unknown(key: &str) -> Self {
        Self::new(key, true, false, "")
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub const fn is_overridable(&self) -> bool {
        self.overridable
    }

    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.set
    }

    /// Whether this option was copied down from a parent definition.
    #[must_use]
    pub const fn is_inherited(&self) -> bool {
        self.inherited
    }

    pub fn set_inherited(&mut self, inherited: bool) {
        self.inherited = inherited;
    }

    /// Set and carrying a non-empty value.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.set && !self.value.is_empty()
    }

    #[must_use]
    pub fn is_value_true(&self) -> bool {
        self.value == VALUE_TRUE
    }

    /// The value as an integer, 0 if it does not parse.
    #[must_use]
    pub fn int_value(&self) -> i64 {
        self.value.trim().parse().unwrap_or(0)
    }
}

/// An ordered list of options with unique, upper-case keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionList(Vec<StructureOption>);

impl OptionList {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StructureOption> {
        self.0.iter()
    }

    /// Returns the option stored under `key`, if any.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&StructureOption> {
        let key = normalize_key(key);
        if key.is_empty() {
            return None;
        }
        self.0.iter().find(|o| o.key == key)
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Returns the option stored under `key`, or the unknown placeholder.
    #[must_use]
    pub fn get(&self, key: &str) -> StructureOption {
        self.find(key)
            .cloned()
            .unwrap_or_else(|| StructureOption::unknown(key))
    }

    /// Inserts or replaces the option stored under `key`.
    pub fn set(&mut self, key: &str, overridable: bool, value: impl Into<String>) -> Result<()> {
        self.set_with(key, overridable, false, value.into())
    }

    /// Stores a boolean as `"1"` / `"0"`.
    pub fn set_bool(&mut self, key: &str, overridable: bool, value: bool) -> Result<()> {
        self.set(key, overridable, if value { VALUE_TRUE } else { VALUE_FALSE })
    }

    pub fn set_with(&mut self, key: &str, overridable: bool, inherited: bool, value: String) -> Result<()> {
        let key = normalize_key(key);
        if key.is_empty() {
            return Err(Error::EmptyParameter("key"));
        }
        if let Some(existing) = self.0.iter_mut().find(|o| o.key == key) {
            existing.overridable = overridable;
            existing.value = value;
            existing.set = true;
            existing.inherited = inherited;
            return Ok(());
        }
        self.0.push(StructureOption {
            key,
            value,
            overridable,
            set: true,
            inherited,
        });
        Ok(())
    }

    /// Removes the option stored under `key`. Returns whether one was removed.
    pub fn clear(&mut self, key: &str) -> bool {
        let key = normalize_key(key);
        let before = self.0.len();
        self.0.retain(|o| o.key != key);
        before != self.0.len()
    }

    /// Copies only the options flagged as inherited.
    #[must_use]
    pub fn inherited_only(&self) -> Self {
        Self(self.0.iter().filter(|o| o.inherited).cloned().collect())
    }
}

impl FromIterator<StructureOption> for OptionList {
    fn from_iter<I: IntoIterator<Item = StructureOption>>(iter: I) -> Self {
        let mut list = Self::new();
        for option in iter {
            list.0.retain(|o| o.key != option.key);
            list.0.push(option);
        }
        list
    }
}

impl<'a> IntoIterator for &'a OptionList {
    type Item = &'a StructureOption;
    type IntoIter = std::slice::Iter<'a, StructureOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Resolves `key` for an assignment against its element.
///
/// An element option that is set and not overridable always wins. An
/// element option that is set and overridable yields to the assignment's
/// own option. An unset element option defers to the assignment entirely.
#[must_use]
pub fn resolve(element: &OptionList, assignment: &OptionList, key: &str) -> StructureOption {
    let element_option = element.get(key);
    if !element_option.is_set() {
        return assignment.get(key);
    }
    if !element_option.is_overridable() {
        return element_option;
    }
    assignment.find(key).cloned().unwrap_or(element_option)
}

/// A type-level option, optionally passed on to derived types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeOption {
    #[serde(flatten)]
    option: StructureOption,
    passed_on: bool,
}

impl TypeOption {
    #[must_use]
    pub fn new(key: &str, overridable: bool, passed_on: bool, value: impl Into<String>) -> Self {
        Self {
            option: StructureOption::new(key, overridable, true, value),
            passed_on,
        }
    }

    /// Unknown type options are not overridable.
    #[must_use]
    pub fn unknown(key: &str) -> Self {
        Self {
            option: StructureOption::new(key, false, false, ""),
            passed_on: false,
        }
    }

    #[must_use]
    pub const fn option(&self) -> &StructureOption {
        &self.option
    }

    #[must_use]
    pub fn key(&self) -> &str {
        self.option.key()
    }

    #[must_use]
    pub const fn is_passed_on(&self) -> bool {
        self.passed_on
    }

    pub(crate) fn inherited_copy(&self) -> Self {
        let mut copy = self.clone();
        copy.option.inherited = true;
        copy
    }
}

/// Anything that exposes options, with typed accessors for well-known keys.
pub trait OptionSource {
    /// The effective option for `key`.
    fn option(&self, key: &str) -> StructureOption;

    fn has_option(&self, key: &str) -> bool;

    fn is_multi_lang(&self) -> bool {
        self.option(keys::MULTILANG).is_value_true()
    }

    fn is_searchable(&self) -> bool {
        self.option(keys::SEARCHABLE).is_value_true()
    }

    fn is_in_overview(&self) -> bool {
        self.option(keys::SHOW_OVERVIEW).is_value_true()
    }

    fn is_use_html_editor(&self) -> bool {
        self.option(keys::HTML_EDITOR).is_value_true()
    }

    fn is_multi_line(&self) -> bool {
        let opt = self.option(keys::MULTILINE);
        opt.is_set() && opt.int_value() > 0
    }

    /// Number of lines for multi-line input, 0 if unset.
    fn multi_lines(&self) -> i64 {
        let opt = self.option(keys::MULTILINE);
        if opt.is_set() { opt.int_value() } else { 0 }
    }

    fn has_max_length(&self) -> bool {
        self.has_option(keys::MAXLENGTH)
    }

    fn max_length(&self) -> i64 {
        self.option(keys::MAXLENGTH).int_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_normalized() {
        let mut list = OptionList::new();
        list.set(" searchable ", true, "1").unwrap();
        assert!(list.has("SEARCHABLE"));
        assert_eq!(list.get("Searchable").key(), "SEARCHABLE");
    }

    #[test]
    fn set_replaces_existing() {
        let mut list = OptionList::new();
        list.set("A", true, "x").unwrap();
        list.set("a", false, "y").unwrap();
        assert_eq!(list.len(), 1);
        let opt = list.get("A");
        assert_eq!(opt.value(), "y");
        assert!(!opt.is_overridable());
    }

    #[test]
    fn from_iter_keeps_last_duplicate() {
        let list: OptionList = [
            StructureOption::new("A", true, true, "1"),
            StructureOption::new("a", true, true, "2"),
        ]
        .into_iter()
        .collect();
        assert_eq!(list.len(), 1);
        assert_eq!(list.get("A").value(), "2");
    }

    #[test]
    fn type_option_inherited_copy_is_flagged() {
        let opt = TypeOption::new("MIMETYPE", true, true, "text/plain");
        let copy = opt.inherited_copy();
        assert!(copy.option().is_inherited());
        assert!(!opt.option().is_inherited());
    }
}
