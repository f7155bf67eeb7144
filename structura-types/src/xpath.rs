//! XPath addressing of assignments and content data.
//!
//! An XPath locates an assignment (or a data instance) inside a type:
//! `TYPENAME/GROUP[n]/PROPERTY[m]`. Paths are case-insensitive, the type
//! prefix is optional and a missing index means `[1]`.

use crate::{Error, Result};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

fn xpath_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Z][A-Z_0-9]*)?(/[A-Z][A-Z_0-9]*(\[[0-9]+\])?)+$")
            .expect("static xpath pattern compiles")
    })
}

/// One step of an XPath: an alias plus the instance index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct XPathElement {
    alias: String,
    index: u32,
    index_defined: bool,
}

impl XPathElement {
    #[must_use]
    pub fn new(alias: impl Into<String>, index: u32, index_defined: bool) -> Self {
        Self {
            alias: alias.into().to_uppercase(),
            index,
            index_defined,
        }
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Whether the index was written explicitly (`A[2]`) rather than implied.
    #[must_use]
    pub const fn is_index_defined(&self) -> bool {
        self.index_defined
    }

    pub fn set_index(&mut self, index: u32) {
        self.index = index;
        self.index_defined = true;
    }

    fn parse(xpath: &str, step: &str) -> Result<Self> {
        let invalid = || Error::InvalidXPath { xpath: xpath.to_owned() };
        if step.is_empty() || step.contains('/') {
            return Err(invalid());
        }
        match step.find('[') {
            Some(open) if open > 0 => {
                let index = step[open + 1..]
                    .strip_suffix(']')
                    .and_then(|raw| raw.parse().ok())
                    .ok_or_else(invalid)?;
                Ok(Self::new(&step[..open], index, true))
            }
            Some(_) => Err(invalid()),
            None => Ok(Self::new(step, 1, false)),
        }
    }
}

impl fmt::Display for XPathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.alias, self.index)
    }
}

/// Checks the XPath syntax. `/` alone (the root) is valid.
#[must_use]
pub fn is_valid_xpath(xpath: &str) -> bool {
    if xpath == "/" {
        return true;
    }
    !xpath.is_empty() && xpath_pattern().is_match(&xpath.to_uppercase())
}

/// Whether `alias` is usable as a single XPath step (`[A-Z][A-Z_0-9]*`,
/// compared case-insensitively).
#[must_use]
pub fn is_valid_alias(alias: &str) -> bool {
    let mut chars = alias.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Returns the type prefix of an XPath, if any (`DOCUMENT/A` gives `DOCUMENT`).
#[must_use]
pub fn type_name(xpath: &str) -> Option<String> {
    if xpath.starts_with('/') {
        return None;
    }
    let prefix = &xpath[..xpath.find('/')?];
    let prefix = prefix.find('[').map_or(prefix, |open| &prefix[..open]);
    Some(prefix.trim().to_uppercase())
}

/// Removes the type prefix and upper-cases the path.
#[must_use]
pub fn strip_type(xpath: &str) -> String {
    if xpath.starts_with('/') {
        return xpath.to_uppercase();
    }
    xpath
        .find('/')
        .map_or_else(|| xpath.to_uppercase(), |slash| xpath[slash..].to_uppercase())
}

/// Splits an XPath into its elements. An empty path yields no elements.
pub fn split(xpath: &str) -> Result<Vec<XPathElement>> {
    if xpath.is_empty() {
        return Ok(Vec::new());
    }
    let stripped = strip_type(xpath);
    if !is_valid_xpath(&stripped) {
        return Err(Error::InvalidXPath { xpath: xpath.to_owned() });
    }
    if stripped == "/" {
        return Ok(Vec::new());
    }
    stripped[1..]
        .split('/')
        .map(|step| XPathElement::parse(xpath, step))
        .collect()
}

/// Returns the last element of an XPath.
pub fn last_element(xpath: &str) -> Result<XPathElement> {
    split(xpath)?
        .pop()
        .ok_or_else(|| Error::InvalidXPath { xpath: xpath.to_owned() })
}

/// Returns the instance indices of every step.
pub fn indices(xpath: &str) -> Result<Vec<u32>> {
    Ok(split(xpath)?.iter().map(XPathElement::index).collect())
}

/// Joins elements with explicit indices: `/A[1]/B[2]`.
#[must_use]
pub fn to_xpath(elements: &[XPathElement]) -> String {
    if elements.is_empty() {
        return "/".to_owned();
    }
    elements.iter().map(|e| format!("/{e}")).collect()
}

/// Joins elements without indices: `/A/B`.
#[must_use]
pub fn to_xpath_no_mult(elements: &[XPathElement]) -> String {
    if elements.is_empty() {
        return "/".to_owned();
    }
    elements.iter().map(|e| format!("/{}", e.alias())).collect()
}

fn rewrite_steps(xpath: &str, keep_type_index: bool, step: impl Fn(&XPathElement) -> String) -> Result<String> {
    if xpath.is_empty() || xpath == "/" {
        return Ok("/".to_owned());
    }
    let upper = xpath.to_uppercase();
    let prefix = match upper.find('/') {
        Some(slash) if slash > 0 => {
            let prefix = &upper[..slash];
            if keep_type_index {
                prefix.to_owned()
            } else {
                prefix.find('[').map_or(prefix, |open| &prefix[..open]).to_owned()
            }
        }
        _ => String::new(),
    };
    let body: String = split(&upper)?.iter().map(step).collect();
    Ok(format!("{prefix}{body}"))
}

/// Adds `[1]` to every step that has no explicit index.
pub fn to_xpath_mult(xpath: &str) -> Result<String> {
    rewrite_steps(xpath, true, |e| format!("/{e}"))
}

/// Removes every index (including one on the type prefix).
pub fn to_xpath_no_mult_str(xpath: &str) -> Result<String> {
    rewrite_steps(xpath, false, |e| format!("/{}", e.alias()))
}

/// Builds an upper-case XPath from parts, collapsing duplicate slashes.
#[must_use]
pub fn build_xpath(leading_slash: bool, parts: &[&str]) -> String {
    let mut xpath = String::with_capacity(64);
    for part in parts {
        xpath.push('/');
        xpath.push_str(part.strip_prefix('/').unwrap_or(part));
        if xpath.len() > 1 && xpath.ends_with('/') {
            xpath.pop();
        }
    }
    let mut collapsed = String::with_capacity(xpath.len());
    for c in xpath.chars() {
        if c == '/' && collapsed.ends_with('/') {
            continue;
        }
        collapsed.push(c);
    }
    if collapsed.is_empty() && leading_slash {
        collapsed.push('/');
    } else if !leading_slash && collapsed.starts_with('/') {
        collapsed.remove(0);
    }
    collapsed.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_parse_with_index() {
        let e = XPathElement::parse("/a[3]", "a[3]").unwrap();
        assert_eq!(e.alias(), "A");
        assert_eq!(e.index(), 3);
        assert!(e.is_index_defined());
    }

    #[test]
    fn element_parse_rejects_bad_index() {
        assert!(XPathElement::parse("/a[x]", "a[x]").is_err());
        assert!(XPathElement::parse("/[1]", "[1]").is_err());
    }

    #[test]
    fn pattern_accepts_type_prefix() {
        assert!(is_valid_xpath("DOCUMENT/TEASER[1]/TITLE"));
        assert!(is_valid_xpath("/teaser/title[2]"));
        assert!(!is_valid_xpath("DOCUMENT"));
        assert!(!is_valid_xpath("/1ABC"));
    }
}
