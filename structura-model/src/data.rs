use crate::data_type::DataType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use structura_types::{AssignmentId, Multiplicity, PropertyId};

/// Placement of one data node inside a content instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataNode {
    pub alias: String,
    /// 1-based instance index.
    pub index: u32,
    /// Path without indices, e.g. `/TEASER/TITLE`.
    pub xpath: String,
    /// Path with every index, e.g. `/TEASER[1]/TITLE[2]`.
    pub xpath_full: String,
    pub assignment: AssignmentId,
    pub multiplicity: Multiplicity,
    pub position: i32,
    pub system_internal: bool,
}

/// A group instance with its child data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupData {
    #[serde(flatten)]
    pub node: DataNode,
    pub children: Vec<Data>,
    #[serde(default)]
    virtual_root: bool,
    #[serde(default)]
    xpath_prefix: String,
}

impl GroupData {
    #[must_use]
    pub const fn new(node: DataNode) -> Self {
        Self {
            node,
            children: Vec::new(),
            virtual_root: false,
            xpath_prefix: String::new(),
        }
    }

    /// The unnamed group holding an instance's root-level data.
    #[must_use]
    pub fn virtual_root(xpath_prefix: &str) -> Self {
        Self {
            node: DataNode {
                alias: String::new(),
                index: 1,
                xpath: "/".to_owned(),
                xpath_full: "/".to_owned(),
                assignment: AssignmentId::new(0),
                multiplicity: Multiplicity::ONE_ONE,
                position: 0,
                system_internal: false,
            },
            children: Vec::new(),
            virtual_root: true,
            xpath_prefix: xpath_prefix.trim().to_uppercase(),
        }
    }

    #[must_use]
    pub const fn is_virtual_root(&self) -> bool {
        self.virtual_root
    }

    /// Type name or instance key the root was created for.
    #[must_use]
    pub fn xpath_prefix(&self) -> &str {
        &self.xpath_prefix
    }

    /// Paths (without and with indices) of a child instance of this group.
    #[must_use]
    pub fn child_paths(&self, alias: &str, index: u32) -> (String, String) {
        let (xpath, full) = if self.virtual_root {
            ("", "")
        } else {
            (self.node.xpath.as_str(), self.node.xpath_full.as_str())
        };
        (format!("{xpath}/{alias}"), format!("{full}/{alias}[{index}]"))
    }

    pub fn add_child(&mut self, child: Data) {
        self.children.push(child);
    }

    /// Finds a descendant by its full XPath. Missing indices mean `[1]`.
    #[must_use]
    pub fn find(&self, xpath_full: &str) -> Option<&Data> {
        let wanted = structura_types::xpath::to_xpath_mult(xpath_full).ok()?;
        let wanted = structura_types::xpath::strip_type(&wanted);
        self.find_normalized(&wanted)
    }

    fn find_normalized(&self, wanted: &str) -> Option<&Data> {
        for child in &self.children {
            if child.node().xpath_full == wanted {
                return Some(child);
            }
            if let Data::Group(group) = child {
                if wanted.starts_with(&format!("{}/", group.node.xpath_full)) {
                    if let Some(found) = group.find_normalized(wanted) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// Number of direct children created from `assignment`.
    #[must_use]
    pub fn count_of(&self, assignment: AssignmentId) -> usize {
        self.children
            .iter()
            .filter(|c| c.node().assignment == assignment)
            .count()
    }

    /// Every property node below this group, depth first.
    #[must_use]
    pub fn property_data(&self) -> Vec<&PropertyData> {
        let mut out = Vec::new();
        for child in &self.children {
            match child {
                Data::Property(p) => out.push(p),
                Data::Group(g) => out.extend(g.property_data()),
            }
        }
        out
    }
}

/// A property instance carrying one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyData {
    #[serde(flatten)]
    pub node: DataNode,
    pub property: PropertyId,
    pub data_type: DataType,
    pub value: Option<Value>,
    /// Whether `value` was taken from the assignment or property default.
    pub contains_default_value: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_input_length: Option<u32>,
}

impl PropertyData {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.value {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        }
    }

    pub fn get_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(|v| v.as_str())
    }

    pub fn get_bool(&self) -> Option<bool> {
        self.value.as_ref().and_then(|v| v.as_bool())
    }

    pub fn get_number(&self) -> Option<f64> {
        self.value.as_ref().and_then(|v| v.as_f64())
    }
}

/// A node of a content data tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Data {
    Group(GroupData),
    Property(PropertyData),
}

impl Data {
    #[must_use]
    pub const fn node(&self) -> &DataNode {
        match self {
            Self::Group(g) => &g.node,
            Self::Property(p) => &p.node,
        }
    }

    #[must_use]
    pub const fn as_group(&self) -> Option<&GroupData> {
        match self {
            Self::Group(g) => Some(g),
            Self::Property(_) => None,
        }
    }

    #[must_use]
    pub const fn as_property(&self) -> Option<&PropertyData> {
        match self {
            Self::Property(p) => Some(p),
            Self::Group(_) => None,
        }
    }
}
