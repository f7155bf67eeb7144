//! Declarative structure definitions (TOML).
//!
//! ```toml
//! [[acl]]
//! name = "EDITORS"
//!
//! [[property]]
//! name = "TITLE"
//! data_type = "string1024"
//! multiplicity = "1..1"
//!
//! [[group]]
//! name = "TEASER"
//!
//! [[type]]
//! name = "DOCUMENT"
//!
//! [[type.assignments]]
//! group = "TEASER"
//!
//! [[type.assignments]]
//! property = "TITLE"
//! parent = "/TEASER"
//! alias = "TEASER_TITLE"
//! ```

use crate::builder::EnvironmentBuilder;
use crate::environment::Environment;
use crate::error::EnvError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use structura_model::edit::{PropertyEdit, GroupEdit, TypeEdit};
use structura_model::{DataType, GroupMode, TypeMode, TypeRelation, UniqueMode};
use structura_types::{AclId, GroupId, Multiplicity, PropertyId, TypeId};
use tracing::info;

/// ACL used by elements and types that name none.
pub const DEFAULT_ACL: &str = "DEFAULT";

fn yes() -> bool {
    true
}

fn root() -> String {
    "/".to_owned()
}

/// A complete structure: ACLs, elements, and types with their assignments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureDefinition {
    #[serde(default, rename = "acl")]
    pub acls: Vec<AclDefinition>,
    #[serde(default, rename = "property")]
    pub properties: Vec<PropertyDefinition>,
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupDefinition>,
    /// Parents must come before the types derived from them.
    #[serde(default, rename = "type")]
    pub types: Vec<TypeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclDefinition {
    pub name: String,
}

/// An option on an element or assignment. `passed_on` only applies to types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub key: String,
    pub value: String,
    #[serde(default = "yes")]
    pub overridable: bool,
    #[serde(default)]
    pub passed_on: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    pub data_type: DataType,
    pub label: Option<String>,
    pub hint: Option<String>,
    pub multiplicity: Option<Multiplicity>,
    #[serde(default = "yes")]
    pub override_multiplicity: bool,
    pub acl: Option<String>,
    #[serde(default = "yes")]
    pub override_acl: bool,
    pub default_value: Option<Value>,
    #[serde(default)]
    pub system_internal: bool,
    #[serde(default = "yes")]
    pub fulltext_indexed: bool,
    #[serde(default)]
    pub unique_mode: UniqueMode,
    /// Name of the type a reference property points to.
    pub referenced_type: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDefinition {
    pub name: String,
    pub label: Option<String>,
    pub hint: Option<String>,
    pub multiplicity: Option<Multiplicity>,
    #[serde(default = "yes")]
    pub override_multiplicity: bool,
    #[serde(default)]
    pub mode: GroupMode,
    #[serde(default)]
    pub options: Vec<OptionDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDefinition {
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub max_source: u32,
    #[serde(default)]
    pub max_destination: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,
    pub label: Option<String>,
    pub parent: Option<String>,
    #[serde(default)]
    pub mode: TypeMode,
    pub acl: Option<String>,
    #[serde(default)]
    pub use_property_permissions: bool,
    #[serde(default)]
    pub relations: Vec<RelationDefinition>,
    #[serde(default)]
    pub options: Vec<OptionDefinition>,
    #[serde(default)]
    pub assignments: Vec<AssignmentDefinition>,
}

/// Assigns either a property or a group (exactly one of the two).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentDefinition {
    pub property: Option<String>,
    pub group: Option<String>,
    /// XPath of the parent group assignment, `/` for the type root.
    #[serde(default = "root")]
    pub parent: String,
    pub alias: Option<String>,
    pub multiplicity: Option<Multiplicity>,
    pub default_multiplicity: Option<u32>,
    pub position: Option<i32>,
    #[serde(default = "yes")]
    pub enabled: bool,
    pub label: Option<String>,
    pub hint: Option<String>,
    pub acl: Option<String>,
    pub mode: Option<GroupMode>,
    pub default_value: Option<Value>,
    #[serde(default)]
    pub options: Vec<OptionDefinition>,
}

fn invalid(reason: impl Into<String>) -> EnvError {
    EnvError::DefinitionInvalid(reason.into())
}

fn unique_names<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> Result<HashSet<String>, EnvError> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(invalid(format!("{kind} name is required")));
        }
        if !seen.insert(name.trim().to_uppercase()) {
            return Err(invalid(format!("{kind} `{name}` is defined twice")));
        }
    }
    Ok(seen)
}

fn check_options(owner: &str, options: &[OptionDefinition]) -> Result<(), EnvError> {
    if options.iter().any(|o| o.key.trim().is_empty()) {
        return Err(invalid(format!("option key is required on `{owner}`")));
    }
    Ok(())
}

fn upper(name: &str) -> String {
    name.trim().to_uppercase()
}

fn lookup<T: Copy>(ids: &HashMap<String, T>, kind: &str, name: &str) -> Result<T, EnvError> {
    ids.get(&upper(name))
        .copied()
        .ok_or_else(|| invalid(format!("{kind} `{name}` is not defined")))
}

impl StructureDefinition {
    /// Parses and validates a TOML definition.
    pub fn from_toml_str(s: &str) -> Result<Self, EnvError> {
        let definition: Self = toml::from_str(s)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Reads, parses and validates a TOML definition file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EnvError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let definition = Self::from_toml_str(&content)?;
        info!(path = %path.display(), types = definition.types.len(), "Structure definition loaded");
        Ok(definition)
    }

    pub fn to_toml_string(&self) -> Result<String, EnvError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks names and cross references without building anything.
    pub fn validate(&self) -> Result<(), EnvError> {
        let acls = unique_names("acl", self.acls.iter().map(|a| a.name.as_str()))?;
        let properties = unique_names("property", self.properties.iter().map(|p| p.name.as_str()))?;
        let groups = unique_names("group", self.groups.iter().map(|g| g.name.as_str()))?;
        let types = unique_names("type", self.types.iter().map(|t| t.name.as_str()))?;

        let acl_known = |acl: &Option<String>| {
            acl.as_deref()
                .is_none_or(|name| upper(name) == DEFAULT_ACL || acls.contains(&upper(name)))
        };

        for p in &self.properties {
            if !acl_known(&p.acl) {
                return Err(invalid(format!("property `{}` uses an undefined acl", p.name)));
            }
            if let Some(referenced) = &p.referenced_type {
                if p.data_type != DataType::Reference {
                    return Err(invalid(format!("property `{}` references a type but is not a reference", p.name)));
                }
                if !types.contains(&upper(referenced)) {
                    return Err(invalid(format!("property `{}` references undefined type `{referenced}`", p.name)));
                }
            }
            check_options(&p.name, &p.options)?;
        }
        for g in &self.groups {
            check_options(&g.name, &g.options)?;
        }

        let mut earlier: HashSet<String> = HashSet::new();
        for t in &self.types {
            if !acl_known(&t.acl) {
                return Err(invalid(format!("type `{}` uses an undefined acl", t.name)));
            }
            if let Some(parent) = &t.parent {
                if !earlier.contains(&upper(parent)) {
                    return Err(invalid(format!(
                        "type `{}` derives from `{parent}`, which must be defined before it",
                        t.name
                    )));
                }
            }
            for r in &t.relations {
                if !types.contains(&upper(&r.source)) || !types.contains(&upper(&r.destination)) {
                    return Err(invalid(format!("type `{}` relates undefined types", t.name)));
                }
            }
            if !t.relations.is_empty() && t.mode != TypeMode::Relation {
                return Err(invalid(format!("type `{}` has relations but is not a relation type", t.name)));
            }
            check_options(&t.name, &t.options)?;
            for a in &t.assignments {
                match (&a.property, &a.group) {
                    (Some(p), None) if properties.contains(&upper(p)) => {}
                    (None, Some(g)) if groups.contains(&upper(g)) => {}
                    (Some(p), None) => return Err(invalid(format!("type `{}` assigns undefined property `{p}`", t.name))),
                    (None, Some(g)) => return Err(invalid(format!("type `{}` assigns undefined group `{g}`", t.name))),
                    _ => {
                        return Err(invalid(format!(
                            "assignment in type `{}` needs exactly one of property or group",
                            t.name
                        )));
                    }
                }
                if !acl_known(&a.acl) {
                    return Err(invalid(format!("assignment in type `{}` uses an undefined acl", t.name)));
                }
                check_options(&t.name, &a.options)?;
            }
            earlier.insert(upper(&t.name));
        }
        Ok(())
    }

    /// Adds everything defined here to `builder`.
    pub fn apply(&self, builder: &mut EnvironmentBuilder) -> Result<(), EnvError> {
        self.validate()?;
        let default_acl = builder.ensure_acl(DEFAULT_ACL)?;
        for acl in &self.acls {
            builder.ensure_acl(&acl.name)?;
        }
        let acl_of = |builder: &EnvironmentBuilder, name: &Option<String>| -> Result<AclId, EnvError> {
            match name {
                Some(name) => Ok(builder.staging().acl_by_name(name)?.id),
                None => Ok(default_acl),
            }
        };

        let mut properties: HashMap<String, PropertyId> = HashMap::new();
        for p in &self.properties {
            let mut edit = PropertyEdit::new(&p.name, p.data_type, acl_of(builder, &p.acl)?);
            edit.set_override_multiplicity(p.override_multiplicity)
                .set_override_acl(p.override_acl)
                .set_default_value(p.default_value.clone())
                .set_system_internal(p.system_internal)
                .set_fulltext_indexed(p.fulltext_indexed)
                .set_unique_mode(p.unique_mode);
            if let Some(label) = &p.label {
                edit.set_label(label);
            }
            if let Some(hint) = &p.hint {
                edit.set_hint(hint);
            }
            if let Some(m) = p.multiplicity {
                edit.set_multiplicity(m);
            }
            for o in &p.options {
                edit.set_option(&o.key, o.overridable, &o.value)?;
            }
            properties.insert(upper(&p.name), builder.add_property(edit)?);
        }

        let mut groups: HashMap<String, GroupId> = HashMap::new();
        for g in &self.groups {
            let mut edit = GroupEdit::new(&g.name);
            edit.set_override_multiplicity(g.override_multiplicity).set_mode(g.mode);
            if let Some(label) = &g.label {
                edit.set_label(label);
            }
            if let Some(hint) = &g.hint {
                edit.set_hint(hint);
            }
            if let Some(m) = g.multiplicity {
                edit.set_multiplicity(m);
            }
            for o in &g.options {
                edit.set_option(&o.key, o.overridable, &o.value)?;
            }
            groups.insert(upper(&g.name), builder.add_group(edit)?);
        }

        let mut types: HashMap<String, TypeId> = HashMap::new();
        for t in &self.types {
            let mut edit = match &t.parent {
                Some(parent) => TypeEdit::derive(builder.staging().type_by_name(parent)?, &t.name),
                None => TypeEdit::new(&t.name, default_acl),
            };
            if t.acl.is_some() || t.parent.is_none() {
                edit.set_acl(acl_of(builder, &t.acl)?);
            }
            edit.set_mode(t.mode).set_use_property_permissions(t.use_property_permissions);
            if let Some(label) = &t.label {
                edit.set_label(label);
            }
            for o in &t.options {
                edit.set_option(&o.key, o.overridable, o.passed_on, &o.value)?;
            }
            let type_id = builder.add_type(edit)?;
            types.insert(upper(&t.name), type_id);
            for a in &t.assignments {
                assign(builder, type_id, a, &properties, &groups)?;
            }
        }

        for t in self.types.iter().filter(|t| !t.relations.is_empty()) {
            let staged = builder.staging().type_by_name(&t.name)?;
            let mut edit = TypeEdit::from(staged);
            for r in &t.relations {
                edit.add_relation(TypeRelation {
                    source: lookup(&types, "type", &r.source)?,
                    destination: lookup(&types, "type", &r.destination)?,
                    max_source: r.max_source,
                    max_destination: r.max_destination,
                });
            }
            builder.update_type(edit)?;
        }

        for p in &self.properties {
            let Some(referenced) = &p.referenced_type else { continue };
            let id = lookup(&properties, "property", &p.name)?;
            let mut edit = PropertyEdit::from(builder.staging().property(id)?);
            edit.set_referenced_type(Some(lookup(&types, "type", referenced)?));
            builder.update_property(edit)?;
        }
        Ok(())
    }

    /// Builds a fresh environment from this definition.
    pub fn build(&self) -> Result<Environment, EnvError> {
        let mut builder = EnvironmentBuilder::new();
        self.apply(&mut builder)?;
        Ok(builder.build()?)
    }
}

fn assign(
    builder: &mut EnvironmentBuilder,
    type_id: TypeId,
    a: &AssignmentDefinition,
    properties: &HashMap<String, PropertyId>,
    groups: &HashMap<String, GroupId>,
) -> Result<(), EnvError> {
    let alias = a.alias.as_deref();
    let label = a.label.as_deref();
    let hint = a.hint.as_deref();
    if let Some(name) = &a.property {
        let mut edit = builder.new_property_assignment(lookup(properties, "property", name)?, type_id, &a.parent, alias)?;
        edit.set_enabled(a.enabled).set_default_value(a.default_value.clone());
        if label.is_some() {
            edit.set_label(label);
        }
        if hint.is_some() {
            edit.set_hint(hint);
        }
        if let Some(position) = a.position {
            edit.set_position(position);
        }
        if let Some(m) = a.multiplicity {
            edit.set_multiplicity(m)?;
        }
        if let Some(d) = a.default_multiplicity {
            edit.set_default_multiplicity(d);
        }
        if let Some(acl) = &a.acl {
            edit.set_acl(builder.staging().acl_by_name(acl)?.id)?;
        }
        for o in &a.options {
            edit.set_option(&o.key, o.overridable, &o.value)?;
        }
        builder.assign_property(edit)?;
    } else if let Some(name) = &a.group {
        let mut edit = builder.new_group_assignment(lookup(groups, "group", name)?, type_id, &a.parent, alias)?;
        edit.set_enabled(a.enabled);
        if label.is_some() {
            edit.set_label(label);
        }
        if hint.is_some() {
            edit.set_hint(hint);
        }
        if let Some(position) = a.position {
            edit.set_position(position);
        }
        if let Some(m) = a.multiplicity {
            edit.set_multiplicity(m)?;
        }
        if let Some(d) = a.default_multiplicity {
            edit.set_default_multiplicity(d);
        }
        if let Some(mode) = a.mode {
            edit.set_mode(mode);
        }
        for o in &a.options {
            edit.set_option(&o.key, o.overridable, &o.value)?;
        }
        builder.assign_group(edit)?;
    }
    Ok(())
}
