//! Structura environment.
//!
//! Ties the structure model together into consistent snapshots:
//! - [`Environment`]: an immutable, shareable view with id, name and XPath
//!   lookups, plus empty and random data-tree instantiation
//! - [`EnvironmentBuilder`]: the staging area for changes, including type
//!   derivation and cascading removal
//! - [`EnvironmentCache`]: the published snapshot, swapped atomically
//! - [`StructureDefinition`]: declarative TOML structure files

mod builder;
mod cache;
mod config;
mod environment;
mod error;
mod instantiate;

pub use builder::EnvironmentBuilder;
pub use cache::EnvironmentCache;
pub use config::{
    AclDefinition, AssignmentDefinition, DEFAULT_ACL, GroupDefinition, OptionDefinition,
    PropertyDefinition, RelationDefinition, StructureDefinition, TypeDefinition,
};
pub use environment::Environment;
pub use error::EnvError;
pub use instantiate::RANDOM_TEXT_LENGTH;
