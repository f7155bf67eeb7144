//! Structure model for Structura.
//!
//! Defines the building blocks of a content type system:
//! - [`Property`] and [`Group`]: element definitions with multiplicity and options
//! - [`PropertyAssignment`] and [`GroupAssignment`]: elements bound into a type,
//!   with effective-value resolution against the element
//! - [`ContentType`]: the root of an assignment tree, with derivation and relations
//! - [`edit`]: edit sessions that validate and commit immutable definitions
//! - [`AssignmentDiff`]: which attributes a derived assignment overrides
//! - [`Data`]: the content data trees created from a type

mod assignment;
mod content_type;
mod data;
mod data_type;
mod diff;
pub mod edit;
mod element;
pub mod option;
mod permission;

pub use assignment::{Assignment, AssignmentCore, ChildKind, ChildList, ChildRef, GroupAssignment, PropertyAssignment};
pub use content_type::{ContentType, TypeMode, TypePermissions, TypeRelation, TypeState};
pub use data::{Data, DataNode, GroupData, PropertyData};
pub use data_type::{DataType, STRING1024_MAX_LENGTH};
pub use diff::{AssignmentDiff, DiffAttribute};
pub use element::{Group, GroupMode, Property, StructureElement, UniqueMode};
pub use option::{OptionList, OptionSource, StructureOption, TypeOption};
pub use permission::{Acl, AclGrants, AllowAll, PermissionChecker};
