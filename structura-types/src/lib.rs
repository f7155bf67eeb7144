//! Core value types for the Structura structure layer.
//!
//! This crate defines the small, dependency-light types shared by the model
//! and the environment:
//! - Identifiers for properties, groups, assignments, types and ACLs
//! - [`Multiplicity`] occurrence bounds
//! - XPath parsing and formatting ([`xpath`])
//! - The domain [`Error`] taxonomy (invalid parameter, not found, create)

mod error;
mod ids;
mod multiplicity;
pub mod xpath;

pub use error::{Error, ErrorKind};
pub use ids::{AclId, AssignmentId, GroupId, PropertyId, TypeId};
pub use multiplicity::Multiplicity;
pub use xpath::XPathElement;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;
