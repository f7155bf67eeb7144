//! Domain errors raised by the structure layer.

use thiserror::Error;

/// Coarse classification of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A caller supplied a value the structure rules reject.
    InvalidParameter,
    /// A referenced element, assignment, type or path does not exist.
    NotFound,
    /// Content data could not be instantiated from the structure.
    Create,
}

/// Errors that can occur in structure operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid multiplicity {min}..{max}: {reason}")]
    InvalidMultiplicity { min: i64, max: i64, reason: &'static str },

    #[error("malformed multiplicity `{0}`, expected `min..max`")]
    MalformedMultiplicity(String),

    #[error("invalid xpath `{xpath}`")]
    InvalidXPath { xpath: String },

    #[error("parameter `{0}` must not be empty")]
    EmptyParameter(&'static str),

    #[error("invalid {parameter}: {reason}")]
    InvalidParameter { parameter: &'static str, reason: String },

    #[error("invalid name `{0}`, expected a letter followed by letters, digits or `_`")]
    InvalidName(String),

    #[error("override of {attribute} is forbidden by `{element}`")]
    OverrideForbidden { attribute: String, element: String },

    #[error("`{0}` is not a group assignment")]
    NotAGroup(String),

    #[error("`{0}` is not a property assignment")]
    NotAProperty(String),

    #[error("{kind} `{name}` already exists")]
    DuplicateName { kind: &'static str, name: String },

    #[error("xpath `{xpath}` is already assigned in type `{type_name}`")]
    DuplicateXPath { xpath: String, type_name: String },

    #[error("invalid derivation: {0}")]
    InvalidDerivation(String),

    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("index.invalid: index {index} is outside {multiplicity} at `{xpath}`")]
    IndexOutOfRange { index: u32, multiplicity: String, xpath: String },

    #[error("oneof.multiple: group `{xpath}` has more than one required child")]
    OneOfMultiple { xpath: String },
}

impl Error {
    /// Shorthand for a [`Error::NotFound`] error.
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        Self::NotFound { kind, key: key.to_string() }
    }

    /// Shorthand for a [`Error::InvalidParameter`] error.
    pub fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { parameter, reason: reason.into() }
    }

    /// Shorthand for a [`Error::OverrideForbidden`] error.
    pub fn override_forbidden(attribute: impl Into<String>, element: impl Into<String>) -> Self {
        Self::OverrideForbidden {
            attribute: attribute.into(),
            element: element.into(),
        }
    }

    /// Returns the taxonomy bucket of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::IndexOutOfRange { .. } | Self::OneOfMultiple { .. } => ErrorKind::Create,
            _ => ErrorKind::InvalidParameter,
        }
    }
}
