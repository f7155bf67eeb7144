//! Identifier types used throughout the structure layer.
//!
//! Ids are allocated by the environment builder and are stable for the
//! lifetime of a definition. They are plain `u64` newtypes so that each kind
//! of structure element gets its own type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! structure_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates an id from its raw value.
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw value.
            #[must_use]
            pub const fn get(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

structure_id!(
    /// Identifier of a property definition.
    PropertyId
);

structure_id!(
    /// Identifier of a group definition.
    GroupId
);

structure_id!(
    /// Identifier of a property or group assignment.
    AssignmentId
);

structure_id!(
    /// Identifier of a content type.
    TypeId
);

structure_id!(
    /// Identifier of an access control list.
    AclId
);

impl TypeId {
    /// The virtual root type every type derives from.
    pub const ROOT: TypeId = TypeId(0);
}
