//! Occurrence bounds of properties and groups.
//!
//! A multiplicity `min..max` states how often an element may occur at one
//! position of a content instance. `max` may be unlimited, written `N`.

use crate::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SYMBOL_UNLIMITED: &str = "N";

/// `[min, max]` occurrence bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Multiplicity {
    min: u32,
    max: u32,
}

impl Multiplicity {
    /// Marker for an unlimited maximum.
    pub const N: i32 = i32::MAX;

    /// Upper bound for random instance counts of unlimited elements.
    pub const RANDOM_MAX: u32 = 20;

    pub const ZERO_ONE: Multiplicity = Multiplicity { min: 0, max: 1 };
    pub const ONE_ONE: Multiplicity = Multiplicity { min: 1, max: 1 };
    pub const ZERO_N: Multiplicity = Multiplicity { min: 0, max: Self::N as u32 };
    pub const ONE_N: Multiplicity = Multiplicity { min: 1, max: Self::N as u32 };

    /// Creates a multiplicity, rejecting `min < 0`, `max < 1` and `min > max`.
    pub fn new(min: i32, max: i32) -> Result<Self> {
        let invalid = |reason| Error::InvalidMultiplicity {
            min: i64::from(min),
            max: i64::from(max),
            reason,
        };
        if min < 0 {
            return Err(invalid("minimum must not be negative"));
        }
        if max < 1 {
            return Err(invalid("maximum must be at least 1"));
        }
        if min > max {
            return Err(invalid("minimum exceeds maximum"));
        }
        Ok(Self {
            min: min.unsigned_abs(),
            max: max.unsigned_abs(),
        })
    }

    #[must_use]
    pub const fn min(&self) -> u32 {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// No occurrence is required.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.min == 0
    }

    /// At least one occurrence is required.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.min > 0
    }

    #[must_use]
    pub const fn is_unlimited(&self) -> bool {
        self.max == Self::N as u32
    }

    /// More than one occurrence is allowed.
    #[must_use]
    pub const fn is_multiple(&self) -> bool {
        self.max > 1
    }

    /// Checks `min <= index <= max`.
    #[must_use]
    pub const fn is_valid(&self, index: u32) -> bool {
        index >= self.min && index <= self.max
    }

    /// Checks that `index` addresses an existing instance slot (`1..=max`).
    #[must_use]
    pub const fn is_valid_max(&self, index: u32) -> bool {
        index >= 1 && index <= self.max
    }

    /// Picks a random instance count within the bounds.
    ///
    /// Unlimited maxima are capped by `max_multiplicity`. The result is
    /// never below 1 unless `max` forces it.
    pub fn random_range<R: Rng + ?Sized>(&self, rng: &mut R, max_multiplicity: u32) -> u32 {
        let span = if self.is_unlimited() {
            max_multiplicity
        } else {
            self.max - self.min + 1
        };
        let mut count = rng.gen_range(0..span.max(1));
        if count == 0 {
            count = 1;
        }
        count.clamp(self.min, self.max)
    }
}

impl Default for Multiplicity {
    fn default() -> Self {
        Self::ZERO_ONE
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unlimited() {
            write!(f, "{}..{SYMBOL_UNLIMITED}", self.min)
        } else {
            write!(f, "{}..{}", self.min, self.max)
        }
    }
}

fn parse_bound(raw: &str, can_be_unlimited: bool, source: &str) -> Result<i32> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case(SYMBOL_UNLIMITED) {
        return if can_be_unlimited {
            Ok(Multiplicity::N)
        } else {
            Err(Error::MalformedMultiplicity(source.to_owned()))
        };
    }
    raw.parse()
        .map_err(|_| Error::MalformedMultiplicity(source.to_owned()))
}

impl FromStr for Multiplicity {
    type Err = Error;

    /// Parses `min..max`, optionally wrapped in brackets (`[0..N]`).
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().trim_start_matches('[').trim_end_matches(']');
        let (min, max) = trimmed
            .split_once("..")
            .ok_or_else(|| Error::MalformedMultiplicity(s.to_owned()))?;
        Self::new(parse_bound(min, false, s)?, parse_bound(max, true, s)?)
    }
}

impl TryFrom<String> for Multiplicity {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Multiplicity> for String {
    fn from(value: Multiplicity) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn constants_are_well_formed() {
        assert!(Multiplicity::ZERO_ONE.is_optional());
        assert!(Multiplicity::ONE_ONE.is_required());
        assert!(Multiplicity::ZERO_N.is_unlimited());
        assert!(Multiplicity::ONE_N.is_multiple());
        assert_eq!(Multiplicity::new(1, Multiplicity::N).unwrap(), Multiplicity::ONE_N);
    }

    #[test]
    fn random_range_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let m = Multiplicity::new(2, 5).unwrap();
        for _ in 0..200 {
            let c = m.random_range(&mut rng, Multiplicity::RANDOM_MAX);
            assert!((2..=5).contains(&c));
        }
    }

    #[test]
    fn random_range_caps_unlimited() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let c = Multiplicity::ZERO_N.random_range(&mut rng, 4);
            assert!((1..=4).contains(&c));
        }
    }

    #[test]
    fn random_range_single_slot() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(Multiplicity::ONE_ONE.random_range(&mut rng, 10), 1);
        assert_eq!(Multiplicity::ZERO_ONE.random_range(&mut rng, 10), 1);
    }
}
