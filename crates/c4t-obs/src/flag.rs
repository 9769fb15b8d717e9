//! Observation flags.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error decoding a flag name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown observation flag {0:?}")]
pub struct FlagError(pub String);

/// Set of observation flags.
///
/// Bits are independent: a tool can report, say, both `sat` and `partial`.
/// The textual form is the alphabetically sorted, space-separated list of set
/// flag names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Flag(u8);

impl Flag {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// The test's condition was satisfied.
    pub const SAT: Self = Self(1 << 0);
    /// The test's condition was not satisfied.
    pub const UNSAT: Self = Self(1 << 1);
    /// The tool hit undefined behaviour.
    pub const UNDEF: Self = Self(1 << 2);
    /// The test is existential (`Allowed`).
    pub const EXIST: Self = Self(1 << 3);
    /// The tool only explored part of the state space.
    pub const PARTIAL: Self = Self(1 << 4);

    /// Every flag, keyed by name, in encoding order.
    const NAMES: [(Self, &'static str); 5] = [
        (Self::EXIST, "exist"),
        (Self::PARTIAL, "partial"),
        (Self::SAT, "sat"),
        (Self::UNDEF, "undef"),
        (Self::UNSAT, "unsat"),
    ];

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Builds a flag set from raw bits, dropping unknown bits.
    #[must_use]
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & 0b1_1111)
    }

    /// True if any bit of `flag` is set.
    #[must_use]
    pub const fn has(self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether an observation with these flags is worth looking at.
    ///
    /// Interesting means: undefined behaviour, a satisfied existential, a
    /// failed universal, or no verdict at all.
    #[must_use]
    pub const fn is_interesting(self) -> bool {
        let sat = self.has(Self::SAT);
        let unsat = self.has(Self::UNSAT);
        let exist = self.has(Self::EXIST);
        self.has(Self::UNDEF) || (sat && exist) || (unsat && !exist) || (!sat && !unsat)
    }

    #[must_use]
    pub const fn is_partial(self) -> bool {
        self.has(Self::PARTIAL)
    }

    /// Names of the set flags, sorted.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(flag, _)| self.has(*flag))
            .map(|(_, name)| name)
    }

    /// Looks up a single flag by name.
    ///
    /// # Errors
    /// Returns an error if `name` is not a flag name.
    pub fn from_name(name: &str) -> Result<Self, FlagError> {
        Self::NAMES
            .into_iter()
            .find(|(_, n)| *n == name)
            .map(|(flag, _)| flag)
            .ok_or_else(|| FlagError(name.to_string()))
    }
}

impl BitOr for Flag {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for Flag {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.names().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

impl FromStr for Flag {
    type Err = FlagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace()
            .try_fold(Self::NONE, |acc, name| Ok(acc | Self::from_name(name)?))
    }
}

impl Serialize for Flag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        names.iter().try_fold(Self::NONE, |acc, name| {
            Self::from_name(name)
                .map(|flag| acc | flag)
                .map_err(D::Error::custom)
        })
    }
}
