use std::fmt;
use std::str::FromStr;

use crate::{Flag, Tag};

/// Kind of assertion a litmus test makes, as declared on its `Test` line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TestType {
    /// No test line seen yet.
    #[default]
    None,
    /// Existential test (`exists`): the condition may be reachable.
    Allowed,
    /// Universal test (`forall`): the condition must always hold.
    Required,
}

impl TestType {
    /// Flags implied by this test type.
    #[must_use]
    pub const fn flags(self) -> Flag {
        match self {
            Self::Allowed => Flag::EXIST,
            Self::None | Self::Required => Flag::NONE,
        }
    }

    /// Resolves a histogram sigil to a state tag.
    ///
    /// Witnesses and counter-examples swap sigils between existential and
    /// universal tests. Returns `None` for characters that are not sigils.
    #[must_use]
    pub const fn tag_for_sigil(self, sigil: char) -> Option<Tag> {
        match (self, sigil) {
            (Self::Allowed, '*') | (Self::Required, ':') => Some(Tag::Witness),
            (Self::Allowed, ':') | (Self::Required, '*') => Some(Tag::Counter),
            (Self::None, '*' | ':') => Some(Tag::Unknown),
            _ => None,
        }
    }
}

impl FromStr for TestType {
    type Err = String;

    /// Parses the third field of a `Test` line. Case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Allowed" => Ok(Self::Allowed),
            "Required" => Ok(Self::Required),
            _ => Err(s.to_string()),
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::Allowed => "Allowed",
            Self::Required => "Required",
        };
        f.write_str(name)
    }
}
