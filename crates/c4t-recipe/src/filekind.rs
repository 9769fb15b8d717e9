//! File-kind classification.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Kind of a recipe file, or a group of kinds.
///
/// Single kinds are one bit each; groups (`C`, `Any`) are unions used as
/// patterns for [`FileKind::matches`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileKind(u8);

impl FileKind {
    pub const OTHER: Self = Self(1 << 0);
    /// Executable binary (no extension).
    pub const BIN: Self = Self(1 << 1);
    /// Object file (`.o`).
    pub const OBJ: Self = Self(1 << 2);
    /// C source (`.c`).
    pub const C_SRC: Self = Self(1 << 3);
    /// C header (`.h`).
    pub const C_HEADER: Self = Self(1 << 4);
    /// Any C file.
    pub const C: Self = Self(Self::C_SRC.0 | Self::C_HEADER.0);
    /// Any file at all.
    pub const ANY: Self = Self(0b1_1111);

    const NAMES: [(Self, &'static str); 7] = [
        (Self::OTHER, "other"),
        (Self::BIN, "bin"),
        (Self::OBJ, "obj"),
        (Self::C_SRC, "csrc"),
        (Self::C_HEADER, "cheader"),
        (Self::C, "c"),
        (Self::ANY, "any"),
    ];

    /// Classifies a file by its extension.
    #[must_use]
    pub fn classify(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            None => Self::BIN,
            Some("c") => Self::C_SRC,
            Some("h") => Self::C_HEADER,
            Some("o") => Self::OBJ,
            Some(_) => Self::OTHER,
        }
    }

    /// True if every bit of this kind is covered by `pattern`.
    #[must_use]
    pub const fn matches(self, pattern: Self) -> bool {
        self.0 != 0 && (self.0 & pattern.0) == self.0
    }

    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        let mut i = 0;
        while i < Self::NAMES.len() {
            if Self::NAMES[i].0.0 == self.0 {
                return Some(Self::NAMES[i].1);
            }
            i += 1;
        }
        None
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "kind({:#07b})", self.0),
        }
    }
}

impl FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::NAMES
            .into_iter()
            .find(|(_, name)| *name == s)
            .map(|(kind, _)| kind)
            .ok_or_else(|| format!("unknown file kind {s:?}"))
    }
}

impl Serialize for FileKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FileKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(D::Error::custom)
    }
}
