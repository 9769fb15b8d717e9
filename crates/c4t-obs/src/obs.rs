use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::{Flag, State, Tag};

/// A parsed observation: the verdict flags plus every reported state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obs {
    #[serde(default, skip_serializing_if = "no_flags")]
    pub flags: Flag,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<State>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn no_flags(flags: &Flag) -> bool {
    flags.is_empty()
}

/// What [`Obs::pretty`] should print.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrettyOptions {
    /// Print the flag line.
    pub flags: bool,
    /// Only print witnesses and counter-examples.
    pub interesting_only: bool,
}

impl Obs {
    #[must_use]
    pub const fn is_interesting(&self) -> bool {
        self.flags.is_interesting()
    }

    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.flags.is_partial()
    }

    /// States tagged as witnesses.
    pub fn witnesses(&self) -> impl Iterator<Item = &State> {
        self.states_tagged(Tag::Witness)
    }

    /// States tagged as counter-examples.
    pub fn counter_examples(&self) -> impl Iterator<Item = &State> {
        self.states_tagged(Tag::Counter)
    }

    fn states_tagged(&self, tag: Tag) -> impl Iterator<Item = &State> {
        self.states.iter().filter(move |s| s.tag == tag)
    }

    /// Writes a human-readable rendering of this observation.
    ///
    /// # Errors
    /// Returns any error from the writer.
    pub fn pretty<W: Write>(&self, w: &mut W, options: PrettyOptions) -> io::Result<()> {
        if options.flags {
            if self.flags.is_empty() {
                writeln!(w, "flags: (none)")?;
            } else {
                writeln!(w, "flags: {}", self.flags)?;
            }
        }

        for state in &self.states {
            let marker = match state.tag {
                Tag::Witness => '*',
                Tag::Counter => ':',
                Tag::Unknown if options.interesting_only => continue,
                Tag::Unknown => ' ',
            };
            if state.occurrences == 0 {
                writeln!(w, "{marker} {state}")?;
            } else {
                writeln!(w, "{marker} {state} ({}x)", state.occurrences)?;
            }
        }
        Ok(())
    }
}
