//! Finite-state parser for verification tool output.
//!
//! Herd, Litmus7 and Rmem all print results in the same overall shape:
//!
//! ```text
//! <noise>
//! Test <name> Allowed|Required
//! <preamble>
//! <state count line>
//! <state line> x N
//! Ok|No|Undef
//! <postamble>
//! ```
//!
//! They only disagree on how the state count and the state lines look, and on
//! which banner lines before the test signal a partial run. Those three points
//! are the [`Dialect`] hooks; everything else is the shared automaton below.

mod herd;
mod line;
mod litmus;
mod rmem;


use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, debug_span, warn};

use crate::{Flag, Obs, State, Tag, TestType};

pub use herd::Herd;
pub use line::parse_values;
pub use litmus::Litmus;
pub use rmem::Rmem;

/// What went wrong on a line, or at end of input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("input is empty")]
    InputEmpty,
    #[error("no test line")]
    NoTest,
    #[error("no states")]
    NoStates,
    #[error("not enough states: {remaining} remaining")]
    NotEnoughStates { remaining: usize },
    #[error("no summary line")]
    NoSummary,
    #[error("test line has {0} fields, expected 3")]
    BadTestLine(usize),
    #[error("bad test type {0:?}")]
    BadTestType(String),
    #[error("bad state count: {0}")]
    BadStateCount(String),
    #[error("bad state line: {0}")]
    BadStateLine(String),
    #[error("bad summary: possible extraneous state line")]
    BadSummary,
}

/// Observation parser errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("line {line}: {kind} (at {text:?})")]
    Line {
        /// 1-based line number.
        line: usize,
        text: String,
        #[source]
        kind: ErrorKind,
    },
    #[error("unexpected end of input: {0}")]
    Eof(#[source] ErrorKind),
    #[error("no observation parser for dialect {0:?}")]
    NoImpl(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The underlying parse failure, if this is one.
    #[must_use]
    pub const fn kind(&self) -> Option<&ErrorKind> {
        match self {
            Self::Line { kind, .. } | Self::Eof(kind) => Some(kind),
            Self::NoImpl(_) | Self::Io(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A state line as split up by a dialect, before its values are checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateLine<'l> {
    pub tag: Tag,
    pub occurrences: u64,
    /// The `name=value;` tokens.
    pub rest: &'l str,
}

/// Per-tool syntax hooks for the shared automaton.
pub trait Dialect: Sync {
    /// Recognises the line announcing how many states follow.
    ///
    /// Returns `Ok(None)` for lines that aren't a state count.
    ///
    /// # Errors
    /// Returns [`ErrorKind::BadStateCount`] for a malformed count line.
    fn parse_state_count(&self, fields: &[&str]) -> std::result::Result<Option<usize>, ErrorKind>;

    /// Splits a state line into tag, occurrences and value tokens.
    ///
    /// # Errors
    /// Returns [`ErrorKind::BadStateLine`] if the line is not a state line.
    fn parse_state_line<'l>(
        &self,
        test_type: TestType,
        line: &'l str,
    ) -> std::result::Result<StateLine<'l>, ErrorKind>;

    /// Extracts flags from a line seen before the test line.
    fn parse_pre_test_line(&self, line: &str) -> Flag;
}

/// The dialects this crate knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DialectKind {
    Herd,
    Litmus,
    Rmem,
}

static HERD: Herd = Herd;
static LITMUS: Litmus = Litmus;
static RMEM: Rmem = Rmem;

impl DialectKind {
    pub const ALL: [Self; 3] = [Self::Herd, Self::Litmus, Self::Rmem];

    /// The hooks implementing this dialect.
    #[must_use]
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            Self::Herd => &HERD,
            Self::Litmus => &LITMUS,
            Self::Rmem => &RMEM,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Herd => "herd",
            Self::Litmus => "litmus7",
            Self::Rmem => "rmem",
        }
    }
}

impl FromStr for DialectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "herd" | "herd7" => Ok(Self::Herd),
            "litmus" | "litmus7" => Ok(Self::Litmus),
            "rmem" => Ok(Self::Rmem),
            _ => Err(Error::NoImpl(s.to_string())),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses a whole tool output stream into an observation.
///
/// Stops at the first bad line; line errors carry the 1-based line number and
/// the raw text. Bytes that aren't UTF-8 are replaced rather than rejected, so
/// stray encodings in lines the automaton skips can't fail the parse.
///
/// # Errors
/// Returns [`Error::Line`] for a malformed line, [`Error::Eof`] if the input
/// stops before the summary, and [`Error::Io`] if reading fails.
pub fn parse<R: BufRead>(dialect: &dyn Dialect, mut reader: R) -> Result<Obs> {
    let _span = debug_span!("parse_obs").entered();

    let mut fsa = Automaton::new(dialect);
    let mut buf = Vec::new();
    let mut line_no = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches(['\n', '\r']);
        fsa.feed(line).map_err(|kind| {
            warn!(line = line_no, error = %kind, "observation parse failed");
            Error::Line {
                line: line_no,
                text: line.to_string(),
                kind,
            }
        })?;
    }
    fsa.finish().map_err(|kind| {
        warn!(error = %kind, "observation ended early");
        Error::Eof(kind)
    })
}

/// Parses tool output held in memory.
///
/// # Errors
/// See [`parse`].
pub fn parse_str(dialect: &dyn Dialect, text: &str) -> Result<Obs> {
    parse(dialect, text.as_bytes())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Empty,
    PreTest,
    Preamble,
    State { remaining: usize, total: usize },
    Summary,
    Postamble,
}

struct Automaton<'d> {
    dialect: &'d dyn Dialect,
    phase: Phase,
    test_type: TestType,
    obs: Obs,
}

impl<'d> Automaton<'d> {
    fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            phase: Phase::Empty,
            test_type: TestType::None,
            obs: Obs::default(),
        }
    }

    fn feed(&mut self, line: &str) -> std::result::Result<(), ErrorKind> {
        match self.phase {
            Phase::Empty => {
                self.phase = Phase::PreTest;
                self.feed(line)
            }
            Phase::PreTest => self.pre_test_line(line),
            Phase::Preamble => self.preamble_line(line),
            Phase::State { remaining, total } => self.state_line(line, remaining, total),
            Phase::Summary => self.summary_line(line),
            Phase::Postamble => Ok(()),
        }
    }

    fn finish(self) -> std::result::Result<Obs, ErrorKind> {
        match self.phase {
            Phase::Postamble => Ok(self.obs),
            Phase::Empty => Err(ErrorKind::InputEmpty),
            Phase::PreTest => Err(ErrorKind::NoTest),
            Phase::Preamble => Err(ErrorKind::NoStates),
            // A count with no state lines at all reads as a missing state block.
            Phase::State { remaining, total } if remaining == total => Err(ErrorKind::NoStates),
            Phase::State { remaining, .. } => Err(ErrorKind::NotEnoughStates { remaining }),
            Phase::Summary => Err(ErrorKind::NoSummary),
        }
    }

    fn pre_test_line(&mut self, line: &str) -> std::result::Result<(), ErrorKind> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.first() != Some(&"Test") {
            self.obs.flags |= self.dialect.parse_pre_test_line(line);
            return Ok(());
        }

        if fields.len() != 3 {
            return Err(ErrorKind::BadTestLine(fields.len()));
        }
        self.test_type = fields[2].parse().map_err(ErrorKind::BadTestType)?;
        self.obs.flags |= self.test_type.flags();
        debug!(test = fields[1], test_type = %self.test_type, "test line");
        self.phase = Phase::Preamble;
        Ok(())
    }

    fn preamble_line(&mut self, line: &str) -> std::result::Result<(), ErrorKind> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match self.dialect.parse_state_count(&fields)? {
            None => {}
            Some(0) => self.phase = Phase::Summary,
            Some(total) => {
                self.phase = Phase::State {
                    remaining: total,
                    total,
                };
            }
        }
        Ok(())
    }

    fn state_line(
        &mut self,
        line: &str,
        remaining: usize,
        total: usize,
    ) -> std::result::Result<(), ErrorKind> {
        let state = self.parse_state(line)?;
        self.obs.states.push(state);

        let remaining = remaining - 1;
        self.phase = if remaining == 0 {
            Phase::Summary
        } else {
            Phase::State { remaining, total }
        };
        Ok(())
    }

    fn summary_line(&mut self, line: &str) -> std::result::Result<(), ErrorKind> {
        let Some(first) = line.split_whitespace().next() else {
            return Ok(());
        };

        let flag = match first {
            "Ok" => Flag::SAT,
            "No" => Flag::UNSAT,
            "Undef" => Flag::UNDEF,
            // Anything else is commentary, unless it looks like a state line:
            // that would mean the state count undercounted.
            _ if self.parse_state(line).is_ok() => return Err(ErrorKind::BadSummary),
            _ => return Ok(()),
        };
        self.obs.flags |= flag;
        self.phase = Phase::Postamble;
        Ok(())
    }

    fn parse_state(&self, line: &str) -> std::result::Result<State, ErrorKind> {
        let parsed = self.dialect.parse_state_line(self.test_type, line)?;
        Ok(State {
            tag: parsed.tag,
            occurrences: parsed.occurrences,
            values: parse_values(parsed.rest)?,
        })
    }
}
