//! Observations of litmus test runs.
//!
//! An [`Obs`] is the canonical record of what a verification tool (Herd,
//! Litmus7 or Rmem) reported for one litmus test: a [`Flag`] set and the list
//! of [`State`]s the tool saw. The [`parser`] module turns raw tool output into
//! observations.

mod flag;
mod obs;
pub mod parser;
mod state;
mod test_type;

pub use flag::*;
pub use obs::*;
pub use parser::{Dialect, DialectKind, Error, ErrorKind, parse, parse_str};
pub use state::*;
pub use test_type::*;
