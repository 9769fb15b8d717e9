//! c4t - differential testing for memory-model tooling.
//!
//! Runs backend build recipes and parses verification tool output into
//! observations, one subject at a time or in batch.
//!
//! # Example
//!
//! ```ignore
//! use c4t::{DialectKind, parse_obs_file};
//!
//! let obs = parse_obs_file(DialectKind::Litmus, "sb.litmus.out".as_ref())?;
//! println!("interesting: {}", obs.is_interesting());
//! ```

// Re-export from sub-crates
pub use c4t_obs::{
    self as obs, Dialect, DialectKind, Flag, Obs, PrettyOptions, State, Tag, TestType,
};
pub use c4t_recipe::{
    self as recipe, CancelToken, CompileJob, DEFAULT_MAX_OBJS, Driver, DriverError, FileKind,
    GccDriver, Instruction, InterpretError, Interpreter, Output, Recipe, RecipeError, Target,
};

mod batch;
mod error;

pub use batch::*;
pub use error::{Error, Result};
