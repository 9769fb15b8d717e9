//! Build recipes and their interpreter.
//!
//! A backend lifts a litmus test into a [`Recipe`]: a directory of generated
//! files plus a short instruction list saying how to compile them. The
//! [`Interpreter`] runs that list against a compiler [`Driver`].
//!
//! ```ignore
//! use c4t_recipe::{CancelToken, GccDriver, Interpreter, Recipe};
//!
//! let recipe = Recipe::builder("out/sb").add_files(["sb.c", "sb.h"]).compile_all_c_to_exe().build();
//! let driver = GccDriver::gcc();
//! let mut interp = Interpreter::builder().driver(&driver).build(recipe)?;
//! interp.interpret(&CancelToken::new())?;
//! ```

mod driver;
mod filekind;
mod interpreter;
mod job;
mod recipe;

pub use driver::*;
pub use filekind::*;
pub use interpreter::*;
pub use job::*;
pub use recipe::*;
