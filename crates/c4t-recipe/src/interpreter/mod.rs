//! Recipe interpreter.
//!
//! Runs a recipe's instructions in order against a [`Driver`]. Inputs move
//! from a pool of declared files onto a stack of staged files; compile
//! instructions consume the top of the stack.
//!
//! The interpreter keeps its program counter, pool, stack and object counter
//! between calls, so after a failure the caller can fix whatever went wrong
//! and call [`Interpreter::interpret`] again to retry the failing instruction.

#[cfg(test)]
mod tests;

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, error, info_span};

use crate::{
    CancelToken, CompileJob, Driver, DriverError, FileKind, Instruction, Output, Recipe, Target,
};

/// Default cap on object files allocated by one interpreter.
pub const DEFAULT_MAX_OBJS: usize = 1000;

/// Why a file couldn't be staged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unavailable {
    /// The recipe never declared the file.
    Undeclared,
    /// The file was already staged.
    Consumed,
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Undeclared => "not declared by the recipe",
            Self::Consumed => "already consumed",
        })
    }
}

/// Interpreter errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no compiler driver configured")]
    DriverMissing,
    #[error("recipe output is {0}, cannot compile an executable")]
    BadOutput(Output),
    #[error("file {file:?} is unavailable: {reason}")]
    FileUnavailable { file: String, reason: Unavailable },
    #[error("object file limit of {max} reached")]
    ObjOverflow { max: usize },
    #[error("compiler driver failed: {0}")]
    Driver(#[from] DriverError),
}

/// An [`Error`] tagged with the instruction that raised it.
#[derive(Debug, Error)]
#[error("instruction {pc} ({instruction}): {source}")]
pub struct InterpretError {
    pub pc: usize,
    pub instruction: Instruction,
    pub source: Error,
}

/// Builder for [`Interpreter`].
pub struct InterpreterBuilder<'a> {
    driver: Option<&'a dyn Driver>,
    sink: Option<Box<dyn Write + 'a>>,
    output_path: Option<PathBuf>,
    max_objs: usize,
}

impl<'a> InterpreterBuilder<'a> {
    /// Compiler driver used for every compile instruction.
    #[must_use]
    pub fn driver(mut self, driver: &'a dyn Driver) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Where compiler diagnostics go. Defaults to discarding them.
    #[must_use]
    pub fn sink(mut self, sink: impl Write + 'a) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Path of the final executable. Defaults to `a.out` in the recipe directory.
    #[must_use]
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Maximum number of object files the recipe may allocate.
    #[must_use]
    pub const fn max_objs(mut self, max_objs: usize) -> Self {
        self.max_objs = max_objs;
        self
    }

    /// # Errors
    /// Returns [`Error::DriverMissing`] if no driver was set.
    pub fn build(self, recipe: Recipe) -> Result<Interpreter<'a>, Error> {
        let driver = self.driver.ok_or(Error::DriverMissing)?;
        let output_path = self
            .output_path
            .unwrap_or_else(|| recipe.dir.join("a.out"));
        let pool = recipe.files.iter().map(|f| (f.clone(), true)).collect();

        Ok(Interpreter {
            driver,
            sink: self.sink.unwrap_or_else(|| Box::new(io::sink())),
            output_path,
            max_objs: self.max_objs,
            recipe,
            pc: 0,
            pool,
            stack: Vec::new(),
            nobjs: 0,
        })
    }
}

/// Runs one recipe.
pub struct Interpreter<'a> {
    driver: &'a dyn Driver,
    sink: Box<dyn Write + 'a>,
    output_path: PathBuf,
    max_objs: usize,
    recipe: Recipe,
    pc: usize,
    /// Declared file name to whether it can still be staged.
    pool: FxHashMap<String, bool>,
    /// Staged file names, relative to the recipe directory.
    stack: Vec<String>,
    nobjs: usize,
}

impl<'a> Interpreter<'a> {
    #[must_use]
    pub fn builder() -> InterpreterBuilder<'a> {
        InterpreterBuilder {
            driver: None,
            sink: None,
            output_path: None,
            max_objs: DEFAULT_MAX_OBJS,
        }
    }

    /// Index of the next instruction to run.
    #[must_use]
    pub const fn pc(&self) -> usize {
        self.pc
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.pc >= self.recipe.instructions.len()
    }

    /// Currently staged files, oldest first.
    #[must_use]
    pub fn staged(&self) -> &[String] {
        &self.stack
    }

    /// Whether `file` is declared and not yet staged.
    #[must_use]
    pub fn is_available(&self, file: &str) -> bool {
        self.pool.get(file).copied().unwrap_or(false)
    }

    /// Number of object file names allocated so far.
    #[must_use]
    pub const fn objs_allocated(&self) -> usize {
        self.nobjs
    }

    /// Runs instructions from the current position to the end.
    ///
    /// On error the program counter stays on the failing instruction.
    ///
    /// # Errors
    /// Returns the first error, tagged with its instruction.
    pub fn interpret(&mut self, cancel: &CancelToken) -> Result<(), InterpretError> {
        let _span = info_span!("interpret", dir = %self.recipe.dir.display()).entered();

        while let Some(instruction) = self.recipe.instructions.get(self.pc).cloned() {
            debug!(pc = self.pc, %instruction, "step");
            if let Err(source) = self.step(&instruction, cancel) {
                error!(pc = self.pc, %instruction, error = %source, "recipe failed");
                return Err(InterpretError {
                    pc: self.pc,
                    instruction,
                    source,
                });
            }
            self.pc += 1;
        }
        Ok(())
    }

    fn step(&mut self, instruction: &Instruction, cancel: &CancelToken) -> Result<(), Error> {
        match instruction {
            Instruction::Nop => Ok(()),
            Instruction::PushInput { file } => self.push_input(file),
            Instruction::PushInputs { kind } => {
                self.push_inputs(*kind);
                Ok(())
            }
            Instruction::CompileObj { npops } => self.compile_obj(*npops, cancel),
            Instruction::CompileExe { npops } => self.compile_exe(*npops, cancel),
        }
    }

    fn push_input(&mut self, file: &str) -> Result<(), Error> {
        match self.pool.get_mut(file) {
            Some(available) if *available => {
                *available = false;
                self.stack.push(file.to_string());
                Ok(())
            }
            Some(_) => Err(Error::FileUnavailable {
                file: file.to_string(),
                reason: Unavailable::Consumed,
            }),
            None => Err(Error::FileUnavailable {
                file: file.to_string(),
                reason: Unavailable::Undeclared,
            }),
        }
    }

    fn push_inputs(&mut self, kind: FileKind) {
        for file in &self.recipe.files {
            let Some(available) = self.pool.get_mut(file) else {
                continue;
            };
            if *available && FileKind::classify(file).matches(kind) {
                *available = false;
                self.stack.push(file.clone());
            }
        }
    }

    fn compile_obj(&mut self, npops: i64, cancel: &CancelToken) -> Result<(), Error> {
        if self.nobjs >= self.max_objs {
            return Err(Error::ObjOverflow { max: self.max_objs });
        }
        // Not rolled back if the compile fails; a retry gets a new name.
        let name = format!("obj_{}.o", self.nobjs);
        self.nobjs += 1;

        let start = self.pop_start(npops);
        let output = self.recipe.path(&name);
        self.run(Target::Object, start, output, cancel)?;
        self.stack.push(name);
        Ok(())
    }

    fn compile_exe(&mut self, npops: i64, cancel: &CancelToken) -> Result<(), Error> {
        if self.recipe.output != Output::Executable {
            return Err(Error::BadOutput(self.recipe.output));
        }
        let start = self.pop_start(npops);
        self.run(Target::Executable, start, self.output_path.clone(), cancel)
    }

    /// Runs the driver on `stack[start..]`, and pops those files if it succeeds.
    fn run(
        &mut self,
        target: Target,
        start: usize,
        output: PathBuf,
        cancel: &CancelToken,
    ) -> Result<(), Error> {
        let inputs = self.stack[start..]
            .iter()
            .map(|f| self.recipe.path(f))
            .collect();
        let job = CompileJob::new(target, inputs, output);
        self.driver
            .run_compiler(&job, self.sink.as_mut(), cancel)?;
        self.stack.truncate(start);
        Ok(())
    }

    /// Stack index of the oldest file popped by a pop of `npops`.
    ///
    /// Zero, negative, or too-large counts pop the whole stack. This is a
    /// deliberate "compile everything staged" shorthand, not an error.
    fn pop_start(&self, npops: i64) -> usize {
        let depth = self.stack.len();
        match usize::try_from(npops) {
            Ok(n) if n > 0 && n <= depth => depth - n,
            _ => 0,
        }
    }
}
