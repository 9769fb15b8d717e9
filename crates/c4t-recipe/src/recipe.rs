//! Recipe data model.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::FileKind;

/// Recipe decoding errors.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("unknown opcode {0:?}")]
    BadOp(String),
    #[error("{op} is missing its {operand} operand")]
    MissingOperand { op: Op, operand: &'static str },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a recipe is allowed to produce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Output {
    #[default]
    #[serde(rename = "nothing")]
    Nothing,
    #[serde(rename = "obj")]
    Object,
    #[serde(rename = "exe")]
    Executable,
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nothing => "nothing",
            Self::Object => "obj",
            Self::Executable => "exe",
        })
    }
}

/// Instruction opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Nop,
    PushInput,
    PushInputs,
    CompileObj,
    CompileExe,
}

impl Op {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nop => "nop",
            Self::PushInput => "push_input",
            Self::PushInputs => "push_inputs",
            Self::CompileObj => "compile_obj",
            Self::CompileExe => "compile_exe",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Op {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nop" => Ok(Self::Nop),
            "push_input" => Ok(Self::PushInput),
            "push_inputs" => Ok(Self::PushInputs),
            "compile_obj" => Ok(Self::CompileObj),
            "compile_exe" => Ok(Self::CompileExe),
            _ => Err(RecipeError::BadOp(s.to_string())),
        }
    }
}

/// One step of a recipe.
///
/// `npops` counts staged files to compile; zero, negative, or more than are
/// staged all mean "everything staged so far".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawInstruction", into = "RawInstruction")]
pub enum Instruction {
    Nop,
    /// Stage one input file.
    PushInput { file: String },
    /// Stage every still-available input file of a kind.
    PushInputs { kind: FileKind },
    /// Compile staged files to a fresh object file and stage that.
    CompileObj { npops: i64 },
    /// Compile staged files to the final executable.
    CompileExe { npops: i64 },
}

impl Instruction {
    #[must_use]
    pub const fn op(&self) -> Op {
        match self {
            Self::Nop => Op::Nop,
            Self::PushInput { .. } => Op::PushInput,
            Self::PushInputs { .. } => Op::PushInputs,
            Self::CompileObj { .. } => Op::CompileObj,
            Self::CompileExe { .. } => Op::CompileExe,
        }
    }

    pub fn push_input(file: impl Into<String>) -> Self {
        Self::PushInput { file: file.into() }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nop => write!(f, "{}", self.op()),
            Self::PushInput { file } => write!(f, "{} {file:?}", self.op()),
            Self::PushInputs { kind } => write!(f, "{} {kind}", self.op()),
            Self::CompileObj { npops } | Self::CompileExe { npops } => {
                write!(f, "{} {npops}", self.op())
            }
        }
    }
}

/// Wire form of an instruction: an opcode name plus whichever operand it uses.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawInstruction {
    op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<FileKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    npops: Option<i64>,
}

impl TryFrom<RawInstruction> for Instruction {
    type Error = RecipeError;

    fn try_from(raw: RawInstruction) -> Result<Self, Self::Error> {
        let op: Op = raw.op.parse()?;
        let missing = |operand| RecipeError::MissingOperand { op, operand };
        Ok(match op {
            Op::Nop => Self::Nop,
            Op::PushInput => Self::PushInput {
                file: raw.file.ok_or_else(|| missing("file"))?,
            },
            Op::PushInputs => Self::PushInputs {
                kind: raw.kind.ok_or_else(|| missing("kind"))?,
            },
            // A missing pop count means "everything staged".
            Op::CompileObj => Self::CompileObj {
                npops: raw.npops.unwrap_or(0),
            },
            Op::CompileExe => Self::CompileExe {
                npops: raw.npops.unwrap_or(0),
            },
        })
    }
}

impl From<Instruction> for RawInstruction {
    fn from(instruction: Instruction) -> Self {
        let mut raw = Self {
            op: instruction.op().name().to_string(),
            file: None,
            kind: None,
            npops: None,
        };
        match instruction {
            Instruction::Nop => {}
            Instruction::PushInput { file } => raw.file = Some(file),
            Instruction::PushInputs { kind } => raw.kind = Some(kind),
            Instruction::CompileObj { npops } | Instruction::CompileExe { npops } => {
                raw.npops = Some(npops);
            }
        }
        raw
    }
}

/// A build plan for one lifted litmus test.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Directory holding the recipe's files.
    pub dir: PathBuf,
    #[serde(default)]
    pub output: Output,
    /// Input file names, relative to `dir`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instructions: Vec<Instruction>,
}

impl Recipe {
    pub fn builder(dir: impl Into<PathBuf>) -> RecipeBuilder {
        RecipeBuilder {
            recipe: Self {
                dir: dir.into(),
                ..Self::default()
            },
        }
    }

    /// Resolves a file name against the recipe directory.
    #[must_use]
    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Paths of all input files.
    pub fn paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.files.iter().map(|f| self.path(f))
    }

    /// Decodes a recipe from JSON.
    ///
    /// # Errors
    /// Returns an error for malformed JSON or unknown opcodes.
    pub fn from_json(text: &str) -> Result<Self, RecipeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, RecipeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads a JSON recipe from disk.
    ///
    /// # Errors
    /// Returns an error if the file can't be read or decoded.
    pub fn load(path: &Path) -> Result<Self, RecipeError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

/// Builder for [`Recipe`].
#[derive(Clone, Debug)]
pub struct RecipeBuilder {
    recipe: Recipe,
}

impl RecipeBuilder {
    #[must_use]
    pub const fn output(mut self, output: Output) -> Self {
        self.recipe.output = output;
        self
    }

    #[must_use]
    pub fn add_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recipe.files.extend(files.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn add_instructions(mut self, instructions: impl IntoIterator<Item = Instruction>) -> Self {
        self.recipe.instructions.extend(instructions);
        self
    }

    /// Compiles every C source file straight to the executable.
    #[must_use]
    pub fn compile_all_c_to_exe(self) -> Self {
        self.output(Output::Executable).add_instructions([
            Instruction::PushInputs {
                kind: FileKind::C_SRC,
            },
            Instruction::CompileExe { npops: 0 },
        ])
    }

    /// Compiles a single file to an object.
    #[must_use]
    pub fn compile_file_to_obj(self, file: impl Into<String>) -> Self {
        self.output(Output::Object).add_instructions([
            Instruction::push_input(file),
            Instruction::CompileObj { npops: 1 },
        ])
    }

    #[must_use]
    pub fn build(self) -> Recipe {
        self.recipe
    }
}
