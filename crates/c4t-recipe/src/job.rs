use std::fmt;
use std::path::PathBuf;

/// What a compile job produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Object,
    Executable,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Object => "object",
            Self::Executable => "executable",
        })
    }
}

/// A single compiler invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileJob {
    pub target: Target,
    /// Input files, in command-line order.
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

impl CompileJob {
    #[must_use]
    pub fn new(target: Target, inputs: Vec<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            target,
            inputs,
            output: output.into(),
        }
    }
}
