//! CLI definitions and argument types.

use std::path::PathBuf;

use c4t::DialectKind;
use clap::{Parser, Subcommand, ValueEnum};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "c4t")]
#[command(about = "Memory-model testing harness - builds lifted tests and parses tool output")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default tracing directive for the chosen verbosity.
    #[must_use]
    pub const fn log_directive(&self) -> &'static str {
        if self.verbose {
            "c4t=debug"
        } else if self.silent {
            "c4t=warn"
        } else {
            "c4t=info"
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse verification tool output into observations
    Obs {
        /// Tool output files
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Which tool produced the files
        #[arg(short, long, value_enum)]
        dialect: DialectArg,

        /// Print a human-readable summary instead of JSON
        #[arg(long)]
        pretty: bool,

        /// With --pretty, only show witness and counter-example states
        #[arg(long, requires = "pretty")]
        interesting: bool,
    },
    /// Run a build recipe through a C compiler
    Recipe {
        /// Recipe JSON file
        #[arg(value_name = "RECIPE")]
        recipe: PathBuf,

        /// C compiler command (e.g., gcc, clang-20, "cc -O2")
        #[arg(long, default_value = "gcc")]
        cc: String,

        /// Extra argument passed to every compiler call (repeatable)
        #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
        args: Vec<String>,

        /// Maximum number of object files the recipe may create
        #[arg(long, default_value_t = c4t::DEFAULT_MAX_OBJS)]
        max_objs: usize,

        /// Executable output path (defaults to a.out in the recipe directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Observation dialect.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DialectArg {
    #[value(alias = "herd7")]
    Herd,
    #[value(name = "litmus7", alias = "litmus")]
    Litmus,
    Rmem,
}

impl From<DialectArg> for DialectKind {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Herd => Self::Herd,
            DialectArg::Litmus => Self::Litmus,
            DialectArg::Rmem => Self::Rmem,
        }
    }
}
