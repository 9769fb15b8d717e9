//! Batch helpers shared by the CLI and tests.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info_span};

use c4t_obs::{DialectKind, Obs};
use c4t_recipe::{CancelToken, DEFAULT_MAX_OBJS, Driver, Interpreter, Recipe};

use crate::{Error, Result};

/// Parses one tool output file.
///
/// # Errors
/// Returns an error if the file can't be opened or doesn't parse.
pub fn parse_obs_file(dialect: DialectKind, path: &Path) -> Result<Obs> {
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    c4t_obs::parse(dialect.dialect(), BufReader::new(file)).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Outcome of parsing one file in a batch.
#[derive(Debug)]
pub struct ObsReport {
    pub path: PathBuf,
    pub result: Result<Obs>,
}

impl ObsReport {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Parses many files in parallel.
///
/// A failure in one file doesn't stop the others. Reports come back in input
/// order. `on_done` runs once per file as it finishes, from any thread.
pub fn parse_obs_files<F>(dialect: DialectKind, paths: &[PathBuf], on_done: F) -> Vec<ObsReport>
where
    F: Fn(&ObsReport) + Sync,
{
    let _span = info_span!("parse_obs_files", %dialect, files = paths.len()).entered();
    paths
        .par_iter()
        .map(|path| {
            let report = ObsReport {
                path: path.clone(),
                result: parse_obs_file(dialect, path),
            };
            on_done(&report);
            report
        })
        .collect()
}

/// Options for [`run_recipe`].
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub max_objs: usize,
    /// Overrides the recipe's default executable path.
    pub output: Option<PathBuf>,
    pub cancel: CancelToken,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_objs: DEFAULT_MAX_OBJS,
            output: None,
            cancel: CancelToken::new(),
        }
    }
}

impl RunOptions {
    #[must_use]
    pub const fn with_max_objs(mut self, max_objs: usize) -> Self {
        self.max_objs = max_objs;
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }
}

/// Outcome of one recipe run.
#[derive(Debug)]
pub struct RecipeRun {
    /// Everything the compiler printed, including on the failing call.
    pub log: Vec<u8>,
    pub result: Result<()>,
}

/// Runs a recipe to completion, collecting the compiler's combined output.
///
/// The log is kept whether or not the run succeeds.
pub fn run_recipe(recipe: Recipe, driver: &dyn Driver, options: &RunOptions) -> RecipeRun {
    let mut log = Vec::new();
    let result = interpret_into(recipe, driver, options, &mut log);
    RecipeRun { log, result }
}

fn interpret_into(
    recipe: Recipe,
    driver: &dyn Driver,
    options: &RunOptions,
    log: &mut Vec<u8>,
) -> Result<()> {
    let mut builder = Interpreter::builder()
        .driver(driver)
        .sink(log)
        .max_objs(options.max_objs);
    if let Some(output) = &options.output {
        builder = builder.output_path(output.clone());
    }
    let mut interp = builder.build(recipe)?;
    interp.interpret(&options.cancel)?;
    debug!(objs = interp.objs_allocated(), "recipe finished");
    Ok(())
}
