//! Recipe interpretation command.

use std::path::{Path, PathBuf};

use c4t::{Error, GccDriver, Recipe, RunOptions, run_recipe};
use tracing::{error, info};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal::{self, Spinner};

/// Handle the `recipe` command.
pub fn cmd_recipe(
    path: &Path,
    cc: &str,
    args: &[String],
    max_objs: usize,
    output: Option<&Path>,
    silent: bool,
) -> i32 {
    let recipe = match Recipe::load(path) {
        Ok(recipe) => recipe,
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to load recipe");
            terminal::error(&format!("{}: {e}", path.display()));
            return EXIT_FAILURE;
        }
    };

    let driver = match cc.parse::<GccDriver>() {
        Ok(driver) => driver.with_args(args.iter().cloned()),
        Err(e) => {
            error!(error = %e, "invalid compiler");
            return EXIT_FAILURE;
        }
    };
    info!(recipe = %path.display(), cc = %driver, instructions = recipe.instructions.len(), "running recipe");

    let executable = output.map_or_else(|| recipe.path("a.out"), Path::to_path_buf);
    let produces_exe = recipe.output == c4t::Output::Executable;
    let options = RunOptions::default()
        .with_max_objs(max_objs)
        .with_output(output.map(PathBuf::from));

    let spinner = if silent {
        Spinner::hidden()
    } else {
        Spinner::new(format!("Building {}", recipe.dir.display()))
    };
    let run = run_recipe(recipe, &driver, &options);
    spinner.finish_and_clear();
    if !run.log.is_empty() {
        eprint!("{}", String::from_utf8_lossy(&run.log));
    }

    match run.result {
        Ok(()) => {
            if !silent {
                terminal::success("Recipe complete");
                if produces_exe {
                    terminal::path_output(&executable);
                }
            }
            EXIT_SUCCESS
        }
        Err(e) => {
            if let Error::Build(e) = &e {
                error!(pc = e.pc, instruction = %e.instruction, "recipe stopped");
            }
            terminal::error(&e.to_string());
            EXIT_FAILURE
        }
    }
}
