//! Command implementations.

mod obs;
mod recipe;

use c4t::PrettyOptions;

use crate::cli::{Cli, Commands};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Obs {
            files,
            dialect,
            pretty,
            interesting,
        } => {
            let pretty = pretty.then_some(PrettyOptions {
                flags: true,
                interesting_only: *interesting,
            });
            obs::cmd_obs(files, (*dialect).into(), pretty, cli.silent)
        }
        Commands::Recipe {
            recipe,
            cc,
            args,
            max_objs,
            output,
        } => recipe::cmd_recipe(recipe, cc, args, *max_objs, output.as_deref(), cli.silent),
    }
}
