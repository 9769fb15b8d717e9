use std::path::PathBuf;

use thiserror::Error;

/// Errors from running one subject.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: c4t_obs::Error,
    },
    #[error("recipe error: {0}")]
    Recipe(#[from] c4t_recipe::RecipeError),
    #[error("interpreter setup failed: {0}")]
    Setup(#[from] c4t_recipe::Error),
    #[error("build failed: {0}")]
    Build(#[from] c4t_recipe::InterpretError),
}

pub type Result<T> = std::result::Result<T, Error>;
