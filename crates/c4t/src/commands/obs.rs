//! Observation parsing command.

use std::io::{self, Write};
use std::path::PathBuf;

use c4t::{DialectKind, Obs, ObsReport, PrettyOptions, parse_obs_files};
use tracing::{error, info};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal::{self, Progress};

/// Handle the `obs` command.
pub fn cmd_obs(
    files: &[PathBuf],
    dialect: DialectKind,
    pretty: Option<PrettyOptions>,
    silent: bool,
) -> i32 {
    info!(%dialect, files = files.len(), "parsing observations");

    let progress = if silent || files.len() < 2 {
        Progress::hidden()
    } else {
        Progress::new(files.len() as u64, "Parsing")
    };
    let reports = parse_obs_files(dialect, files, |_| progress.inc(1));
    progress.finish();

    let mut failed = 0usize;
    let mut out = io::stdout().lock();
    for report in &reports {
        let ObsReport { path, result } = report;
        let written = match (result, pretty) {
            (Ok(obs), Some(options)) => write_pretty(&mut out, path, obs, options),
            (Ok(obs), None) => write_json(&mut out, path, obs),
            (Err(e), _) => {
                failed += 1;
                terminal::error(&e.to_string());
                continue;
            }
        };
        if let Err(e) = written {
            error!(error = %e, "failed to write output");
            return EXIT_FAILURE;
        }
    }

    if failed > 0 {
        if !silent {
            terminal::warning(&format!("{failed} of {} files failed to parse", reports.len()));
        }
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    }
}

/// One JSON line per file.
fn write_json(out: &mut impl Write, path: &std::path::Path, obs: &Obs) -> io::Result<()> {
    let line = serde_json::json!({
        "file": path.display().to_string(),
        "obs": obs,
    });
    writeln!(out, "{line}")
}

fn write_pretty(
    out: &mut impl Write,
    path: &std::path::Path,
    obs: &Obs,
    options: PrettyOptions,
) -> io::Result<()> {
    let verdict = if obs.is_interesting() {
        "interesting"
    } else {
        "boring"
    };
    writeln!(out, "# {} ({verdict})", path.display())?;
    obs.pretty(out, options)
}
