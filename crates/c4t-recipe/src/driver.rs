//! Compiler drivers.

use std::fmt;
use std::io::{self, Read, Write};
use std::process::{Child, Command, Stdio};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info_span};

use crate::{CompileJob, Target};

/// Compiler driver errors.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("{command} exited with code {code}: {first_line}")]
    Failed {
        command: String,
        code: i32,
        first_line: String,
    },
    #[error("compilation cancelled")]
    Cancelled,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Shared flag for cancelling in-flight compiler runs.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Something that can run a single compile job.
pub trait Driver {
    /// Runs `job`, copying compiler diagnostics to `sink`.
    ///
    /// Implementations should stop early with [`DriverError::Cancelled`] once
    /// `cancel` fires.
    ///
    /// # Errors
    /// Returns an error if the compiler can't be run or fails.
    fn run_compiler(
        &self,
        job: &CompileJob,
        sink: &mut dyn Write,
        cancel: &CancelToken,
    ) -> Result<(), DriverError>;
}

/// Driver for compilers with a GCC-style command line (gcc, clang, cc).
///
/// Runs `<command> [args...] [-c] -o <output> <inputs...>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GccDriver {
    command: String,
    args: Vec<String>,
    poll_interval: Duration,
}

impl GccDriver {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            poll_interval: Duration::from_millis(20),
        }
    }

    #[must_use]
    pub fn gcc() -> Self {
        Self::new("gcc")
    }

    /// Adds arguments passed before the job's own arguments (e.g. `-O2`).
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Builds the command line for `job`.
    #[must_use]
    pub fn build_command(&self, job: &CompileJob) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args);
        if job.target == Target::Object {
            cmd.arg("-c");
        }
        cmd.arg("-o").arg(&job.output);
        cmd.args(&job.inputs);
        cmd
    }
}

impl Default for GccDriver {
    fn default() -> Self {
        Self::gcc()
    }
}

impl FromStr for GccDriver {
    type Err = String;

    /// Parses a command with optional leading arguments, e.g. `"clang -O3"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(command) = words.next() else {
            return Err("compiler command cannot be empty".to_string());
        };
        Ok(Self::new(command).with_args(words))
    }
}

impl fmt::Display for GccDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

impl Driver for GccDriver {
    fn run_compiler(
        &self,
        job: &CompileJob,
        sink: &mut dyn Write,
        cancel: &CancelToken,
    ) -> Result<(), DriverError> {
        if cancel.is_cancelled() {
            return Err(DriverError::Cancelled);
        }

        let _span = info_span!(
            "run_compiler",
            cc = %self.command,
            target = %job.target,
            output = %job.output.display()
        )
        .entered();

        let mut cmd = self.build_command(job);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        debug!(inputs = job.inputs.len(), "spawning compiler");

        let mut child = cmd.spawn().map_err(|source| {
            error!(error = %source, "failed to spawn compiler");
            DriverError::Spawn {
                command: self.command.clone(),
                source,
            }
        })?;

        // Drain pipes on their own threads so a chatty compiler can't block.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "failed to poll compiler");
                    stop(&mut child, stdout, stderr);
                    return Err(e.into());
                }
            }
            if cancel.is_cancelled() {
                stop(&mut child, stdout, stderr);
                debug!("compiler cancelled");
                return Err(DriverError::Cancelled);
            }
            thread::sleep(self.poll_interval);
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();
        sink.write_all(&stdout)?;
        sink.write_all(&stderr)?;

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&stderr);
            let stdout = String::from_utf8_lossy(&stdout);
            error!(exit_code = code, stderr = %stderr, "compiler failed");
            let first_line = stderr
                .lines()
                .next()
                .or_else(|| stdout.lines().next())
                .unwrap_or("unknown error")
                .to_string();
            return Err(DriverError::Failed {
                command: self.command.clone(),
                code,
                first_line,
            });
        }

        Ok(())
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf) {
                debug!(error = %e, "compiler pipe read failed");
            }
        }
        buf
    })
}

/// Kills and reaps a compiler that won't be waited on normally.
fn stop(child: &mut Child, stdout: JoinHandle<Vec<u8>>, stderr: JoinHandle<Vec<u8>>) {
    let _ = child.kill();
    let _ = child.wait();
    // Pipes close once the child is gone, so the drains finish.
    let _ = stdout.join();
    let _ = stderr.join();
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn job(target: Target) -> CompileJob {
        CompileJob::new(
            target,
            vec![PathBuf::from("d/a.c"), PathBuf::from("d/b.c")],
            "d/out",
        )
    }

    #[test]
    fn test_object_command_line() {
        let driver: GccDriver = "clang -O2 -pthread".parse().unwrap();
        let cmd = driver.build_command(&job(Target::Object));
        assert_eq!(cmd.get_program(), "clang");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, ["-O2", "-pthread", "-c", "-o", "d/out", "d/a.c", "d/b.c"]);
    }

    #[test]
    fn test_executable_command_line() {
        let cmd = GccDriver::gcc().build_command(&job(Target::Executable));
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, ["-o", "d/out", "d/a.c", "d/b.c"]);
    }

    #[test]
    fn test_parse_and_display() {
        assert!("".parse::<GccDriver>().is_err());
        assert!("   ".parse::<GccDriver>().is_err());
        let driver: GccDriver = "gcc-13  -O1".parse().unwrap();
        assert_eq!(driver.command(), "gcc-13");
        assert_eq!(driver.to_string(), "gcc-13 -O1");
    }

    #[test]
    fn test_spawn_failure() {
        let driver = GccDriver::new("c4t-no-such-compiler");
        let err = driver
            .run_compiler(&job(Target::Object), &mut io::sink(), &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, DriverError::Spawn { .. }), "{err}");
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = GccDriver::new("c4t-no-such-compiler")
            .run_compiler(&job(Target::Object), &mut io::sink(), &cancel)
            .unwrap_err();
        assert!(matches!(err, DriverError::Cancelled));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status() {
        let cancel = CancelToken::new();
        GccDriver::new("true")
            .run_compiler(&job(Target::Object), &mut io::sink(), &cancel)
            .unwrap();

        let err = GccDriver::new("false")
            .run_compiler(&job(Target::Object), &mut io::sink(), &cancel)
            .unwrap_err();
        assert!(matches!(err, DriverError::Failed { code: 1, .. }), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_stops_running_compiler() {
        // `sh -c 'exec sleep 5' ...` ignores the job arguments and just hangs.
        let driver = GccDriver::new("sh")
            .with_args(["-c", "exec sleep 5"])
            .with_poll_interval(Duration::from_millis(5));
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            trigger.cancel();
        });

        let start = std::time::Instant::now();
        let err = driver
            .run_compiler(&job(Target::Executable), &mut io::sink(), &cancel)
            .unwrap_err();
        canceller.join().unwrap();
        assert!(matches!(err, DriverError::Cancelled), "{err}");
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_diagnostics_reach_sink() {
        // `echo` prints its arguments, which stands in for compiler chatter.
        let mut sink = Vec::new();
        GccDriver::new("echo")
            .run_compiler(&job(Target::Object), &mut sink, &CancelToken::new())
            .unwrap();
        assert_eq!(String::from_utf8(sink).unwrap(), "-c -o d/out d/a.c d/b.c\n");
    }
}
