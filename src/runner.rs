//! Executes the binary under test once per fixture.
//!
//! Each invocation gets its own environment snapshot, the merged
//! stdout/stderr stream is captured through a single OS pipe, and a plain
//! text log is written beside the other fixture logs. There is no timeout:
//! a hung binary blocks the run.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::catalog::FixtureDefinition;
use crate::error::RunError;

/// Exit code recorded when the binary could not be launched at all.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = -1;

/// Placeholder for optional descriptive fields in logs and reports.
pub const NOT_AVAILABLE: &str = "n/a";

/// Pass/fail verdict of one fixture run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    pub fn from_exit_code(code: i32) -> Self {
        if code == 0 {
            Outcome::Pass
        } else {
            Outcome::Fail
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Pass => f.write_str("pass"),
            Outcome::Fail => f.write_str("fail"),
        }
    }
}

/// Immutable record of a single fixture execution.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FixtureResult {
    pub id: String,
    pub codec: Option<String>,
    pub container: Option<String>,
    pub frames: u64,
    pub result: Outcome,
    pub log: PathBuf,
    #[serde(rename = "duration_seconds", serialize_with = "serialize_secs")]
    pub duration: Duration,
    pub exit_code: i32,
}

impl FixtureResult {
    pub fn passed(&self) -> bool {
        self.result == Outcome::Pass
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Environment handed to every binary-under-test invocation.
///
/// Captured once from the caller; the verbosity default is applied to the
/// copy only, the process environment itself is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvOverlay {
    vars: BTreeMap<OsString, OsString>,
}

impl EnvOverlay {
    /// Snapshot the current process environment.
    pub fn capture(verbosity_var: &str, verbosity_default: &str) -> Self {
        Self::from_vars(std::env::vars_os(), verbosity_var, verbosity_default)
    }

    pub fn from_vars<I>(vars: I, verbosity_var: &str, verbosity_default: &str) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut vars: BTreeMap<OsString, OsString> = vars.into_iter().collect();
        vars.entry(OsString::from(verbosity_var))
            .or_insert_with(|| OsString::from(verbosity_default));
        Self { vars }
    }

    #[cfg(test)]
    fn get(&self, key: &str) -> Option<&std::ffi::OsStr> {
        self.vars.get(std::ffi::OsStr::new(key)).map(OsString::as_os_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsString, &OsString)> {
        self.vars.iter()
    }
}

/// Runs fixtures against one binary, writing logs under `log_dir`.
pub struct FixtureRunner {
    binary: PathBuf,
    log_dir: PathBuf,
    env: EnvOverlay,
}

struct Execution {
    exit_code: i32,
    output: String,
    duration: Duration,
}

impl FixtureRunner {
    pub fn new<B, L>(binary: B, log_dir: L, env: EnvOverlay) -> Self
    where
        B: Into<PathBuf>,
        L: Into<PathBuf>,
    {
        Self {
            binary: binary.into(),
            log_dir: log_dir.into(),
            env,
        }
    }

    pub fn log_path(&self, fixture: &FixtureDefinition) -> PathBuf {
        self.log_dir.join(format!("{}.log", fixture.id))
    }

    /// Execute the binary for `fixture` and record the outcome.
    ///
    /// A non-zero exit (or a binary that cannot be launched) is a `fail`
    /// result, not an error. Only failing to write the log is fatal.
    pub fn run(
        &self,
        fixture: &FixtureDefinition,
        asset_path: &Path,
    ) -> Result<FixtureResult, RunError> {
        let mut command = Command::new(&self.binary);
        command
            .arg("--headless")
            .arg("--input")
            .arg(asset_path)
            .arg("--frames")
            .arg(fixture.frames.to_string())
            .env_clear()
            .envs(self.env.iter())
            .stdin(Stdio::null());

        let start = Instant::now();
        let execution = match execute(command) {
            Ok((status, output)) => Execution {
                exit_code: exit_code(status),
                output,
                duration: start.elapsed(),
            },
            Err(err) => {
                log::warn!(
                    "[Runner] Failed to launch {} for {}: {}",
                    self.binary.display(),
                    fixture.id,
                    err
                );
                Execution {
                    exit_code: SPAWN_FAILURE_EXIT_CODE,
                    output: format!("failed to launch {}: {}\n", self.binary.display(), err),
                    duration: start.elapsed(),
                }
            }
        };

        let log_path = self.log_path(fixture);
        self.write_log(&log_path, fixture, asset_path, &execution)?;

        let result = Outcome::from_exit_code(execution.exit_code);
        tracing::info!(
            fixture = %fixture.id,
            exit_code = execution.exit_code,
            duration_ms = execution.duration.as_millis() as u64,
            "[Runner] Fixture finished: {}",
            result
        );

        Ok(FixtureResult {
            id: fixture.id.clone(),
            codec: fixture.codec.clone(),
            container: fixture.container.clone(),
            frames: fixture.frames,
            result,
            log: log_path,
            duration: execution.duration,
            exit_code: execution.exit_code,
        })
    }

    fn write_log(
        &self,
        log_path: &Path,
        fixture: &FixtureDefinition,
        asset_path: &Path,
        execution: &Execution,
    ) -> Result<(), RunError> {
        let log_error = |err: io::Error| RunError::LogWrite {
            path: log_path.to_path_buf(),
            reason: err.to_string(),
        };
        fs::create_dir_all(&self.log_dir).map_err(log_error)?;
        fs::write(log_path, render_log(fixture, asset_path, execution)).map_err(log_error)
    }
}

fn execute(mut command: Command) -> io::Result<(ExitStatus, String)> {
    let (mut reader, writer) = io::pipe()?;
    command.stdout(writer.try_clone()?).stderr(writer);
    let mut child = command.spawn()?;
    // The Command still owns the parent's write ends; EOF needs them closed.
    drop(command);

    let mut raw = Vec::new();
    let read = reader.read_to_end(&mut raw);
    let status = child.wait()?;
    read?;
    Ok((status, String::from_utf8_lossy(&raw).into_owned()))
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    SPAWN_FAILURE_EXIT_CODE
}

fn render_log(fixture: &FixtureDefinition, asset_path: &Path, execution: &Execution) -> String {
    let mut log = String::new();
    let _ = writeln!(log, "fixture: {}", fixture.id);
    let _ = writeln!(
        log,
        "codec: {}",
        fixture.codec.as_deref().unwrap_or(NOT_AVAILABLE)
    );
    let _ = writeln!(
        log,
        "container: {}",
        fixture.container.as_deref().unwrap_or(NOT_AVAILABLE)
    );
    let _ = writeln!(log, "file: {}", asset_path.display());
    let _ = writeln!(log, "frames: {}", fixture.frames);
    let _ = writeln!(log, "exit_code: {}", execution.exit_code);
    let _ = writeln!(
        log,
        "duration_seconds: {:.2}",
        execution.duration.as_secs_f64()
    );
    log.push_str("\n--- output ---\n");
    log.push_str(&execution.output);
    log
}
