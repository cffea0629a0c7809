//! Configuration management for harness runs
//!
//! Defaults match the CI layout of the player repository. A JSON file can
//! overlay any subset of the fields, and the CLI applies its flags on top.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::provision::BuildMode;

/// Complete harness configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HarnessConfig {
    /// Fixture matrix JSON path
    pub fixtures: PathBuf,
    /// Suite tag to select from the matrix
    pub suite: String,
    /// Directory receiving one log per fixture
    pub log_dir: PathBuf,
    /// Markdown report output path
    pub report: PathBuf,
    /// Asset cache directory
    pub downloads_dir: PathBuf,
    /// Optional JSON summary output path
    pub summary_json: Option<PathBuf>,
    /// Skip invoking the build tool
    pub skip_build: bool,
    pub build_mode: BuildMode,
    pub build: BuildConfig,
    pub child_env: ChildEnvConfig,
}

/// Build collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuildConfig {
    /// Build tool executable
    pub program: String,
    /// Package selector passed as `-p`
    pub package: String,
    /// File name of the binary under test, without platform suffix
    pub binary_name: String,
    /// Root of the build output tree
    pub target_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            program: "cargo".to_string(),
            package: "slain-player".to_string(),
            binary_name: "slain".to_string(),
            target_dir: PathBuf::from("target"),
        }
    }
}

/// Environment defaults applied to each binary-under-test invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChildEnvConfig {
    /// Logging verbosity variable understood by the binary under test
    pub verbosity_var: String,
    /// Value used when the caller's environment leaves the variable unset
    pub verbosity_default: String,
}

impl Default for ChildEnvConfig {
    fn default() -> Self {
        Self {
            verbosity_var: "RUST_LOG".to_string(),
            verbosity_default: "info".to_string(),
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            fixtures: PathBuf::from("slain-player/fixtures/fixture_matrix.json"),
            suite: "smoke".to_string(),
            log_dir: PathBuf::from("artifacts/headless-logs"),
            report: PathBuf::from("artifacts/headless-report.md"),
            downloads_dir: PathBuf::from("slain-player/fixtures/downloads"),
            summary_json: None,
            skip_build: false,
            build_mode: BuildMode::Debug,
            build: BuildConfig::default(),
            child_env: ChildEnvConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a JSON file
    ///
    /// Missing files and invalid JSON fall back to the defaults with a
    /// warning so a stale config never blocks a CI run.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}
