//! Locating (and optionally building) the binary under test.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::config::BuildConfig;
use crate::error::ProvisionError;

/// Build profile of the binary under test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    #[default]
    Debug,
    Release,
}

impl BuildMode {
    /// Output subdirectory the build tool uses for this profile.
    pub fn profile_dir(&self) -> &'static str {
        match self {
            BuildMode::Debug => "debug",
            BuildMode::Release => "release",
        }
    }
}

/// Drives the external build tool and resolves the executable path.
pub struct BinaryProvisioner {
    build: BuildConfig,
}

impl BinaryProvisioner {
    pub fn new(build: BuildConfig) -> Self {
        Self { build }
    }

    /// Deterministic executable path for `mode`, without any filesystem check.
    pub fn locate(&self, mode: BuildMode) -> PathBuf {
        self.build.target_dir.join(mode.profile_dir()).join(format!(
            "{}{}",
            self.build.binary_name,
            std::env::consts::EXE_SUFFIX
        ))
    }

    /// Build the package in `mode` and return the verified executable path.
    pub fn provision(&self, mode: BuildMode) -> Result<PathBuf, ProvisionError> {
        let args = self.build_args(mode);
        let rendered = format!("{} {}", self.build.program, args.join(" "));
        log::info!("[Provision] Running `{}`", rendered);

        // Build output streams straight to the console.
        let status = Command::new(&self.build.program)
            .args(&args)
            .stdin(Stdio::null())
            .status()
            .map_err(|err| ProvisionError::BuildSpawn {
                program: self.build.program.clone(),
                reason: err.to_string(),
            })?;
        if !status.success() {
            return Err(ProvisionError::BuildFailed {
                command: rendered,
                exit_code: status.code(),
            });
        }

        let binary = self.locate(mode);
        if !binary.exists() {
            return Err(ProvisionError::BinaryNotFound { path: binary });
        }
        log::info!("[Provision] Binary ready at {}", binary.display());
        Ok(binary)
    }

    fn build_args(&self, mode: BuildMode) -> Vec<String> {
        let mut args = vec![
            "build".to_string(),
            "-p".to_string(),
            self.build.package.clone(),
        ];
        if mode == BuildMode::Release {
            args.push("--release".to_string());
        }
        args
    }
}
