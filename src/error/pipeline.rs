// Pipeline stage error types: asset cache, provisioning, fixture runs, reporting

use crate::error::ErrorCode;
use std::fmt;
use std::path::PathBuf;

/// Pipeline error code constants
///
/// Error code ranges:
/// - 3001-3003: asset cache
/// - 4001-4003: binary provisioning
/// - 5001: fixture runner
/// - 6001-6002: report output
pub struct PipelineErrorCodes {}

impl PipelineErrorCodes {
    /// Asset cache directory could not be created
    pub const CACHE_DIR: i32 = 3001;

    /// Network fetch of a fixture asset failed
    pub const DOWNLOAD_FAILED: i32 = 3002;

    /// Downloaded bytes could not be stored in the cache
    pub const STORAGE_FAILED: i32 = 3003;

    /// Build tool could not be launched
    pub const BUILD_SPAWN: i32 = 4001;

    /// Build tool exited non-zero
    pub const BUILD_FAILED: i32 = 4002;

    /// Expected binary is missing after a build
    pub const BINARY_NOT_FOUND: i32 = 4003;

    /// Per-fixture log could not be written
    pub const LOG_WRITE: i32 = 5001;

    /// Report document could not be written
    pub const REPORT_WRITE: i32 = 6001;

    /// JSON summary could not be serialised
    pub const SUMMARY_ENCODE: i32 = 6002;
}

/// Asset cache failures. Any of these aborts the whole run.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetError {
    CacheDir { path: PathBuf, reason: String },
    Download { id: String, url: String, reason: String },
    Storage { path: PathBuf, reason: String },
}

impl ErrorCode for AssetError {
    fn code(&self) -> i32 {
        match self {
            AssetError::CacheDir { .. } => PipelineErrorCodes::CACHE_DIR,
            AssetError::Download { .. } => PipelineErrorCodes::DOWNLOAD_FAILED,
            AssetError::Storage { .. } => PipelineErrorCodes::STORAGE_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            AssetError::CacheDir { path, reason } => {
                format!("Failed to create asset cache {}: {}", path.display(), reason)
            }
            AssetError::Download { id, url, reason } => {
                format!("Failed to download fixture {} from {}: {}", id, url, reason)
            }
            AssetError::Storage { path, reason } => {
                format!("Failed to store asset at {}: {}", path.display(), reason)
            }
        }
    }
}

/// Binary provisioning failures.
#[derive(Debug, Clone, PartialEq)]
pub enum ProvisionError {
    BuildSpawn { program: String, reason: String },
    BuildFailed { command: String, exit_code: Option<i32> },
    BinaryNotFound { path: PathBuf },
}

impl ErrorCode for ProvisionError {
    fn code(&self) -> i32 {
        match self {
            ProvisionError::BuildSpawn { .. } => PipelineErrorCodes::BUILD_SPAWN,
            ProvisionError::BuildFailed { .. } => PipelineErrorCodes::BUILD_FAILED,
            ProvisionError::BinaryNotFound { .. } => PipelineErrorCodes::BINARY_NOT_FOUND,
        }
    }

    fn message(&self) -> String {
        match self {
            ProvisionError::BuildSpawn { program, reason } => {
                format!("Failed to launch build tool {}: {}", program, reason)
            }
            ProvisionError::BuildFailed { command, exit_code } => match exit_code {
                Some(code) => format!("Build command `{}` exited with code {}", command, code),
                None => format!("Build command `{}` was terminated by a signal", command),
            },
            ProvisionError::BinaryNotFound { path } => {
                format!("Expected binary not found at {}", path.display())
            }
        }
    }
}

/// Fixture runner failures that are not a fixture simply failing to play.
#[derive(Debug, Clone, PartialEq)]
pub enum RunError {
    LogWrite { path: PathBuf, reason: String },
}

impl ErrorCode for RunError {
    fn code(&self) -> i32 {
        match self {
            RunError::LogWrite { .. } => PipelineErrorCodes::LOG_WRITE,
        }
    }

    fn message(&self) -> String {
        match self {
            RunError::LogWrite { path, reason } => {
                format!("Failed to write fixture log {}: {}", path.display(), reason)
            }
        }
    }
}

/// Report output failures.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportError {
    Write { path: PathBuf, reason: String },
    SummaryEncode { reason: String },
}

impl ErrorCode for ReportError {
    fn code(&self) -> i32 {
        match self {
            ReportError::Write { .. } => PipelineErrorCodes::REPORT_WRITE,
            ReportError::SummaryEncode { .. } => PipelineErrorCodes::SUMMARY_ENCODE,
        }
    }

    fn message(&self) -> String {
        match self {
            ReportError::Write { path, reason } => {
                format!("Failed to write report {}: {}", path.display(), reason)
            }
            ReportError::SummaryEncode { reason } => {
                format!("Failed to serialise result summary: {}", reason)
            }
        }
    }
}

macro_rules! impl_display {
    ($($name:ident),*) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(
                        f,
                        "{} (code {}): {}",
                        stringify!($name),
                        self.code(),
                        self.message()
                    )
                }
            }

            impl std::error::Error for $name {}
        )*
    };
}

impl_display!(AssetError, ProvisionError, RunError, ReportError);
