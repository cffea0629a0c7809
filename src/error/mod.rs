// Error types for the headless playback harness
//
// Each pipeline stage owns a coded error enum. `HarnessError` wraps them so
// the orchestrator can unwind any fatal stage failure to the caller.

mod catalog;
mod pipeline;

pub use catalog::{CatalogError, CatalogErrorCodes};
pub use pipeline::{AssetError, PipelineErrorCodes, ProvisionError, ReportError, RunError};

use log::error;
use std::fmt;

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, so CI logs can be grepped by code.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Any fatal failure that aborts a harness run before a report is written.
#[derive(Debug, Clone, PartialEq)]
pub enum HarnessError {
    Catalog(CatalogError),
    Asset(AssetError),
    Provision(ProvisionError),
    Run(RunError),
    Report(ReportError),
}

impl HarnessError {
    /// Pipeline component the failure originated from.
    pub fn component(&self) -> &'static str {
        match self {
            HarnessError::Catalog(_) => "FixtureCatalog",
            HarnessError::Asset(_) => "AssetCache",
            HarnessError::Provision(_) => "BinaryProvisioner",
            HarnessError::Run(_) => "FixtureRunner",
            HarnessError::Report(_) => "ReportGenerator",
        }
    }
}

impl ErrorCode for HarnessError {
    fn code(&self) -> i32 {
        match self {
            HarnessError::Catalog(err) => err.code(),
            HarnessError::Asset(err) => err.code(),
            HarnessError::Provision(err) => err.code(),
            HarnessError::Run(err) => err.code(),
            HarnessError::Report(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        match self {
            HarnessError::Catalog(err) => err.message(),
            HarnessError::Asset(err) => err.message(),
            HarnessError::Provision(err) => err.message(),
            HarnessError::Run(err) => err.message(),
            HarnessError::Report(err) => err.message(),
        }
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::Catalog(err) => fmt::Display::fmt(err, f),
            HarnessError::Asset(err) => fmt::Display::fmt(err, f),
            HarnessError::Provision(err) => fmt::Display::fmt(err, f),
            HarnessError::Run(err) => fmt::Display::fmt(err, f),
            HarnessError::Report(err) => fmt::Display::fmt(err, f),
        }
    }
}

// Transparent wrapper: Display already shows the stage error, so the source
// chain continues from the stage error's own source.
impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use std::error::Error;

        match self {
            HarnessError::Catalog(err) => err.source(),
            HarnessError::Asset(err) => err.source(),
            HarnessError::Provision(err) => err.source(),
            HarnessError::Run(err) => err.source(),
            HarnessError::Report(err) => err.source(),
        }
    }
}

impl From<CatalogError> for HarnessError {
    fn from(err: CatalogError) -> Self {
        HarnessError::Catalog(err)
    }
}

impl From<AssetError> for HarnessError {
    fn from(err: AssetError) -> Self {
        HarnessError::Asset(err)
    }
}

impl From<ProvisionError> for HarnessError {
    fn from(err: ProvisionError) -> Self {
        HarnessError::Provision(err)
    }
}

impl From<RunError> for HarnessError {
    fn from(err: RunError) -> Self {
        HarnessError::Run(err)
    }
}

impl From<ReportError> for HarnessError {
    fn from(err: ReportError) -> Self {
        HarnessError::Report(err)
    }
}

/// Log a fatal harness error with structured context
///
/// Fields mirror the per-stage loggers: error_code, component, message.
pub fn log_harness_error(err: &HarnessError, context: &str) {
    error!(
        "Harness error in {}: code={}, component={}, message={}",
        context,
        err.code(),
        err.component(),
        err.message()
    );
}
