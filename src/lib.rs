// Headless Playback Harness
// Drives the player binary against a fixture matrix and reports pass/fail for CI

// Module declarations
pub mod assets;
pub mod catalog;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod provision;
pub mod report;
pub mod runner;

// Re-exports for convenience
pub use config::HarnessConfig;
pub use error::{ErrorCode, HarnessError};
pub use orchestrator::{Orchestrator, RunOutcome, RunSummary};

use tracing_subscriber::EnvFilter;

/// Environment variable controlling the harness's own log output.
///
/// Kept separate from the verbosity variable forwarded to the binary under
/// test so the two can be tuned independently.
pub const LOG_ENV_VAR: &str = "HEADLESS_PLAYBACK_LOG";

/// Install the stderr log subscriber. Safe to call more than once.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
