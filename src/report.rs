//! Markdown report rendering for a completed run.

use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::ReportError;
use crate::runner::{FixtureResult, NOT_AVAILABLE};

/// Aggregate view of every fixture result in a run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Report {
    pub suite: String,
    pub platform: String,
    pub generated_at: String,
    pub results: Vec<FixtureResult>,
}

impl Report {
    pub fn generate(
        results: Vec<FixtureResult>,
        suite: &str,
        platform: String,
        generated_at: String,
    ) -> Self {
        Self {
            suite: suite.to_string(),
            platform,
            generated_at,
            results,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &FixtureResult> {
        self.results.iter().filter(|result| !result.passed())
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(FixtureResult::passed)
    }

    /// Render the report as a markdown document.
    pub fn render(&self) -> String {
        let mut doc = String::new();
        doc.push_str("# Headless Playback Report\n\n");
        let _ = writeln!(doc, "- Suite: {}", self.suite);
        let _ = writeln!(doc, "- Platform: {}", self.platform);
        let _ = writeln!(doc, "- Generated: {}", self.generated_at);
        doc.push('\n');
        doc.push_str("| Fixture | Codec | Container | Frames | Result |\n");
        doc.push_str("| --- | --- | --- | --- | --- |\n");
        for result in &self.results {
            let _ = writeln!(
                doc,
                "| {} | {} | {} | {} | {} |",
                result.id,
                result.codec.as_deref().unwrap_or(NOT_AVAILABLE),
                result.container.as_deref().unwrap_or(NOT_AVAILABLE),
                result.frames,
                result.result
            );
        }
        doc.push_str("\n## Logs\n");
        for result in &self.results {
            let _ = writeln!(doc, "- {}: {}", result.id, result.log.display());
        }
        doc
    }

    /// Write the markdown document, creating the parent directory if needed.
    pub fn write(&self, path: &Path) -> Result<(), ReportError> {
        write_file(path, self.render())
    }

    /// Write results as pretty JSON for machine consumers.
    pub fn write_json_summary(&self, path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            ReportError::SummaryEncode {
                reason: err.to_string(),
            }
        })?;
        write_file(path, json)
    }
}

/// Human-readable OS/architecture descriptor of the host.
pub fn platform_descriptor() -> String {
    format!(
        "{}-{} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH,
        std::env::consts::FAMILY
    )
}

/// Local wall-clock time formatted for the report header.
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S %:z").to_string()
}

fn write_file(path: &Path, contents: String) -> Result<(), ReportError> {
    let write_error = |err: std::io::Error| ReportError::Write {
        path: path.to_path_buf(),
        reason: err.to_string(),
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(path, contents).map_err(write_error)
}
