use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use headless_playback::assets::HttpFetcher;
use headless_playback::catalog::Suite;
use headless_playback::error::log_harness_error;
use headless_playback::provision::BuildMode;
use headless_playback::{HarnessConfig, Orchestrator, RunOutcome};

fn main() -> ExitCode {
    headless_playback::init_logging();
    let cli = Cli::parse();
    match cli.execute() {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            eprintln!("headless_playback error: {err:#}");
            ExitCode::from(1)
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "headless_playback",
    about = "Run headless playback fixtures against the player binary."
)]
struct Cli {
    /// Path to fixture matrix JSON.
    #[arg(long)]
    fixtures: Option<PathBuf>,
    /// Which fixture suite to run.
    #[arg(long, value_enum)]
    suite: Option<SuiteArg>,
    /// Directory to write per-fixture logs.
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Path to write summary report.
    #[arg(long)]
    report: Option<PathBuf>,
    /// Skip building the player binary.
    #[arg(long, default_value_t = false)]
    skip_build: bool,
    /// Use the release build for running fixtures.
    #[arg(long, default_value_t = false)]
    release: bool,
    /// JSON file overlaying the harness defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory caching downloaded fixture media.
    #[arg(long)]
    downloads_dir: Option<PathBuf>,
    /// Also write the results as JSON to this path.
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum SuiteArg {
    Smoke,
    Full,
}

fn suite(arg: SuiteArg) -> Suite {
    match arg {
        SuiteArg::Smoke => Suite::Smoke,
        SuiteArg::Full => Suite::Full,
    }
}

impl Cli {
    fn execute(self) -> Result<RunOutcome> {
        let config = self.resolve_config();
        let orchestrator = Orchestrator::new(config, Box::new(HttpFetcher::new()));

        let summary = match orchestrator.run() {
            Ok(summary) => summary,
            Err(err) => {
                log_harness_error(&err, "headless playback run");
                return Err(anyhow::Error::new(err).context("headless playback run"));
            }
        };

        match summary.outcome {
            RunOutcome::Success => {
                println!(
                    "Headless playback completed successfully. Report: {}",
                    summary.report_path.display()
                );
            }
            RunOutcome::Failure => {
                println!("Headless playback failures detected:");
                for failure in summary.failures() {
                    println!(
                        "- {} (exit code {}): {}",
                        failure.id,
                        failure.exit_code,
                        failure.log.display()
                    );
                }
            }
        }
        Ok(summary.outcome)
    }

    fn resolve_config(&self) -> HarnessConfig {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load_from_file(path),
            None => HarnessConfig::default(),
        };

        if let Some(fixtures) = &self.fixtures {
            config.fixtures = fixtures.clone();
        }
        if let Some(arg) = self.suite {
            config.suite = suite(arg).as_str().to_string();
        }
        if let Some(log_dir) = &self.log_dir {
            config.log_dir = log_dir.clone();
        }
        if let Some(report) = &self.report {
            config.report = report.clone();
        }
        if let Some(downloads_dir) = &self.downloads_dir {
            config.downloads_dir = downloads_dir.clone();
        }
        if let Some(summary_json) = &self.summary_json {
            config.summary_json = Some(summary_json.clone());
        }
        if self.skip_build {
            config.skip_build = true;
        }
        if self.release {
            config.build_mode = BuildMode::Release;
        }
        config
    }
}
