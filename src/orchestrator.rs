//! Run sequencing as an explicit state machine.
//!
//! ```text
//! Init -> LoadFixtures -> SelectSuite -> ProvisionBinary
//!      -> RunFixtures(EnsureAsset -> Execute -> AppendResult)*
//!      -> GenerateReport -> DecideExit -> Success | Failure
//! ```
//!
//! Each stage owns the data produced so far, so a transition can only
//! happen once its inputs exist. Any stage error aborts the run before a
//! report is written; a failing fixture only changes the final outcome.

use std::path::PathBuf;

use crate::assets::{AssetCache, AssetFetcher};
use crate::catalog::{self, FixtureCatalog, FixtureDefinition};
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::provision::BinaryProvisioner;
use crate::report::{self, Report};
use crate::runner::{EnvOverlay, FixtureResult, FixtureRunner};

/// Terminal state of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failure,
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Success => 0,
            RunOutcome::Failure => 1,
        }
    }
}

/// Everything the caller needs after a run reached `DecideExit`.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub report: Report,
    pub report_path: PathBuf,
}

impl RunSummary {
    pub fn failures(&self) -> impl Iterator<Item = &FixtureResult> {
        self.report.failures()
    }
}

enum Stage {
    Init,
    LoadFixtures,
    SelectSuite { catalog: FixtureCatalog },
    ProvisionBinary { fixtures: Vec<FixtureDefinition> },
    RunFixtures(FixtureLoop),
    GenerateReport { results: Vec<FixtureResult> },
    DecideExit { report: Report },
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::LoadFixtures => "load_fixtures",
            Stage::SelectSuite { .. } => "select_suite",
            Stage::ProvisionBinary { .. } => "provision_binary",
            Stage::RunFixtures(state) => match state.step {
                LoopStep::EnsureAsset => "run_fixtures/ensure_asset",
                LoopStep::Execute { .. } => "run_fixtures/execute",
                LoopStep::AppendResult { .. } => "run_fixtures/append_result",
            },
            Stage::GenerateReport { .. } => "generate_report",
            Stage::DecideExit { .. } => "decide_exit",
        }
    }
}

struct FixtureLoop {
    runner: FixtureRunner,
    fixtures: Vec<FixtureDefinition>,
    cursor: usize,
    results: Vec<FixtureResult>,
    step: LoopStep,
}

enum LoopStep {
    EnsureAsset,
    Execute { asset: PathBuf },
    AppendResult { result: FixtureResult },
}

enum Transition {
    Next(Stage),
    Finished(RunSummary),
}

/// Sequences catalog, provisioning, fixture runs and reporting.
pub struct Orchestrator {
    config: HarnessConfig,
    cache: AssetCache,
    provisioner: BinaryProvisioner,
    env: EnvOverlay,
}

impl Orchestrator {
    pub fn new(config: HarnessConfig, fetcher: Box<dyn AssetFetcher>) -> Self {
        let cache = AssetCache::new(config.downloads_dir.clone(), fetcher);
        let provisioner = BinaryProvisioner::new(config.build.clone());
        let env = EnvOverlay::capture(
            &config.child_env.verbosity_var,
            &config.child_env.verbosity_default,
        );
        Self {
            config,
            cache,
            provisioner,
            env,
        }
    }

    /// Replace the environment snapshot handed to the binary under test.
    pub fn with_env(mut self, env: EnvOverlay) -> Self {
        self.env = env;
        self
    }

    /// Drive the state machine to a terminal outcome.
    pub fn run(&self) -> Result<RunSummary, HarnessError> {
        let mut stage = Stage::Init;
        loop {
            log::debug!("[Orchestrator] Entering {}", stage.name());
            match self.step(stage)? {
                Transition::Next(next) => stage = next,
                Transition::Finished(summary) => {
                    log::info!(
                        "[Orchestrator] Run finished: {:?} ({} fixtures)",
                        summary.outcome,
                        summary.report.results.len()
                    );
                    return Ok(summary);
                }
            }
        }
    }

    fn step(&self, stage: Stage) -> Result<Transition, HarnessError> {
        let next = match stage {
            Stage::Init => Stage::LoadFixtures,
            Stage::LoadFixtures => Stage::SelectSuite {
                catalog: FixtureCatalog::load(&self.config.fixtures)?,
            },
            Stage::SelectSuite { catalog } => {
                let fixtures = catalog::filter(catalog.fixtures(), &self.config.suite)?;
                log::info!(
                    "[Orchestrator] Selected {} of {} fixtures for suite '{}'",
                    fixtures.len(),
                    catalog.len(),
                    self.config.suite
                );
                Stage::ProvisionBinary { fixtures }
            }
            Stage::ProvisionBinary { fixtures } => {
                let binary = if self.config.skip_build {
                    let binary = self.provisioner.locate(self.config.build_mode);
                    log::info!("[Orchestrator] Skipping build, using {}", binary.display());
                    binary
                } else {
                    self.provisioner.provision(self.config.build_mode)?
                };
                let runner = FixtureRunner::new(binary, &self.config.log_dir, self.env.clone());
                Stage::RunFixtures(FixtureLoop {
                    runner,
                    results: Vec::with_capacity(fixtures.len()),
                    fixtures,
                    cursor: 0,
                    step: LoopStep::EnsureAsset,
                })
            }
            Stage::RunFixtures(state) => self.step_fixture(state)?,
            Stage::GenerateReport { results } => {
                let report = Report::generate(
                    results,
                    &self.config.suite,
                    report::platform_descriptor(),
                    report::timestamp_now(),
                );
                report.write(&self.config.report)?;
                if let Some(path) = &self.config.summary_json {
                    report.write_json_summary(path)?;
                }
                Stage::DecideExit { report }
            }
            Stage::DecideExit { report } => {
                let outcome = if report.all_passed() {
                    RunOutcome::Success
                } else {
                    RunOutcome::Failure
                };
                return Ok(Transition::Finished(RunSummary {
                    outcome,
                    report,
                    report_path: self.config.report.clone(),
                }));
            }
        };
        Ok(Transition::Next(next))
    }

    fn step_fixture(&self, mut state: FixtureLoop) -> Result<Stage, HarnessError> {
        // `fixtures` is never empty here: selection rejects empty suites.
        let fixture = &state.fixtures[state.cursor];
        state.step = match state.step {
            LoopStep::EnsureAsset => LoopStep::Execute {
                asset: self.cache.ensure(fixture)?,
            },
            LoopStep::Execute { asset } => LoopStep::AppendResult {
                result: state.runner.run(fixture, &asset)?,
            },
            LoopStep::AppendResult { result } => {
                state.results.push(result);
                state.cursor += 1;
                if state.cursor == state.fixtures.len() {
                    return Ok(Stage::GenerateReport {
                        results: state.results,
                    });
                }
                LoopStep::EnsureAsset
            }
        };
        Ok(Stage::RunFixtures(state))
    }
}
