//! Main verification runner that ties target resolution, the Playwright
//! driver and result reporting together

use std::path::{Path, PathBuf};
use std::time::Instant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, debug};

use crate::error::VerifyResult;
use crate::playwright::{PlaywrightConfig, PlaywrightHandle, RunOutcome, StepRecord};
use crate::scenario::Scenario;
use crate::target::TargetDocument;

/// Result of one verification run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub scenario: String,
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    pub steps: Vec<StepRecord>,
    pub failure: Option<RunOutcome>,
    pub screenshots: Vec<PathBuf>,
}

/// Configuration for the runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Page under test, relative to `working_dir` unless absolute
    pub target: PathBuf,
    /// Directory the driver runs in; screenshot paths are relative to it.
    /// Defaults to the process working directory.
    pub working_dir: Option<PathBuf>,
    pub playwright: PlaywrightConfig,
    /// Where to write the JSON run report, if anywhere
    pub report_path: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            target: PathBuf::from("index.html"),
            working_dir: None,
            playwright: PlaywrightConfig::default(),
            report_path: None,
        }
    }
}

/// Drives a scenario against the page under test
pub struct VerificationRunner {
    config: RunnerConfig,
}

impl VerificationRunner {
    /// Create a new runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create a runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        Self { config }
    }

    fn working_dir(&self) -> VerifyResult<PathBuf> {
        match &self.config.working_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Resolve the page under test
    pub fn resolve_target(&self) -> VerifyResult<TargetDocument> {
        TargetDocument::resolve_from(&self.working_dir()?, &self.config.target)
    }

    /// Generate the driver script without running it
    pub fn render_script(&self, scenario: &Scenario) -> VerifyResult<String> {
        scenario.validate()?;
        let target = self.resolve_target()?;
        let handle = PlaywrightHandle::offline(self.config.playwright.clone());
        Ok(handle.build_script(scenario, &target))
    }

    /// Run a scenario to completion.
    ///
    /// Returns the report when every step passed, otherwise the error for
    /// the first unmet step. The report is written in both cases when a
    /// report path is configured.
    pub async fn run(&self, scenario: &Scenario) -> VerifyResult<RunReport> {
        let started_at = Utc::now();
        let start = Instant::now();

        scenario.validate()?;
        let working_dir = self.working_dir()?;
        let target = TargetDocument::resolve_from(&working_dir, &self.config.target)?;
        info!("Verifying {} against {}", scenario.name, target.uri());

        prepare_evidence_dirs(&working_dir, scenario)?;

        let playwright = PlaywrightHandle::new(self.config.playwright.clone(), &working_dir)?;
        let script = playwright.build_script(scenario, &target);
        let run = playwright.run_script(&script, &working_dir).await?;

        let success = run.outcome.success;
        let report = RunReport {
            scenario: scenario.name.clone(),
            target: target.uri().to_string(),
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            success,
            steps: run.steps,
            failure: if success { None } else { Some(run.outcome.clone()) },
            screenshots: scenario
                .screenshot_paths()
                .into_iter()
                .map(Path::to_path_buf)
                .collect(),
        };

        if let Some(path) = &self.config.report_path {
            write_report(&working_dir.join(path), &report)?;
        }

        if success {
            info!(
                "All {} steps passed ({} ms)",
                report.steps.len(),
                report.duration_ms
            );
            Ok(report)
        } else {
            Err(run.outcome.into_error(target.uri().as_str()))
        }
    }
}

impl Default for VerificationRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Create parent directories for every screenshot the scenario writes.
fn prepare_evidence_dirs(working_dir: &Path, scenario: &Scenario) -> VerifyResult<()> {
    for path in scenario.screenshot_paths() {
        if let Some(parent) = working_dir.join(path).parent() {
            debug!("Ensuring screenshot directory {}", parent.display());
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write a run report as pretty JSON
pub fn write_report(path: &Path, report: &RunReport) -> VerifyResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;

    info!("Report written to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VerifyError;

    fn runner_in(dir: &Path) -> VerificationRunner {
        VerificationRunner::with_config(RunnerConfig {
            working_dir: Some(dir.to_path_buf()),
            ..Default::default()
        })
    }

    #[test]
    fn test_default_target_is_index_html() {
        let config = RunnerConfig::default();
        assert_eq!(config.target, PathBuf::from("index.html"));
        assert!(config.playwright.headless);
        assert!(config.report_path.is_none());
    }

    #[test]
    fn test_evidence_dirs_are_created() {
        let dir = tempfile::tempdir().unwrap();
        prepare_evidence_dirs(dir.path(), &Scenario::busbar()).unwrap();
        assert!(dir.path().join("jules-scratch/verification").is_dir());
    }

    #[test]
    fn test_render_script_needs_target() {
        let dir = tempfile::tempdir().unwrap();
        let err = runner_in(dir.path()).render_script(&Scenario::busbar()).unwrap_err();
        assert!(matches!(err, VerifyError::TargetNotFound(_)));
    }

    #[test]
    fn test_render_script_points_at_target() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let runner = runner_in(dir.path());
        let target = runner.resolve_target().unwrap();
        let script = runner.render_script(&Scenario::busbar()).unwrap();
        assert!(script.contains(target.uri().as_str()));
    }

    #[tokio::test]
    async fn test_run_fails_before_launch_when_target_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = runner_in(dir.path()).run(&Scenario::busbar()).await.unwrap_err();
        assert!(matches!(err, VerifyError::TargetNotFound(_)));
        assert!(!dir.path().join("jules-scratch").exists());
    }

    #[test]
    fn test_write_report_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/run.json");
        let report = RunReport {
            scenario: "busbar-measurement".to_string(),
            target: "file:///tmp/index.html".to_string(),
            started_at: Utc::now(),
            duration_ms: 42,
            success: true,
            steps: vec![StepRecord {
                index: 0,
                name: "navigate:target".to_string(),
                duration_ms: 10,
            }],
            failure: None,
            screenshots: vec![PathBuf::from("jules-scratch/verification/01_initial_empty_state.png")],
        };

        write_report(&path, &report).unwrap();
        let parsed: RunReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.scenario, report.scenario);
        assert_eq!(parsed.steps, report.steps);
    }
}
