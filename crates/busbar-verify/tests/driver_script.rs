//! Runs the generated driver script under Node against an in-memory
//! stand-in for `@playwright/test` (tests/fixtures/playwright-stub).
//!
//! Skipped when `node` is not on PATH.

use std::path::Path;
use std::process::{Command, Stdio};

use busbar_verify::scenario::Step;
use busbar_verify::{RunnerConfig, Scenario, VerificationRunner, VerifyError};

fn node_available() -> bool {
    let ok = Command::new("node")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    if !ok {
        eprintln!("skipping driver script test (node not found)");
    }
    ok
}

/// Scratch directory holding the fixture page and the stub module where the
/// driver's loader looks first.
fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    std::fs::copy(fixtures.join("index.html"), dir.path().join("index.html")).unwrap();

    let module_dir = dir.path().join("node_modules/@playwright/test");
    std::fs::create_dir_all(&module_dir).unwrap();
    std::fs::copy(
        fixtures.join("playwright-stub/index.js"),
        module_dir.join("index.js"),
    )
    .unwrap();
    dir
}

fn runner_in(dir: &Path) -> VerificationRunner {
    VerificationRunner::with_config(RunnerConfig {
        working_dir: Some(dir.to_path_buf()),
        report_path: Some("report.json".into()),
        ..Default::default()
    })
}

fn click(selector: &str) -> Step {
    Step::Click { selector: selector.to_string(), timeout_ms: None }
}

fn assert_text(selector: &str, text: &str) -> Step {
    Step::Assert {
        selector: selector.to_string(),
        visible: None,
        text: Some(text.to_string()),
        count: None,
        timeout_ms: None,
    }
}

#[test]
fn generated_script_parses() {
    if !node_available() {
        return;
    }
    let dir = workspace();
    let script = runner_in(dir.path()).render_script(&Scenario::busbar()).unwrap();
    let script_path = dir.path().join("verify.js");
    std::fs::write(&script_path, script).unwrap();

    let output = Command::new("node").arg("--check").arg(&script_path).output().unwrap();
    assert!(
        output.status.success(),
        "node --check failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[tokio::test]
async fn busbar_scenario_passes() {
    if !node_available() {
        return;
    }
    let dir = workspace();

    let report = runner_in(dir.path()).run(&Scenario::busbar()).await.unwrap();

    assert!(report.success);
    assert_eq!(report.steps.len(), Scenario::busbar().steps.len());
    assert!(report.steps.iter().enumerate().all(|(i, s)| s.index == i));
    for shot in &report.screenshots {
        assert!(dir.path().join(shot).is_file(), "missing {}", shot.display());
    }
    assert!(dir.path().join("report.json").is_file());
}

#[tokio::test]
async fn wrong_row_count_reports_expected_and_actual() {
    if !node_available() {
        return;
    }
    let dir = workspace();

    let mut scenario = Scenario::busbar();
    for step in &mut scenario.steps {
        if let Step::Assert { count: Some(n), .. } = step {
            *n = 9;
        }
    }

    let err = runner_in(dir.path()).run(&scenario).await.unwrap_err();
    assert_eq!(err.exit_code(), 1);
    match err {
        VerifyError::AssertionFailed { step, expectation, expected, actual } => {
            assert_eq!(step, "assert:#measureTbody tr");
            assert_eq!(expectation, "count");
            assert_eq!(expected, "9");
            assert_eq!(actual.as_deref(), Some("10"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(dir.path().join("jules-scratch/verification/01_initial_empty_state.png").is_file());
    assert!(!dir.path().join("jules-scratch/verification/02_main_view_with_type.png").exists());
}

#[tokio::test]
async fn repeated_save_keeps_status_text() {
    if !node_available() {
        return;
    }
    let dir = workspace();

    let mut scenario = Scenario::busbar();
    scenario.steps.push(click("#saveMeasurementBtn"));
    scenario.steps.push(assert_text("#status", "Zapisano."));

    let report = runner_in(dir.path()).run(&scenario).await.unwrap();

    let saves = report.steps.iter().filter(|s| s.name == "click:#saveMeasurementBtn").count();
    let checks = report.steps.iter().filter(|s| s.name == "assert:#status").count();
    assert_eq!(saves, 2);
    assert_eq!(checks, 2);
}

#[tokio::test]
async fn page_creation_failure_is_a_launch_error() {
    if !node_available() {
        return;
    }
    let dir = workspace();
    std::fs::write(dir.path().join("fail-new-context"), "").unwrap();

    let err = runner_in(dir.path()).run(&Scenario::busbar()).await.unwrap_err();
    assert!(matches!(err, VerifyError::Launch(ref msg) if msg.contains("newContext")), "{err}");
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn browser_launch_failure_is_a_launch_error() {
    if !node_available() {
        return;
    }
    let dir = workspace();
    std::fs::write(dir.path().join("fail-launch"), "").unwrap();

    let err = runner_in(dir.path()).run(&Scenario::busbar()).await.unwrap_err();
    assert!(matches!(err, VerifyError::Launch(ref msg) if msg.contains("launch")), "{err}");
}

#[tokio::test]
async fn unreachable_page_is_a_navigation_error() {
    if !node_available() {
        return;
    }
    let dir = workspace();
    let missing = url::Url::from_file_path(dir.path().join("gone.html")).unwrap();

    let mut scenario = Scenario::busbar();
    scenario.steps[0] = Step::Navigate { url: Some(missing.to_string()) };

    let err = runner_in(dir.path()).run(&scenario).await.unwrap_err();
    assert!(matches!(err, VerifyError::Navigation { ref reason, .. } if reason.contains("ERR_FILE_NOT_FOUND")), "{err}");
}
