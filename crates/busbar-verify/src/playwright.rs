//! Playwright browser automation
//!
//! A scenario is compiled into one Node script that owns a single browser
//! and page for the whole run. The script reports progress as JSON lines on
//! stdout, which are decoded here into step records and a final outcome.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, error};

use crate::error::{VerifyError, VerifyResult};
use crate::scenario::{Scenario, Step};
use crate::target::TargetDocument;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    /// Node executable used to run the generated script
    pub node_binary: PathBuf,
    /// Upper bound on the whole driver run, launch to browser close
    pub run_timeout: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            node_binary: PathBuf::from("node"),
            run_timeout: Duration::from_secs(120),
        }
    }
}

/// A step the driver reported as passed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub index: usize,
    pub name: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Browser or page could not be created
    Launch,
    /// The page could not be loaded
    Navigation,
    /// An expectation was not met before its timeout
    Assertion,
    /// A click, fill, select or screenshot could not be performed
    Action,
    /// Anything else thrown inside the script
    Driver,
}

/// Final verdict written by the driver script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub success: bool,
    #[serde(default)]
    pub kind: Option<FailureKind>,
    #[serde(default)]
    pub step: Option<String>,
    #[serde(default)]
    pub expectation: Option<String>,
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default)]
    pub actual: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RunOutcome {
    /// Convert a failed outcome into the matching error. `url` names the
    /// page for navigation failures.
    pub fn into_error(self, url: &str) -> VerifyError {
        let step = self.step.unwrap_or_else(|| "<unknown>".to_string());
        let message = self.message.unwrap_or_else(|| "no message".to_string());

        match self.kind.unwrap_or(FailureKind::Driver) {
            FailureKind::Launch => VerifyError::Launch(message),
            FailureKind::Navigation => VerifyError::Navigation {
                url: url.to_string(),
                reason: message,
            },
            FailureKind::Assertion => VerifyError::AssertionFailed {
                step,
                expectation: self.expectation.unwrap_or_else(|| "state".to_string()),
                expected: self.expected.unwrap_or_default(),
                actual: self.actual,
            },
            FailureKind::Action => VerifyError::StepFailed { step, reason: message },
            FailureKind::Driver => VerifyError::Driver(format!("{}: {}", step, message)),
        }
    }
}

/// One line of driver output
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DriverEvent {
    Step(StepRecord),
    Log { message: String },
    Result(RunOutcome),
}

/// Everything the driver reported for one run
#[derive(Debug, Clone)]
pub struct DriverRun {
    pub steps: Vec<StepRecord>,
    pub outcome: RunOutcome,
}

/// Resolves `@playwright/test` from the working directory first, then from
/// `NODE_PATH` and the global module folders.
const PLAYWRIGHT_LOADER: &str = r#"function loadPlaywright() {
  const { createRequire } = require('module');
  try {
    return createRequire(process.cwd() + '/')('@playwright/test');
  } catch (_) {
    return require('@playwright/test');
  }
}"#;

/// Playwright browser handle
pub struct PlaywrightHandle {
    config: PlaywrightConfig,
}

impl PlaywrightHandle {
    /// Create a new Playwright handle, failing early if Playwright is missing
    pub fn new(config: PlaywrightConfig, working_dir: &Path) -> VerifyResult<Self> {
        Self::check_playwright_installed(&config, working_dir)?;
        Ok(Self { config })
    }

    /// Handle for script generation only; nothing is checked or launched.
    pub fn offline(config: PlaywrightConfig) -> Self {
        Self { config }
    }

    /// Check if Playwright resolves the same way the driver script loads it
    fn check_playwright_installed(config: &PlaywrightConfig, working_dir: &Path) -> VerifyResult<()> {
        let probe = format!("{}\nloadPlaywright();", PLAYWRIGHT_LOADER);
        let output = Command::new(&config.node_binary)
            .args(["-e", &probe])
            .current_dir(working_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(VerifyError::PlaywrightNotFound),
        }
    }

    /// Build the driver script for a whole scenario
    pub fn build_script(&self, scenario: &Scenario, target: &TargetDocument) -> String {
        let mut script = String::new();

        // Header
        script.push_str(&format!(r#"
{loader}
const {{ {browser}, expect }} = loadPlaywright();

const targetUrl = {target};

function emit(event) {{
  process.stdout.write(JSON.stringify(event) + '\n');
}}

class StepFailure extends Error {{
  constructor(kind, step, details) {{
    super(details.message);
    this.kind = kind;
    this.step = step;
    this.details = details;
  }}
}}

async function runStep(index, name, kind, body) {{
  const started = Date.now();
  try {{
    await body();
  }} catch (error) {{
    if (error instanceof StepFailure) throw error;
    throw new StepFailure(kind, name, {{ message: error.message }});
  }}
  emit({{ event: 'step', index, name, duration_ms: Date.now() - started }});
}}

async function expectOr(name, expectation, expected, readActual, check) {{
  try {{
    await check();
  }} catch (error) {{
    let actual = null;
    try {{
      const value = await readActual();
      actual = value === null || value === undefined ? null : JSON.stringify(value);
    }} catch (_) {{}}
    throw new StepFailure('assertion', name, {{
      expectation,
      expected: JSON.stringify(expected),
      actual,
      message: error.message,
    }});
  }}
}}

(async () => {{
  let browser;
  try {{
    browser = await {browser}.launch({{ headless: {headless} }});
  }} catch (error) {{
    emit({{ event: 'result', success: false, kind: 'launch', message: error.message }});
    process.exitCode = 1;
    return;
  }}

  try {{
    let page;
    try {{
      const context = await browser.newContext({{
        viewport: {{ width: {width}, height: {height} }}
      }});
      page = await context.newPage();
    }} catch (error) {{
      throw new StepFailure('launch', 'open page', {{ message: error.message }});
    }}
"#,
            loader = PLAYWRIGHT_LOADER,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            target = js_str(target.uri().as_str()),
            width = scenario.viewport.width,
            height = scenario.viewport.height,
        ));

        for (i, step) in scenario.steps.iter().enumerate() {
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step.label()));
            script.push_str(&self.step_to_js(step, i, scenario.timeout_ms));
            script.push('\n');
        }

        // Footer
        script.push_str(r#"
    emit({ event: 'result', success: true });
  } catch (error) {
    if (error instanceof StepFailure) {
      emit({ event: 'result', success: false, kind: error.kind, step: error.step, ...error.details });
    } else {
      emit({ event: 'result', success: false, kind: 'driver', message: error.message });
    }
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#);

        script
    }

    /// Convert a step to JavaScript code
    fn step_to_js(&self, step: &Step, index: usize, default_timeout_ms: u64) -> String {
        let name = js_str(&step.label());
        let (kind, body) = match step {
            Step::Navigate { url } => {
                let url = url.as_deref().map(js_str).unwrap_or_else(|| "targetUrl".to_string());
                ("navigation", format!("await page.goto({});", url))
            }
            Step::Click { selector, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(default_timeout_ms);
                ("action", format!(
                    "await page.locator({}).click({{ timeout: {} }});",
                    js_str(selector), timeout
                ))
            }
            Step::Fill { selector, value } => {
                ("action", format!(
                    "await page.locator({}).fill({}, {{ timeout: {} }});",
                    js_str(selector), js_str(value), default_timeout_ms
                ))
            }
            Step::Select { selector, value } => {
                ("action", format!(
                    "await page.locator({}).selectOption({}, {{ timeout: {} }});",
                    js_str(selector), js_str(value), default_timeout_ms
                ))
            }
            Step::Assert { selector, visible, text, count, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(default_timeout_ms);
                let mut lines = vec![format!("const loc = page.locator({});", js_str(selector))];

                if let Some(vis) = visible {
                    let matcher = if *vis { "toBeVisible" } else { "not.toBeVisible" };
                    lines.push(format!(
                        "await expectOr({name}, 'visible', {vis}, () => loc.isVisible(), () => expect(loc).{matcher}({{ timeout: {timeout} }}));"
                    ));
                }

                if let Some(t) = text {
                    let t = js_str(t);
                    lines.push(format!(
                        "await expectOr({name}, 'text', {t}, () => loc.textContent({{ timeout: 1000 }}), () => expect(loc).toHaveText({t}, {{ timeout: {timeout} }}));"
                    ));
                }

                if let Some(c) = count {
                    lines.push(format!(
                        "await expectOr({name}, 'count', {c}, () => loc.count(), () => expect(loc).toHaveCount({c}, {{ timeout: {timeout} }}));"
                    ));
                }

                ("assertion", lines.join("\n      "))
            }
            Step::Screenshot { path, full_page } => {
                ("action", format!(
                    "await page.screenshot({{ path: {}, fullPage: {} }});",
                    js_str(&path.to_string_lossy()), full_page
                ))
            }
            Step::Log { message } => {
                ("driver", format!("emit({{ event: 'log', message: {} }});", js_str(message)))
            }
        };

        format!(
            "    await runStep({index}, {name}, '{kind}', async () => {{\n      {body}\n    }});"
        )
    }

    /// Execute a driver script from `working_dir` and collect its report.
    ///
    /// The node process is killed if the run exceeds its deadline or the
    /// future is dropped.
    pub async fn run_script(&self, script: &str, working_dir: &Path) -> VerifyResult<DriverRun> {
        // Write script to temp file
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("verify.js");
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let mut child = TokioCommand::new(&self.config.node_binary)
            .arg(&script_path)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VerifyError::Launch(format!(
                "failed to spawn {}: {}",
                self.config.node_binary.display(),
                e
            )))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| VerifyError::Driver("driver stdout not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| VerifyError::Driver("driver stderr not captured".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let start = Instant::now();
        let run = async {
            let events = read_events(BufReader::new(stdout)).await?;
            let status = child.wait().await?;
            Ok::<_, VerifyError>((events, status))
        };

        let (events, status) = match tokio::time::timeout(self.config.run_timeout, run).await {
            Ok(result) => result?,
            Err(_) => {
                error!("Driver exceeded {:?}; killing it", self.config.run_timeout);
                return Err(VerifyError::Timeout(format!(
                    "driver run to finish within {:?}",
                    self.config.run_timeout
                )));
            }
        };

        let stderr = stderr_task.await.unwrap_or_default();
        if !stderr.trim().is_empty() {
            debug!("Driver stderr:\n{}", stderr.trim_end());
        }
        debug!("Driver exited with {} after {} ms", status, start.elapsed().as_millis());

        match events.outcome {
            Some(outcome) => Ok(DriverRun { steps: events.steps, outcome }),
            None => Err(VerifyError::Driver(format!(
                "driver exited with {} without reporting a result\nstderr: {}",
                status,
                stderr.trim_end()
            ))),
        }
    }
}

/// Events collected from a driver's output stream
#[derive(Debug, Default)]
pub struct EventLog {
    pub steps: Vec<StepRecord>,
    pub outcome: Option<RunOutcome>,
}

/// Decode driver output line by line until the stream closes.
///
/// Lines that are not driver events are logged and skipped.
pub async fn read_events<R: AsyncBufRead + Unpin>(reader: R) -> VerifyResult<EventLog> {
    let mut log = EventLog::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<DriverEvent>(line) {
            Ok(DriverEvent::Step(record)) => {
                info!("✓ {} ({} ms)", record.name, record.duration_ms);
                log.steps.push(record);
            }
            Ok(DriverEvent::Log { message }) => info!("{}", message),
            Ok(DriverEvent::Result(outcome)) => {
                if log.outcome.is_some() {
                    return Err(VerifyError::Driver("driver reported more than one result".to_string()));
                }
                log.outcome = Some(outcome);
            }
            Err(_) => debug!("driver: {}", line),
        }
    }

    Ok(log)
}

/// Quote a string as a JavaScript string literal.
fn js_str(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}
