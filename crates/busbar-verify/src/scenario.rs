//! Declarative verification scenarios
//!
//! A scenario is an ordered list of steps run against a single page. The
//! busbar tool scenario is built in; others can be loaded from YAML:
//!
//! ```yaml
//! name: busbar-smoke
//! steps:
//!   - action: navigate
//!   - action: assert
//!     selector: '#modalTitle'
//!     text: New Busbar Type
//!   - action: screenshot
//!     path: jules-scratch/verification/01_initial_empty_state.png
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{VerifyError, VerifyResult};

/// A complete verification scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Viewport size for the browser
    #[serde(default)]
    pub viewport: Viewport,

    /// How long an assertion may poll before it fails
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Steps to execute in order
    pub steps: Vec<Step>,
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_full_page() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280, height: 720 }
    }
}

/// A single step in a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Load a page. Without a url, the page under test is loaded.
    Navigate {
        #[serde(default)]
        url: Option<String>,
    },

    /// Click an element
    Click {
        selector: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Fill a text input
    Fill {
        selector: String,
        value: String,
    },

    /// Select an option from a dropdown by value
    Select {
        selector: String,
        value: String,
    },

    /// Wait for the element to reach the expected state
    Assert {
        selector: String,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        count: Option<usize>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Capture the page to a file, overwriting any previous capture
    Screenshot {
        path: PathBuf,
        #[serde(default = "default_full_page")]
        full_page: bool,
    },

    /// Log a progress message
    Log {
        message: String,
    },
}

impl Step {
    /// Short label used in logs, reports and failure messages.
    pub fn label(&self) -> String {
        match self {
            Step::Navigate { url: Some(url) } => format!("navigate:{}", url),
            Step::Navigate { url: None } => "navigate:target".to_string(),
            Step::Click { selector, .. } => format!("click:{}", selector),
            Step::Fill { selector, .. } => format!("fill:{}", selector),
            Step::Select { selector, .. } => format!("select:{}", selector),
            Step::Assert { selector, .. } => format!("assert:{}", selector),
            Step::Screenshot { path, .. } => format!("screenshot:{}", path.display()),
            Step::Log { message } => {
                let end = message
                    .char_indices()
                    .nth(30)
                    .map(|(i, _)| i)
                    .unwrap_or(message.len());
                format!("log:{}", &message[..end])
            }
        }
    }
}

impl Scenario {
    /// The busbar measurement tool walk-through: empty state, new type,
    /// Polish translation.
    pub fn busbar() -> Self {
        let screenshot = |path: &str| Step::Screenshot {
            path: PathBuf::from(path),
            full_page: true,
        };
        let log = |message: &str| Step::Log { message: message.to_string() };

        Self {
            name: "busbar-measurement".to_string(),
            description: "Empty state, new busbar type and Polish translation".to_string(),
            viewport: Viewport::default(),
            timeout_ms: default_timeout_ms(),
            steps: vec![
                Step::Navigate { url: None },
                log("Verifying initial empty state..."),
                assert_text("#modalTitle", "New Busbar Type"),
                screenshot("jules-scratch/verification/01_initial_empty_state.png"),
                log("Adding a new busbar type..."),
                fill("#m_name", "Test Type"),
                Step::Select {
                    selector: "#m_points".to_string(),
                    value: "10".to_string(),
                },
                fill("#m_tolMin", "-0.15"),
                fill("#m_tolMax", "0.15"),
                click("#saveTypeBtn"),
                Step::Assert {
                    selector: "#typeModal".to_string(),
                    visible: Some(false),
                    text: None,
                    count: None,
                    timeout_ms: None,
                },
                log("Verifying main view after adding a type..."),
                Step::Assert {
                    selector: "#measureTbody tr".to_string(),
                    visible: None,
                    text: None,
                    count: Some(10),
                    timeout_ms: None,
                },
                screenshot("jules-scratch/verification/02_main_view_with_type.png"),
                log("Verifying Polish translations..."),
                click(r#"button[data-lang-key="PL"]"#),
                assert_text("#saveMeasurementBtn", "Zapisz pomiar"),
                click("#saveMeasurementBtn"),
                // Headless runs have no file picker, so only the base message appears.
                assert_text("#status", "Zapisano."),
                screenshot("jules-scratch/verification/03_polish_translation.png"),
            ],
        }
    }

    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> VerifyResult<Self> {
        let scenario: Self = serde_yaml::from_str(yaml)
            .map_err(|e| VerifyError::ScenarioParse(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> VerifyResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Reject scenarios that cannot run meaningfully.
    pub fn validate(&self) -> VerifyResult<()> {
        if self.steps.is_empty() {
            return Err(VerifyError::ScenarioParse(format!(
                "scenario '{}' has no steps",
                self.name
            )));
        }

        for (i, step) in self.steps.iter().enumerate() {
            match step {
                Step::Assert { visible: None, text: None, count: None, selector, .. } => {
                    return Err(VerifyError::ScenarioParse(format!(
                        "step {} asserts nothing about '{}'",
                        i + 1,
                        selector
                    )));
                }
                Step::Screenshot { path, .. } if path.as_os_str().is_empty() => {
                    return Err(VerifyError::ScenarioParse(format!(
                        "step {} has an empty screenshot path",
                        i + 1
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Paths of all evidence artifacts this scenario writes.
    pub fn screenshot_paths(&self) -> Vec<&Path> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::Screenshot { path, .. } => Some(path.as_path()),
                _ => None,
            })
            .collect()
    }
}

fn fill(selector: &str, value: &str) -> Step {
    Step::Fill {
        selector: selector.to_string(),
        value: value.to_string(),
    }
}

fn click(selector: &str) -> Step {
    Step::Click {
        selector: selector.to_string(),
        timeout_ms: None,
    }
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
