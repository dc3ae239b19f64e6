//! Error types for verification runs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Playwright not found. Install with: npm install @playwright/test && npx playwright install")]
    PlaywrightNotFound,

    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation failed: target document not found: {}", .0.display())]
    TargetNotFound(PathBuf),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Assertion failed at step '{step}': expected {expectation} {expected}, got {}", .actual.as_deref().unwrap_or("<unavailable>"))]
    AssertionFailed {
        step: String,
        expectation: String,
        expected: String,
        actual: Option<String>,
    },

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VerifyError {
    /// Process exit code for this failure: 1 when the page misbehaved, 2 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            VerifyError::AssertionFailed { .. } | VerifyError::StepFailed { .. } => 1,
            _ => 2,
        }
    }
}

pub type VerifyResult<T> = Result<T, VerifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_message_carries_expected_and_actual() {
        let err = VerifyError::AssertionFailed {
            step: "assert:#modalTitle".to_string(),
            expectation: "text".to_string(),
            expected: "\"New Busbar Type\"".to_string(),
            actual: Some("\"Edit Busbar Type\"".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("#modalTitle"));
        assert!(msg.contains("\"New Busbar Type\""));
        assert!(msg.contains("\"Edit Busbar Type\""));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_missing_actual_is_marked() {
        let err = VerifyError::AssertionFailed {
            step: "assert:#status".to_string(),
            expectation: "text".to_string(),
            expected: "\"Zapisano.\"".to_string(),
            actual: None,
        };
        assert!(err.to_string().ends_with("<unavailable>"));
    }

    #[test]
    fn test_non_assertion_errors_exit_with_two() {
        assert_eq!(VerifyError::PlaywrightNotFound.exit_code(), 2);
        assert_eq!(
            VerifyError::Navigation {
                url: "file:///tmp/index.html".to_string(),
                reason: "net::ERR_FILE_NOT_FOUND".to_string(),
            }
            .exit_code(),
            2
        );
    }
}
