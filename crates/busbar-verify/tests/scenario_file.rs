//! The shipped YAML scenario and the built-in one must not drift apart.

use std::path::Path;

use busbar_verify::scenario::{Scenario, Step};

fn shipped() -> Scenario {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/busbar.yaml");
    Scenario::from_file(&path).unwrap()
}

#[test]
fn test_shipped_yaml_matches_builtin() {
    assert_eq!(shipped(), Scenario::busbar());
}

#[test]
fn test_shipped_yaml_screenshots() {
    let scenario = shipped();
    let paths: Vec<String> = scenario
        .screenshot_paths()
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        paths,
        [
            "jules-scratch/verification/01_initial_empty_state.png",
            "jules-scratch/verification/02_main_view_with_type.png",
            "jules-scratch/verification/03_polish_translation.png",
        ]
    );
}

#[test]
fn test_status_is_checked_after_measurement_save_click() {
    let scenario = shipped();
    let clicks: Vec<usize> = scenario
        .steps
        .iter()
        .enumerate()
        .filter_map(|(i, s)| match s {
            Step::Click { selector, .. } if selector == "#saveMeasurementBtn" => Some(i),
            _ => None,
        })
        .collect();
    let status = scenario
        .steps
        .iter()
        .position(|s| matches!(s, Step::Assert { selector, text: Some(t), .. } if selector == "#status" && t == "Zapisano."))
        .unwrap();

    assert_eq!(clicks.len(), 1);
    assert!(clicks[0] < status);
}
