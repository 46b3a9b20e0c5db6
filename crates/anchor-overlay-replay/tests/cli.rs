use assert_cmd::Command;
use predicates::prelude::*;

fn replay() -> Command {
    Command::cargo_bin("anchor-overlay-replay").expect("binary builds")
}

#[test]
fn replays_the_sample_scenario_to_stdout() {
    replay()
        .arg("testdata/scenario.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"bound_markers\""));
}

#[test]
fn writes_the_report_to_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.json");

    replay()
        .arg("testdata/scenario.json")
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let raw = std::fs::read_to_string(&out).unwrap();
    let report: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(report["steps"].as_array().unwrap().len(), 4);
    // The marker was removed in the last step: nothing bound, the C and G
    // instances are back in the pool, and the prompt is searching again.
    assert!(report["bound_markers"].as_array().unwrap().is_empty());
    assert_eq!(report["idle_instances"], 2);
    assert!(!report["prompt"].as_str().unwrap().is_empty());

    // First tick bound the marker; the mid-scenario select swapped chords
    // without an error.
    assert_eq!(report["steps"][0]["summary"]["bound"], 1);
    assert!(report["steps"][1]["error"].is_null());
    assert_eq!(report["selected"], "G");
}

#[test]
fn fails_cleanly_on_a_missing_scenario() {
    replay()
        .arg("does-not-exist.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.json"));
}
