//! Integration tests for `rustlift doctor`

#![cfg(unix)]

mod common;

use common::TestProject;

#[test]
fn test_doctor_passes_with_cross_toolchain() {
    let project = TestProject::with_fake_toolchain();

    let output = project.rustlift(&["doctor"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "doctor failed: {stderr}");
    assert!(stderr.contains("cargo (v1.83.0)"));
    assert!(stderr.contains("cross (v1.83.0)"));
    assert!(stderr.contains("zip (v3.0)"));
}

#[test]
fn test_doctor_json_lists_checks() {
    let project = TestProject::with_fake_toolchain();

    let output = project.rustlift(&["doctor", "--json"]);

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["toolchain"], "cross");
    let names: Vec<&str> = report["checks"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert!(names.contains(&"cargo"));
    assert!(names.contains(&"cross"));
    assert!(names.contains(&"zip"));
    assert!(names.iter().any(|n| n.starts_with("Container runtime")));
}

#[test]
fn test_doctor_quiet_prints_nothing_on_success() {
    let project = TestProject::with_fake_toolchain();

    let output = project.rustlift(&["doctor", "--quiet"]);

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(output.stderr.is_empty());
}

#[test]
fn test_doctor_reads_toolchain_from_descriptor() {
    let project = TestProject::with_fake_toolchain();
    project.create_file("serverless.yml", "custom:\n  rust:\n    cross: false\n");

    let output = project.rustlift(&["doctor", "--json"]);

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["toolchain"], "cargo");
    let cross = report["checks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "cross")
        .unwrap();
    assert_eq!(cross["required"], false);
}
