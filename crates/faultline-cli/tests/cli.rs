use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// 20 kV feeder, one line, one grounded generator; a fault of each kind at B2.
fn write_case(dir: &Path) -> PathBuf {
    let case = json!({
        "buses": [
            { "id": 1, "name": "B1", "nominal_kv": 20.0 },
            { "id": 2, "name": "B2", "nominal_kv": 20.0 }
        ],
        "lines": [
            { "id": 1, "name": "L1", "bus1": 1, "bus2": 2, "r": 0.4, "x": 1.6,
              "short_circuit": { "coeff_ro": 3.0, "coeff_xo": 3.0 } }
        ],
        "generators": [
            { "id": 1, "name": "G1", "bus": 1,
              "short_circuit": { "transient_r": 0.2, "transient_x": 4.0,
                                 "sub_transient_r": 0.2, "sub_transient_x": 3.0,
                                 "grounded": true } }
        ],
        "faults": [
            { "id": "F3", "fault_type": "THREE_PHASE_GROUND", "bus": 2 },
            { "id": "F1", "fault_type": "MONOPHASE", "bus": 2 }
        ]
    });
    let path = dir.join("case.json");
    fs::write(&path, serde_json::to_string_pretty(&case).unwrap()).unwrap();
    path
}

#[test]
fn faultline_prints_table() {
    let dir = tempdir().unwrap();
    let case = write_case(dir.path());
    Command::cargo_bin("faultline")
        .unwrap()
        .arg(&case)
        .args(["--norm", "iec"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FAULT"))
        .stdout(predicate::str::contains("MONOPHASE"))
        .stdout(predicate::str::contains("F3"));
}

#[test]
fn faultline_json_output_parses() {
    let dir = tempdir().unwrap();
    let case = write_case(dir.path());
    let output = Command::cargo_bin("faultline")
        .unwrap()
        .arg(&case)
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let results: Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = results.as_array().expect("list of results");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["fault"], "F3");
    assert_eq!(results[1]["status"], "OK");
    assert!(results[1]["ik_ka"].as_f64().unwrap() > 0.0);
}

#[test]
fn faultline_systematic_reads_toml_config() {
    let dir = tempdir().unwrap();
    let case = write_case(dir.path());
    let config = dir.path().join("run.toml");
    fs::write(&config, "norm = \"IEC\"\nvoltage_update = false\n").unwrap();

    let output = Command::cargo_bin("faultline")
        .unwrap()
        .arg(&case)
        .args(["--config", config.to_str().unwrap(), "--systematic", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let results: Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = results
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["fault"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["SC_B1", "SC_B2"]);
    assert!(results[0]["voltage_deltas"].as_array().unwrap().is_empty());
}

#[test]
fn faultline_reports_missing_case() {
    Command::cargo_bin("faultline")
        .unwrap()
        .arg("does-not-exist.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.json"));
}

#[test]
fn faultline_rejects_unknown_bus() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("case.json");
    let case = json!({
        "buses": [ { "id": 1, "name": "B1", "nominal_kv": 20.0 } ],
        "faults": [ { "id": "BAD", "fault_type": "BIPHASE", "bus": 7 } ]
    });
    fs::write(&path, case.to_string()).unwrap();

    Command::cargo_bin("faultline")
        .unwrap()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("BAD"));
}
