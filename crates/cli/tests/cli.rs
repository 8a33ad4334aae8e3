use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const BUNDLED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../configs/mission.yaml");

#[test]
fn mission_prints_the_profile_table() {
    Command::cargo_bin("mission")
        .unwrap()
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Mission Profile ==="))
        .stdout(predicate::str::contains("climb1"))
        .stdout(predicate::str::contains("cruise2"));
}

#[test]
fn mission_writes_requested_artifacts() {
    let dir = tempdir().unwrap();
    let profile = dir.path().join("profile.csv");
    let json = dir.path().join("solution.json");
    Command::cargo_bin("mission")
        .unwrap()
        .args(["--config", BUNDLED, "--mission", "BASELINE"])
        .arg("--profile-csv")
        .arg(&profile)
        .arg("--json")
        .arg(&json)
        .assert()
        .success();

    let table = fs::read_to_string(&profile).unwrap();
    assert!(table.starts_with("slot,phase,altitude_ft,speed_kts"));
    assert_eq!(table.lines().count(), 10);
    assert!(fs::read_to_string(&json).unwrap().contains("\"W_total\""));
}

#[test]
fn unreachable_range_fails_with_infeasibility() {
    Command::cargo_bin("mission")
        .unwrap()
        .args(["--range", "50000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("infeasible"));
}

#[test]
fn unknown_mission_name_is_reported() {
    Command::cargo_bin("mission")
        .unwrap()
        .args(["--config", BUNDLED, "--mission", "concorde"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn sweep_writes_one_row_per_value() {
    let output = Command::cargo_bin("sweep")
        .unwrap()
        .args(["--start", "2500", "--end", "3000", "--count", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "ReqRng [miles],W_total,W_ftotal,status");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("2500,"));
}
