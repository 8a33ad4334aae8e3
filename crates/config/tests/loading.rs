use std::fs;

use sizing_config::{ConfigError, MissionConfig, load_mission, load_missions};
use tempfile::tempdir;

#[test]
fn yaml_mission_fills_missing_sections_with_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("short.yaml");
    fs::write(
        &path,
        "name: short\nprofile:\n  range_miles: 1200\nsegments:\n  cruise2: 5\n",
    )
    .unwrap();

    let mission = load_mission(&path).unwrap();
    assert_eq!(mission.name, "short");
    assert_eq!(mission.profile.range_miles, 1_200.0);
    assert_eq!(mission.profile.cruise_altitude_ft, 35_000.0);
    assert_eq!(mission.segments.cruise2, 5);
    assert_eq!(mission.segments.climb1, 3);
    assert_eq!(mission.aircraft, MissionConfig::default().aircraft);
}

#[test]
fn toml_mission_is_selected_by_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("heavy.toml");
    fs::write(
        &path,
        "name = \"heavy\"\n\n[aircraft]\npayload_weight_n = 450000.0\n",
    )
    .unwrap();

    let mission = load_mission(&path).unwrap();
    assert_eq!(mission.name, "heavy");
    assert_eq!(mission.aircraft.payload_weight_n, 450_000.0);
    assert_eq!(mission.cruise.speed_kts, 420.0);
}

#[test]
fn directories_load_in_name_order() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("b.yaml"), "name: second\n").unwrap();
    fs::write(dir.path().join("a.toml"), "name = \"first\"\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let missions = load_missions(dir.path()).unwrap();
    let names: Vec<_> = missions.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["first", "second"]);
}

#[test]
fn empty_directory_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        load_missions(dir.path()),
        Err(ConfigError::Empty(_))
    ));
}

#[test]
fn malformed_files_report_parse_errors() {
    let dir = tempdir().unwrap();
    let yaml = dir.path().join("bad.yaml");
    fs::write(&yaml, "segments: [1, 2").unwrap();
    assert!(matches!(load_mission(&yaml), Err(ConfigError::Parse(_))));

    let toml = dir.path().join("bad.toml");
    fs::write(&toml, "name = ").unwrap();
    assert!(matches!(load_mission(&toml), Err(ConfigError::Toml(_))));

    assert!(matches!(
        load_mission(dir.path().join("missing.yaml")),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn bundled_mission_matches_the_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../configs/mission.yaml");
    let mission = load_mission(path).unwrap();
    assert_eq!(mission, MissionConfig::default());
}
